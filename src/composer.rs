//! Turns an [`UltraCircuit`] into proving and verification keys and a witness trace.
//!
//! Trace layout for a circuit of size `n` with `k` public inputs, `g` gates, `m` lookup gates
//! and `t` table entries:
//!
//! - row 0 is all zero, so every to-be-shifted column vanishes there;
//! - public input `i` sits on row `1 + i`, in both `w_1` and `w_2`;
//! - gates follow on rows `1 + k ..`;
//! - tables fill the last `t` rows of the table columns, and the sorted list fills the last
//!   `m + t` rows of the sorted columns.
use crate::{
  Commitment, CommitmentKey, VerifierKey,
  circuit::{UltraCircuit, Variable},
  digest::{DigestComputer, HonkDigest, SimpleDigestible},
  errors::HonkError,
  flavor::{Entity, MIN_CIRCUIT_SIZE, NUM_PRECOMPUTED_ENTITIES, NUM_WIRES},
  math::Math,
  start_span,
  traits::{
    Engine,
    pcs::{Len, PCSEngineTrait},
  },
};
use core::marker::PhantomData;
use ff::{Field, PrimeField};
use itertools::Itertools;
use once_cell::sync::OnceCell;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, info_span};

/// Row of the first public input
pub const PUB_INPUTS_OFFSET: usize = 1;

/// Label used to sample the commitment key
const SETUP_LABEL: &[u8] = b"UltraHonk";

/// What the verifier needs: sizes, commitments to the precomputed columns, and the
/// commitment scheme's verifier key
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct VerificationKey<E: Engine> {
  pub(crate) circuit_size: usize,
  pub(crate) log_circuit_size: usize,
  pub(crate) num_public_inputs: usize,
  pub(crate) pub_inputs_offset: usize,
  pub(crate) commitments: Vec<Commitment<E>>,
  pub(crate) vk_pcs: VerifierKey<E>,
  #[serde(skip, default = "OnceCell::new")]
  digest: OnceCell<HonkDigest>,
}

impl<E: Engine> SimpleDigestible for VerificationKey<E> {}

impl<E: Engine> VerificationKey<E> {
  /// Returns the digest of the key, computed once
  pub fn digest(&self) -> Result<HonkDigest, HonkError> {
    self
      .digest
      .get_or_try_init(|| DigestComputer::new(self).digest())
      .cloned()
      .map_err(|_| HonkError::DigestError {
        reason: "Unable to compute digest for VerificationKey".to_string(),
      })
  }

  /// Number of rows of the trace
  pub fn circuit_size(&self) -> usize {
    self.circuit_size
  }

  /// Number of public inputs
  pub fn num_public_inputs(&self) -> usize {
    self.num_public_inputs
  }

  /// Commitment to a precomputed column
  pub fn commitment(&self, entity: Entity) -> Option<&Commitment<E>> {
    Entity::PRECOMPUTED
      .iter()
      .position(|e| *e == entity)
      .map(|i| &self.commitments[i])
  }
}

/// What the prover needs: sizes and the precomputed columns
#[derive(Clone, Debug)]
pub struct ProvingKey<E: Engine> {
  pub(crate) circuit_size: usize,
  pub(crate) log_circuit_size: usize,
  pub(crate) num_public_inputs: usize,
  pub(crate) pub_inputs_offset: usize,
  pub(crate) precomputed: Vec<Arc<Vec<E::Scalar>>>,
  pub(crate) vk_digest: HonkDigest,
}

impl<E: Engine> ProvingKey<E> {
  /// Number of rows of the trace
  pub fn circuit_size(&self) -> usize {
    self.circuit_size
  }

  /// Number of variables of every multilinear column
  pub fn log_circuit_size(&self) -> usize {
    self.log_circuit_size
  }

  /// Number of public inputs
  pub fn num_public_inputs(&self) -> usize {
    self.num_public_inputs
  }

  /// Row of the first public input
  pub fn pub_inputs_offset(&self) -> usize {
    self.pub_inputs_offset
  }

  /// A precomputed column
  pub fn polynomial(&self, entity: Entity) -> Option<&Arc<Vec<E::Scalar>>> {
    Entity::PRECOMPUTED
      .iter()
      .position(|e| *e == entity)
      .map(|i| &self.precomputed[i])
  }
}

/// The witness columns the prover starts from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UltraWitness<F: PrimeField> {
  pub(crate) wires: Vec<Vec<F>>,
  pub(crate) sorted: Vec<Vec<F>>,
  pub(crate) public_inputs: Vec<F>,
}

impl<F: PrimeField> UltraWitness<F> {
  /// Assembles a witness from four wire columns, four sorted lookup columns and the public
  /// inputs
  pub fn new(wires: Vec<Vec<F>>, sorted: Vec<Vec<F>>, public_inputs: Vec<F>) -> Self {
    Self {
      wires,
      sorted,
      public_inputs,
    }
  }

  /// The public input values
  pub fn public_inputs(&self) -> &[F] {
    &self.public_inputs
  }

  /// The wire columns `w_1..w_4`
  pub fn wires(&self) -> &[Vec<F>] {
    &self.wires
  }

  /// The sorted lookup columns
  pub fn sorted(&self) -> &[Vec<F>] {
    &self.sorted
  }

  pub(crate) fn check_shape(&self, circuit_size: usize, num_public_inputs: usize) -> Result<(), HonkError> {
    let bad_columns = self
      .wires
      .iter()
      .chain(self.sorted.iter())
      .any(|c| c.len() != circuit_size);
    if self.wires.len() != NUM_WIRES || self.sorted.len() != NUM_WIRES || bad_columns {
      return Err(HonkError::InvalidWitnessLength {
        reason: format!("expected {NUM_WIRES} wire and {NUM_WIRES} sorted columns of length {circuit_size}"),
      });
    }
    if self.public_inputs.len() != num_public_inputs {
      return Err(HonkError::InvalidWitnessLength {
        reason: format!(
          "expected {num_public_inputs} public inputs, found {}",
          self.public_inputs.len()
        ),
      });
    }
    Ok(())
  }
}

/// A trace cell: wire column and row
type Cell = (usize, usize);

/// Builds keys and witnesses for a fixed engine
pub struct UltraComposer<E: Engine> {
  _p: PhantomData<E>,
}

impl<E: Engine> UltraComposer<E> {
  /// Number of rows the circuit occupies once laid out
  pub fn circuit_size(circuit: &UltraCircuit<E::Scalar>) -> usize {
    let rows = PUB_INPUTS_OFFSET + circuit.num_public_inputs() + circuit.num_gates();
    let lookup_rows = circuit.num_lookups() + circuit.num_table_entries() + 1;
    rows.max(lookup_rows).max(MIN_CIRCUIT_SIZE).next_power_of_two()
  }

  /// Samples a commitment key for circuits of up to `n` rows
  pub fn commitment_key(n: usize) -> (CommitmentKey<E>, VerifierKey<E>) {
    E::PCS::setup(SETUP_LABEL, n)
  }

  /// Accepts an externally generated commitment key for circuits of up to `n` rows.
  ///
  /// # Errors
  /// Returns `HonkError::InvalidCommitmentKeyLength` if `ck` cannot commit to `n` coefficients.
  pub fn load_commitment_key(
    n: usize,
    ck: CommitmentKey<E>,
    vk_pcs: VerifierKey<E>,
  ) -> Result<(CommitmentKey<E>, VerifierKey<E>), HonkError> {
    if ck.length() < n {
      return Err(HonkError::InvalidCommitmentKeyLength);
    }
    info!(n = n, key_length = ck.length(), "loaded external commitment key");
    Ok((ck, vk_pcs))
  }

  /// For each trace cell, the copy class it belongs to
  fn wire_variables(circuit: &UltraCircuit<E::Scalar>, n: usize) -> Vec<Vec<Option<Variable>>> {
    let mut cells = vec![vec![None; n]; NUM_WIRES];
    let k = circuit.num_public_inputs();
    for (i, pi) in circuit.public_inputs.iter().enumerate() {
      cells[0][PUB_INPUTS_OFFSET + i] = Some(*pi);
      cells[1][PUB_INPUTS_OFFSET + i] = Some(*pi);
    }
    for (j, gate) in circuit.gates.iter().enumerate() {
      for (c, w) in gate.wires.iter().enumerate() {
        cells[c][PUB_INPUTS_OFFSET + k + j] = Some(*w);
      }
    }
    cells
  }

  fn permutation_polynomials(
    circuit: &UltraCircuit<E::Scalar>,
    n: usize,
  ) -> (Vec<Vec<E::Scalar>>, Vec<Vec<E::Scalar>>) {
    let id = |(c, r): Cell| E::Scalar::from((c * n + r) as u64);
    let ids = (0..NUM_WIRES)
      .map(|c| (0..n).map(|r| id((c, r))).collect::<Vec<_>>())
      .collect::<Vec<_>>();
    let mut sigmas = ids.clone();

    // public input cells lead their cycle, w_1 immediately followed by w_2
    let k = circuit.num_public_inputs();
    let pi_rows = PUB_INPUTS_OFFSET..PUB_INPUTS_OFFSET + k;
    let mut cycles: Vec<Vec<Cell>> = vec![Vec::new(); circuit.num_variables()];
    let cells = Self::wire_variables(circuit, n);
    for r in pi_rows.clone() {
      if let Some(var) = cells[0][r] {
        let cycle = &mut cycles[circuit.real_variable_index(var) as usize];
        cycle.extend([(0, r), (1, r)]);
      }
    }
    for (c, column) in cells.into_iter().enumerate() {
      for (r, var) in column.into_iter().enumerate() {
        if c < 2 && pi_rows.contains(&r) {
          continue;
        }
        if let Some(var) = var {
          cycles[circuit.real_variable_index(var) as usize].push((c, r));
        }
      }
    }
    for cycle in cycles.iter().filter(|c| c.len() > 1) {
      for (&(c, r), &next) in cycle.iter().circular_tuple_windows() {
        sigmas[c][r] = id(next);
      }
    }

    // the w_1 cell of a public input row points outside the trace; no cell points at the
    // w_2 cell, which the public input delta accounts for
    for r in pi_rows {
      sigmas[0][r] = -E::Scalar::from((r + 1) as u64);
    }
    (sigmas, ids)
  }

  /// Lays out the circuit and commits to its precomputed columns.
  ///
  /// # Errors
  /// Returns `HonkError::InvalidCommitmentKeyLength` if `ck` cannot commit to the trace.
  pub fn setup(
    circuit: &UltraCircuit<E::Scalar>,
    ck: &CommitmentKey<E>,
    vk_pcs: VerifierKey<E>,
  ) -> Result<(ProvingKey<E>, VerificationKey<E>), HonkError> {
    let n = Self::circuit_size(circuit);
    if ck.length() < n {
      return Err(HonkError::InvalidCommitmentKeyLength);
    }
    let (_setup_span, setup_t) = start_span!("ultra_composer_setup", circuit_size = n);
    let k = circuit.num_public_inputs();

    let mut selectors = vec![vec![E::Scalar::ZERO; n]; 8];
    for (j, gate) in circuit.gates.iter().enumerate() {
      let row = PUB_INPUTS_OFFSET + k + j;
      let s = &gate.selectors;
      for (column, value) in selectors
        .iter_mut()
        .zip([s.q_m, s.q_l, s.q_r, s.q_o, s.q_4, s.q_c, s.q_arith, s.q_lookup])
      {
        column[row] = value;
      }
    }

    let (sigmas, ids) = Self::permutation_polynomials(circuit, n);

    let mut tables = vec![vec![E::Scalar::ZERO; n]; NUM_WIRES];
    let mut row = n - circuit.num_table_entries();
    for table in &circuit.lookup_tables {
      for entry in &table.entries {
        for c in 0..3 {
          tables[c][row] = entry[c];
        }
        tables[3][row] = E::Scalar::from(table.id);
        row += 1;
      }
    }

    let mut lagrange_first = vec![E::Scalar::ZERO; n];
    lagrange_first[0] = E::Scalar::ONE;
    let mut lagrange_last = vec![E::Scalar::ZERO; n];
    lagrange_last[n - 1] = E::Scalar::ONE;

    let precomputed = selectors
      .into_iter()
      .chain(sigmas)
      .chain(ids)
      .chain(tables)
      .chain([lagrange_first, lagrange_last])
      .map(Arc::new)
      .collect::<Vec<_>>();
    debug_assert_eq!(precomputed.len(), NUM_PRECOMPUTED_ENTITIES);

    let (_commit_span, commit_t) = start_span!("commit_precomputed");
    let commitments = precomputed
      .par_iter()
      .map(|p| E::PCS::commit(ck, p))
      .collect::<Result<Vec<_>, _>>()?;
    info!(elapsed_ms = %commit_t.elapsed().as_millis(), "commit_precomputed");

    let vk = VerificationKey {
      circuit_size: n,
      log_circuit_size: n.log_2(),
      num_public_inputs: k,
      pub_inputs_offset: PUB_INPUTS_OFFSET,
      commitments,
      vk_pcs,
      digest: OnceCell::new(),
    };
    let pk = ProvingKey {
      circuit_size: n,
      log_circuit_size: n.log_2(),
      num_public_inputs: k,
      pub_inputs_offset: PUB_INPUTS_OFFSET,
      precomputed,
      vk_digest: vk.digest()?,
    };

    debug!(
      gates = circuit.num_gates(),
      public_inputs = k,
      lookups = circuit.num_lookups(),
      "trace layout"
    );
    info!(elapsed_ms = %setup_t.elapsed().as_millis(), circuit_size = n, "ultra_composer_setup");
    Ok((pk, vk))
  }

  /// Fills the wire columns and the sorted lookup columns from the circuit's assignment.
  ///
  /// # Errors
  /// Returns `HonkError::InvalidCircuitSize` if `pk` was built for a different layout and
  /// `HonkError::InvalidLookup` if a lookup gate reads a value absent from its table.
  pub fn compute_witness(
    circuit: &UltraCircuit<E::Scalar>,
    pk: &ProvingKey<E>,
  ) -> Result<UltraWitness<E::Scalar>, HonkError> {
    let n = pk.circuit_size;
    if Self::circuit_size(circuit) != n || circuit.num_public_inputs() != pk.num_public_inputs {
      return Err(HonkError::InvalidCircuitSize { size: n });
    }

    let wires = Self::wire_variables(circuit, n)
      .into_iter()
      .map(|column| {
        column
          .into_iter()
          .map(|v| v.map_or(E::Scalar::ZERO, |v| circuit.variables[v as usize]))
          .collect::<Vec<_>>()
      })
      .collect::<Vec<_>>();
    let public_inputs = circuit.public_input_values();

    // lookup counts per table entry, in gate order
    let mut reads = circuit
      .lookup_tables
      .iter()
      .map(|t| vec![0usize; t.entries.len()])
      .collect::<Vec<_>>();
    for gate in circuit.gates.iter().filter(|g| g.table_id.is_some()) {
      let (id, entry) = circuit.lookup_entry_index(gate)?;
      reads[(id - 1) as usize][entry] += 1;
    }

    let mut sorted = vec![vec![E::Scalar::ZERO; n]; NUM_WIRES];
    let mut row = n - (circuit.num_lookups() + circuit.num_table_entries());
    for (table, counts) in circuit.lookup_tables.iter().zip(reads) {
      for (entry, count) in table.entries.iter().zip(counts) {
        for _ in 0..=count {
          for c in 0..3 {
            sorted[c][row] = entry[c];
          }
          sorted[3][row] = E::Scalar::from(table.id);
          row += 1;
        }
      }
    }

    Ok(UltraWitness {
      wires,
      sorted,
      public_inputs,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::{Bn256EngineKZG, bn256::bn256, pcs::kzg_pc::KZGPCS};
  use group::{Curve, prime::PrimeCurveAffine};

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;

  fn cubic() -> UltraCircuit<F> {
    let mut circuit = UltraCircuit::new();
    let x = circuit.add_variable(F::from(3u64));
    let y = circuit.add_public_input(F::from(35u64));
    let x_sq = circuit.add_variable(F::from(9u64));
    let x_cu = circuit.add_variable(F::from(27u64));
    circuit.create_mul_gate(x, x, x_sq).unwrap();
    circuit.create_mul_gate(x_sq, x, x_cu).unwrap();
    circuit
      .create_add_gate([x_cu, x, y], [F::ONE, F::ONE, -F::ONE], F::from(5u64))
      .unwrap();
    circuit
  }

  #[test]
  fn test_layout_and_permutation() {
    let circuit = cubic();
    let n = UltraComposer::<E>::circuit_size(&circuit);
    assert_eq!(n, 8);

    let (ck, vk_pcs) = UltraComposer::<E>::commitment_key(n);
    let (pk, vk) = UltraComposer::<E>::setup(&circuit, &ck, vk_pcs).unwrap();
    assert_eq!(pk.log_circuit_size(), 3);
    assert_eq!(vk.commitments.len(), NUM_PRECOMPUTED_ENTITIES);
    assert_eq!(pk.vk_digest, vk.digest().unwrap());

    let witness = UltraComposer::<E>::compute_witness(&circuit, &pk).unwrap();
    assert!(witness.check_shape(n, 1).is_ok());
    assert_eq!(witness.wires[0][1], F::from(35u64));
    assert_eq!(witness.wires[1][1], F::from(35u64));

    // sigma maps every cell to a cell holding the same value
    let sigma = Entity::SIGMAS.map(|e| pk.polynomial(e).unwrap().clone());
    for c in 0..NUM_WIRES {
      for r in 0..n {
        if c == 0 && r == PUB_INPUTS_OFFSET {
          assert_eq!(sigma[c][r], -F::from(2u64));
          continue;
        }
        let target = (0..NUM_WIRES * n)
          .find(|t| F::from(*t as u64) == sigma[c][r])
          .unwrap();
        assert_eq!(witness.wires[target / n][target % n], witness.wires[c][r]);
      }
    }

    // the public input's w_2 cell is where its external edge enters the cycle
    let w2_pi_cell = F::from((n + PUB_INPUTS_OFFSET) as u64);
    assert!(sigma.iter().flat_map(|v| v.iter()).all(|s| *s != w2_pi_cell));
    // y is w_3 of the addition gate on row 5
    assert_eq!(sigma[1][PUB_INPUTS_OFFSET], F::from((2 * n + 5) as u64));
  }

  #[test]
  fn test_sorted_list_is_bottom_aligned() {
    let mut circuit = cubic();
    let table = (0..3u64)
      .map(|a| [F::from(a), F::from(a + 1), F::from(a + 2)])
      .collect::<Vec<_>>();
    let id = circuit.add_lookup_table(table).unwrap();
    let a = circuit.add_variable(F::from(1u64));
    let b = circuit.add_variable(F::from(2u64));
    let c = circuit.add_variable(F::from(3u64));
    circuit.create_lookup_gate(id, [a, b, c]).unwrap();

    let n = UltraComposer::<E>::circuit_size(&circuit);
    let (ck, vk_pcs) = UltraComposer::<E>::commitment_key(n);
    let (pk, _) = UltraComposer::<E>::setup(&circuit, &ck, vk_pcs).unwrap();
    let witness = UltraComposer::<E>::compute_witness(&circuit, &pk).unwrap();

    let s1 = &witness.sorted[0];
    assert_eq!(
      s1[n - 4..].to_vec(),
      vec![F::ZERO, F::ONE, F::ONE, F::from(2u64)]
    );
    assert!(s1[..n - 4].iter().all(|v| *v == F::ZERO));
    let t4 = pk.polynomial(Entity::Table4).unwrap();
    assert_eq!(t4[n - 3..].to_vec(), vec![F::ONE; 3]);
    assert_eq!(t4[n - 4], F::ZERO);
  }

  #[test]
  fn test_short_commitment_key() {
    let circuit = cubic();
    let (ck, vk_pcs) = UltraComposer::<E>::commitment_key(4);
    assert!(matches!(
      UltraComposer::<E>::setup(&circuit, &ck, vk_pcs),
      Err(HonkError::InvalidCommitmentKeyLength)
    ));
  }

  #[test]
  fn test_load_external_commitment_key() {
    let circuit = cubic();
    let n = UltraComposer::<E>::circuit_size(&circuit);
    let tau = F::from(7u64);
    let g1 = bn256::Affine::generator();
    let g1_powers = (0..n as u64)
      .map(|i| (g1 * tau.pow_vartime([i])).to_affine())
      .collect::<Vec<_>>();
    let tau_g2 = (bn256::G2Affine::generator() * tau).to_affine();
    let (ck, vk_pcs) =
      KZGPCS::<E>::from_powers(g1_powers, bn256::G2Affine::generator(), tau_g2).unwrap();
    let (ck, vk_pcs) = UltraComposer::<E>::load_commitment_key(n, ck, vk_pcs).unwrap();
    assert!(UltraComposer::<E>::setup(&circuit, &ck, vk_pcs).is_ok());

    let (short_ck, short_vk) = UltraComposer::<E>::commitment_key(n / 2);
    assert!(matches!(
      UltraComposer::<E>::load_commitment_key(n, short_ck, short_vk),
      Err(HonkError::InvalidCommitmentKeyLength)
    ));
  }
}
