//! The UltraHonk round sequencer.
//!
//! [`UltraProver`] runs the protocol as a fixed sequence of rounds. Each round consumes the
//! outputs of its predecessor, enqueues commitments to the polynomials it produces on the
//! [`WorkQueue`], resolves them in transcript order, sends them and derives the challenges
//! of the next round. Calling a round out of order fails with
//! [`HonkError::RoundOutOfOrder`] and leaves the prover untouched.
use crate::{
  CommitmentKey, EvaluationArgument,
  composer::{ProvingKey, UltraWitness},
  errors::HonkError,
  flavor::{AllEntities, AllValues, Entity, NUM_UNSHIFTED_ENTITIES, ProverPolynomials},
  opening::{
    OpeningClaim,
    gemini::{self, GeminiProver, GeminiProverOutput},
    shplonk::{self, ShplonkProver},
  },
  polys::{multilinear::shift_left, univariate::batch_invert},
  proof::{Proof, ProofElement},
  queue::{QueueExecutor, RayonExecutor, WorkQueue},
  relations::{
    RelationParameters, compress, compute_lookup_grand_product_delta, compute_public_input_delta,
    lookup_factors, permutation_factors,
  },
  start_span,
  sumcheck::{SumcheckOutput, SumcheckProver},
  traits::{
    Engine,
    pcs::{Len, PCSEngineTrait},
    transcript::powers,
  },
  transcript::ProverTranscript,
};
use core::fmt;
use ff::Field;
use rayon::prelude::*;
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, info_span};

/// The rounds of the protocol, in execution order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProverRound {
  /// Sizes and public inputs
  Preamble,
  /// `W_1..W_3`, then `eta`
  WireCommitments,
  /// `SORTED_ACCUM` and `W_4`, then `beta, gamma`
  SortedListAccumulator,
  /// `Z_PERM` and `Z_LOOKUP`, then `alpha, zeta`
  GrandProduct,
  /// The `d` sumcheck rounds
  RelationCheck,
  /// Gemini fold commitments and evaluations
  Folding,
  /// The Shplonk batched quotient
  Batching,
  /// The opening of the batched claim
  FinalOpening,
  /// The proof is complete
  Done,
}

impl ProverRound {
  fn next(self) -> Self {
    match self {
      ProverRound::Preamble => ProverRound::WireCommitments,
      ProverRound::WireCommitments => ProverRound::SortedListAccumulator,
      ProverRound::SortedListAccumulator => ProverRound::GrandProduct,
      ProverRound::GrandProduct => ProverRound::RelationCheck,
      ProverRound::RelationCheck => ProverRound::Folding,
      ProverRound::Folding => ProverRound::Batching,
      ProverRound::Batching => ProverRound::FinalOpening,
      ProverRound::FinalOpening | ProverRound::Done => ProverRound::Done,
    }
  }
}

impl fmt::Display for ProverRound {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

/// Round-local state, cleared by [`UltraProver::reset`]
struct RoundState<E: Engine> {
  transcript: ProverTranscript<E>,
  witness: AllEntities<Option<Arc<Vec<E::Scalar>>>>,
  params: RelationParameters<E::Scalar>,
  alpha: E::Scalar,
  zeta: E::Scalar,
  polynomials: Option<ProverPolynomials<E::Scalar>>,
  sumcheck_output: Option<SumcheckOutput<E::Scalar>>,
  gemini_output: Option<GeminiProverOutput<E::Scalar>>,
  batched_claim: Option<OpeningClaim<E::Scalar>>,
  proof: Option<Proof<E>>,
}

impl<E: Engine> RoundState<E> {
  fn new(key: &ProvingKey<E>) -> Self {
    let mut witness = AllEntities::from_fn(|_| None);
    for (entity, poly) in Entity::PRECOMPUTED.iter().zip(&key.precomputed) {
      witness[*entity] = Some(poly.clone());
    }
    Self {
      transcript: ProverTranscript::new(&key.vk_digest),
      witness,
      params: RelationParameters::default(),
      alpha: E::Scalar::ZERO,
      zeta: E::Scalar::ZERO,
      polynomials: None,
      sumcheck_output: None,
      gemini_output: None,
      batched_claim: None,
      proof: None,
    }
  }

  fn polynomial(&self, entity: Entity) -> Result<&Arc<Vec<E::Scalar>>, HonkError> {
    self.witness[entity]
      .as_ref()
      .ok_or_else(|| HonkError::InvalidWitnessLength {
        reason: format!("{} has not been computed", entity.label()),
      })
  }
}

/// The UltraHonk prover for one proving key and one commitment key
pub struct UltraProver<E: Engine> {
  key: Arc<ProvingKey<E>>,
  ck: Arc<CommitmentKey<E>>,
  queue: WorkQueue<E>,
  input: UltraWitness<E::Scalar>,
  round: ProverRound,
  state: RoundState<E>,
}

impl<E: Engine> UltraProver<E> {
  /// Creates a prover committing on the global rayon pool
  pub fn new(
    key: Arc<ProvingKey<E>>,
    ck: Arc<CommitmentKey<E>>,
    witness: UltraWitness<E::Scalar>,
  ) -> Result<Self, HonkError> {
    Self::with_executor(key, ck, witness, Arc::new(RayonExecutor))
  }

  /// Creates a prover whose commitments run on `executor`
  pub fn with_executor(
    key: Arc<ProvingKey<E>>,
    ck: Arc<CommitmentKey<E>>,
    witness: UltraWitness<E::Scalar>,
    executor: Arc<dyn QueueExecutor<E>>,
  ) -> Result<Self, HonkError> {
    if ck.length() < key.circuit_size {
      return Err(HonkError::InvalidCommitmentKeyLength);
    }
    witness.check_shape(key.circuit_size, key.num_public_inputs)?;
    Ok(Self {
      queue: WorkQueue::new(ck.clone(), executor),
      state: RoundState::new(&key),
      key,
      ck,
      input: witness,
      round: ProverRound::Preamble,
    })
  }

  /// The round the prover will execute next
  pub fn current_round(&self) -> ProverRound {
    self.round
  }

  /// Discards all round-local state and starts over with a new witness
  pub fn reset(&mut self, witness: UltraWitness<E::Scalar>) -> Result<(), HonkError> {
    witness.check_shape(self.key.circuit_size, self.key.num_public_inputs)?;
    self.queue.clear();
    self.state = RoundState::new(&self.key);
    self.input = witness;
    self.round = ProverRound::Preamble;
    Ok(())
  }

  fn enter(&self, found: ProverRound) -> Result<(), HonkError> {
    if self.round == found {
      Ok(())
    } else {
      Err(HonkError::RoundOutOfOrder {
        expected: self.round.to_string(),
        found: found.to_string(),
      })
    }
  }

  fn circuit_size(&self) -> usize {
    self.key.circuit_size
  }

  /// Enqueues the given witness columns, then resolves and sends them in order
  fn commit_and_send(&mut self, entities: &[Entity]) -> Result<(), HonkError> {
    let handles = entities
      .iter()
      .map(|e| Ok((e.label(), self.queue.enqueue(e.label(), self.state.polynomial(*e)?.clone()))))
      .collect::<Result<Vec<_>, HonkError>>()?;
    self.queue.process()?;
    for (label, handle) in handles {
      let comm = self.queue.resolve(handle)?;
      self
        .state
        .transcript
        .send_to_verifier(label, ProofElement::Commitment(comm));
    }
    Ok(())
  }

  /// Sends the circuit size, the public input count and offset, and the public inputs
  pub fn execute_preamble_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::Preamble)?;
    let transcript = &mut self.state.transcript;
    transcript.send_to_verifier("circuit_size", ProofElement::Index(self.key.circuit_size as u64));
    transcript.send_to_verifier(
      "public_input_size",
      ProofElement::Index(self.key.num_public_inputs as u64),
    );
    transcript.send_to_verifier(
      "pub_inputs_offset",
      ProofElement::Index(self.key.pub_inputs_offset as u64),
    );
    for (i, x) in self.input.public_inputs.iter().enumerate() {
      transcript.send_to_verifier(format!("public_input_{i}"), ProofElement::Scalar(*x));
    }
    self.round = self.round.next();
    Ok(())
  }

  /// Commits to `W_1..W_3` and derives `eta`
  pub fn execute_wire_commitments_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::WireCommitments)?;
    let (_wire_span, wire_t) = start_span!("wire_commitments_round");

    for (entity, wire) in Entity::WIRES.iter().zip(&self.input.wires) {
      self.state.witness[*entity] = Some(Arc::new(wire.clone()));
    }
    self.commit_and_send(&[Entity::W1, Entity::W2, Entity::W3])?;
    self.state.params.eta = self.state.transcript.get_challenge("eta")?;

    info!(elapsed_ms = %wire_t.elapsed().as_millis(), "wire_commitments_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Compresses the sorted lookup columns with `eta`, commits to them and to `W_4`, and
  /// derives `beta, gamma`
  pub fn execute_sorted_list_accumulator_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::SortedListAccumulator)?;
    let (_sorted_span, sorted_t) = start_span!("sorted_list_accumulator_round");

    let eta = self.state.params.eta;
    let sorted = &self.input.sorted;
    let sorted_accum = (0..self.circuit_size())
      .into_par_iter()
      .map(|i| compress(eta, [sorted[0][i], sorted[1][i], sorted[2][i], sorted[3][i]]))
      .collect::<Vec<_>>();
    self.state.witness[Entity::SortedAccum] = Some(Arc::new(sorted_accum));

    self.commit_and_send(&[Entity::SortedAccum, Entity::W4])?;
    let challenges = self.state.transcript.get_challenges(&["beta", "gamma"])?;
    self.state.params.beta = challenges[0];
    self.state.params.gamma = challenges[1];

    info!(elapsed_ms = %sorted_t.elapsed().as_millis(), "sorted_list_accumulator_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Computes the permutation and lookup grand products, commits to them and derives
  /// `alpha, zeta`
  pub fn execute_grand_product_computation_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::GrandProduct)?;
    let (_gp_span, gp_t) = start_span!("grand_product_computation_round");
    let n = self.circuit_size();

    let params = &mut self.state.params;
    params.public_input_delta = compute_public_input_delta(
      &self.input.public_inputs,
      &params.beta,
      &params.gamma,
      n,
      self.key.pub_inputs_offset,
    )?;
    params.lookup_grand_product_delta =
      compute_lookup_grand_product_delta(&params.beta, &params.gamma, n);

    let (columns, params) = (&self.state.witness, &self.state.params);
    let (perm, lookup): (Vec<_>, Vec<_>) = (0..n)
      .into_par_iter()
      .map(|i| {
        let row = row_values(columns, i, n);
        (permutation_factors(&row, params), lookup_factors(&row, params))
      })
      .unzip();
    let z_perm = grand_product(perm)?;
    let z_lookup = grand_product(lookup)?;
    self.state.witness[Entity::ZPerm] = Some(Arc::new(z_perm));
    self.state.witness[Entity::ZLookup] = Some(Arc::new(z_lookup));

    self.commit_and_send(&[Entity::ZPerm, Entity::ZLookup])?;
    let challenges = self.state.transcript.get_challenges(&["alpha", "zeta"])?;
    self.state.alpha = challenges[0];
    self.state.zeta = challenges[1];

    info!(elapsed_ms = %gp_t.elapsed().as_millis(), "grand_product_computation_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Runs the `d` sumcheck rounds over all columns
  pub fn execute_relation_check_rounds(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::RelationCheck)?;

    let mut columns = Vec::with_capacity(Entity::ALL.len());
    for entity in Entity::ALL {
      let column = match entity.unshifted() {
        Some(source) => Arc::new(shift_left(self.state.polynomial(source)?)),
        None => self.state.polynomial(entity)?.clone(),
      };
      columns.push(column);
    }
    let polynomials = AllEntities::try_from_vec(columns)?;

    let output = SumcheckProver::prove(
      &mut self.state.transcript,
      &polynomials,
      &self.state.params,
      &self.state.alpha,
      &self.state.zeta,
    )?;
    self.state.polynomials = Some(polynomials);
    self.state.sumcheck_output = Some(output);
    self.round = self.round.next();
    Ok(())
  }

  /// Batches the columns with powers of `rho`, folds them along the sumcheck point, commits
  /// to the folds and sends their evaluations at `-r^{2^l}`
  pub fn execute_folding_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::Folding)?;
    let (_fold_span, fold_t) = start_span!("folding_round");
    let n = self.circuit_size();

    let (polynomials, output) = match (&self.state.polynomials, &self.state.sumcheck_output) {
      (Some(p), Some(o)) => (p, o),
      _ => {
        return Err(HonkError::RoundOutOfOrder {
          expected: ProverRound::RelationCheck.to_string(),
          found: ProverRound::Folding.to_string(),
        });
      }
    };
    let u = output.challenge.clone();

    let rho = self.state.transcript.get_challenge("rho")?;
    let rhos = powers(&rho, NUM_UNSHIFTED_ENTITIES + Entity::TO_BE_SHIFTED.len());
    let unshifted = &polynomials.as_slice()[..NUM_UNSHIFTED_ENTITIES];
    let to_be_shifted = Entity::TO_BE_SHIFTED
      .iter()
      .map(|e| &polynomials[*e])
      .collect::<Vec<_>>();

    let batched_unshifted = batch_columns(unshifted.iter(), &rhos[..NUM_UNSHIFTED_ENTITIES], n);
    let batched_to_be_shifted =
      batch_columns(to_be_shifted.into_iter(), &rhos[NUM_UNSHIFTED_ENTITIES..], n);

    let folds = GeminiProver::compute_fold_polynomials(&u, batched_unshifted, batched_to_be_shifted)?;
    let handles = folds[2..]
      .iter()
      .enumerate()
      .map(|(i, fold)| {
        let label = gemini::fold_label(i + 1);
        (label.clone(), self.queue.enqueue(label, Arc::new(fold.clone())))
      })
      .collect::<Vec<_>>();
    self.queue.process()?;
    for (label, handle) in handles {
      let comm = self.queue.resolve(handle)?;
      self
        .state
        .transcript
        .send_to_verifier(label, ProofElement::Commitment(comm));
    }

    let r = self.state.transcript.get_challenge(gemini::R_LABEL)?;
    let gemini_output = GeminiProver::compute_fold_polynomial_evaluations(&u, folds, &r)?;
    for (label, element) in gemini::evaluation_messages::<E>(&gemini_output) {
      self.state.transcript.send_to_verifier(label, element);
    }
    self.state.gemini_output = Some(gemini_output);

    info!(elapsed_ms = %fold_t.elapsed().as_millis(), folds = u.len() - 1, "folding_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Batches the Gemini claims into the quotient `Q`, commits to it and forms the claim at `z`
  pub fn execute_batching_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::Batching)?;
    let (_batch_span, batch_t) = start_span!("batching_round");

    let claims = self
      .state
      .gemini_output
      .take()
      .map(|o| o.opening_claims)
      .ok_or_else(|| HonkError::RoundOutOfOrder {
        expected: ProverRound::Folding.to_string(),
        found: ProverRound::Batching.to_string(),
      })?;

    let nu = self.state.transcript.get_challenge(shplonk::NU_LABEL)?;
    let quotient = ShplonkProver::compute_batched_quotient(&claims, &nu)?;
    let handle = self.queue.enqueue(shplonk::Q_LABEL, Arc::new(quotient.clone()));
    let comm = self.queue.resolve(handle)?;
    self
      .state
      .transcript
      .send_to_verifier(shplonk::Q_LABEL, ProofElement::Commitment(comm));

    let z = self.state.transcript.get_challenge(shplonk::Z_LABEL)?;
    let batched =
      ShplonkProver::compute_partially_evaluated_batched_quotient(&claims, quotient, &nu, &z)?;
    self.state.batched_claim = Some(batched);

    info!(elapsed_ms = %batch_t.elapsed().as_millis(), claims = claims.len(), "batching_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Opens the batched claim with the commitment scheme and assembles the proof
  pub fn execute_final_pcs_round(&mut self) -> Result<(), HonkError> {
    self.enter(ProverRound::FinalOpening)?;
    let (_pcs_span, pcs_t) = start_span!("final_pcs_round");

    let claim = self
      .state
      .batched_claim
      .take()
      .ok_or_else(|| HonkError::RoundOutOfOrder {
        expected: ProverRound::Batching.to_string(),
        found: ProverRound::FinalOpening.to_string(),
      })?;
    let (eval, opening): (E::Scalar, EvaluationArgument<E>) = E::PCS::prove(
      &self.ck,
      self.state.transcript.engine_mut(),
      &claim.polynomial,
      &claim.opening_pair.challenge,
    )?;
    if eval != claim.opening_pair.evaluation {
      return Err(HonkError::InvalidPCS);
    }

    self.state.proof = Some(Proof {
      entries: self.state.transcript.take_entries(),
      opening,
    });
    self.state.polynomials = None;

    info!(elapsed_ms = %pcs_t.elapsed().as_millis(), "final_pcs_round");
    self.round = self.round.next();
    Ok(())
  }

  /// Returns the assembled proof; only available once every round has run
  pub fn export_proof(&self) -> Result<Proof<E>, HonkError> {
    match (&self.state.proof, self.round) {
      (Some(proof), ProverRound::Done) => Ok(proof.clone()),
      _ => Err(HonkError::RoundOutOfOrder {
        expected: self.round.to_string(),
        found: ProverRound::Done.to_string(),
      }),
    }
  }

  /// Runs every round and returns the proof
  pub fn construct_proof(&mut self) -> Result<Proof<E>, HonkError> {
    let (_prove_span, prove_t) = start_span!("ultra_prove", circuit_size = self.circuit_size());
    self.execute_preamble_round()?;
    self.execute_wire_commitments_round()?;
    self.execute_sorted_list_accumulator_round()?;
    self.execute_grand_product_computation_round()?;
    self.execute_relation_check_rounds()?;
    self.execute_folding_round()?;
    self.execute_batching_round()?;
    self.execute_final_pcs_round()?;
    let proof = self.export_proof()?;
    debug!(entries = proof.entries().len(), "proof assembled");
    info!(elapsed_ms = %prove_t.elapsed().as_millis(), "ultra_prove");
    Ok(proof)
  }
}

/// Values of every computed column at `row`; shifted views read `row + 1`
fn row_values<F: Field>(columns: &AllEntities<Option<Arc<Vec<F>>>>, row: usize, n: usize) -> AllValues<F> {
  AllEntities::from_fn(|e| {
    let (source, idx) = match e.unshifted() {
      Some(source) => (source, row + 1),
      None => (e, row),
    };
    match &columns[source] {
      Some(p) if idx < n => p[idx],
      _ => F::ZERO,
    }
  })
}

/// `z[0] = 0`, `z[i + 1] = prod_{j <= i} num_j / den_j`
fn grand_product<F: Field>(factors: Vec<(F, F)>) -> Result<Vec<F>, HonkError> {
  let (numerators, mut denominators): (Vec<F>, Vec<F>) = factors.into_iter().unzip();
  batch_invert(&mut denominators)?;
  let n = numerators.len();
  let mut z = Vec::with_capacity(n);
  z.push(F::ZERO);
  let mut acc = F::ONE;
  for (num, den_inv) in numerators.iter().zip(&denominators).take(n.saturating_sub(1)) {
    acc *= *num * den_inv;
    z.push(acc);
  }
  Ok(z)
}

/// `sum_i scalars[i] * columns[i]`
fn batch_columns<'a, F: Field>(
  columns: impl Iterator<Item = &'a Arc<Vec<F>>>,
  scalars: &[F],
  n: usize,
) -> Vec<F> {
  let columns = columns.collect::<Vec<_>>();
  (0..n)
    .into_par_iter()
    .map(|i| {
      columns
        .iter()
        .zip(scalars)
        .map(|(c, s)| c[i] * s)
        .sum::<F>()
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{circuit::UltraCircuit, composer::UltraComposer, provider::Bn256EngineKZG};

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;

  fn prover() -> UltraProver<E> {
    let mut circuit = UltraCircuit::<F>::new();
    let a = circuit.add_public_input(F::from(6u64));
    let b = circuit.add_variable(F::from(7u64));
    let c = circuit.add_variable(F::from(42u64));
    circuit.create_mul_gate(a, b, c).unwrap();
    let n = UltraComposer::<E>::circuit_size(&circuit);
    let (ck, vk_pcs) = UltraComposer::<E>::commitment_key(n);
    let (pk, _) = UltraComposer::<E>::setup(&circuit, &ck, vk_pcs).unwrap();
    let witness = UltraComposer::<E>::compute_witness(&circuit, &pk).unwrap();
    UltraProver::new(Arc::new(pk), Arc::new(ck), witness).unwrap()
  }

  #[test]
  fn test_grand_product_shape() {
    let factors = vec![
      (F::from(2u64), F::ONE),
      (F::from(3u64), F::from(2u64)),
      (F::ONE, F::from(3u64)),
      (F::from(5u64), F::ONE),
    ];
    let z = grand_product(factors).unwrap();
    assert_eq!(z, vec![F::ZERO, F::from(2u64), F::from(3u64), F::ONE]);
  }

  #[test]
  fn test_rounds_must_run_in_order() {
    let mut prover = prover();
    for _ in 0..2 {
      assert_eq!(
        prover.execute_folding_round(),
        Err(HonkError::RoundOutOfOrder {
          expected: "Preamble".to_string(),
          found: "Folding".to_string(),
        })
      );
    }
    assert!(prover.export_proof().is_err());

    prover.execute_preamble_round().unwrap();
    assert!(matches!(
      prover.execute_preamble_round(),
      Err(HonkError::RoundOutOfOrder { .. })
    ));
    prover.execute_wire_commitments_round().unwrap();
    assert_eq!(prover.current_round(), ProverRound::SortedListAccumulator);
  }

  #[test]
  fn test_full_run_reaches_done() {
    let mut prover = prover();
    let proof = prover.construct_proof().unwrap();
    assert_eq!(prover.current_round(), ProverRound::Done);
    assert_eq!(prover.export_proof().unwrap(), proof);
    assert!(matches!(
      prover.execute_final_pcs_round(),
      Err(HonkError::RoundOutOfOrder { .. })
    ));
  }

  #[test]
  fn test_reset_rejects_wrong_shape() {
    let mut prover = prover();
    let bad = UltraWitness::new(vec![vec![F::ZERO; 3]; 4], vec![vec![F::ZERO; 3]; 4], vec![]);
    assert!(matches!(
      prover.reset(bad),
      Err(HonkError::InvalidWitnessLength { .. })
    ));
  }
}
