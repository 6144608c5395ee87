//! The relation-check sub-protocol.
//!
//! Proves `sum_x pow_zeta(x) * sum_s alpha^s R_s(x) = 0` over the hypercube, where `R_s` are
//! the Ultra subrelations and `pow_zeta(x) = zeta^x`. Each of the `d` rounds sends the
//! evaluations of the round univariate at `0..BATCHED_RELATION_LENGTH`, derives a challenge
//! `u_i` and binds the lowest remaining variable of every column to it.
use crate::{
  errors::HonkError,
  flavor::{AllEntities, AllValues, Entity, NUM_ALL_ENTITIES, ProverPolynomials},
  math::Math,
  polys::{multilinear::bind_bot, power::PowPolynomial, univariate::UniPoly},
  proof::ProofElement,
  relations::{
    BATCHED_RELATION_LENGTH, NUM_SUBRELATIONS, RelationParameters, accumulate_all_relations,
    batch_subrelations,
  },
  start_span,
  traits::{Engine, transcript::powers},
  transcript::{ProverTranscript, VerifierTranscript},
};
use ff::{Field, PrimeField};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, info_span};

/// Label of the round univariate sent in round `i`
pub fn univariate_label(round: usize) -> String {
  format!("Sumcheck:univariate_{round}")
}

/// Label of the challenge derived in round `i`
pub fn challenge_label(round: usize) -> String {
  format!("Sumcheck:u_{round}")
}

/// Label of the claimed evaluations sent after the last round
pub const EVALUATIONS_LABEL: &str = "Sumcheck:evaluations";

/// The point the relation check reduced to, with the claimed evaluations of every column
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumcheckOutput<F: PrimeField> {
  /// The challenges `u_0, ..., u_{d-1}`, one per variable
  pub challenge: Vec<F>,
  /// Evaluations of all columns (shifted views included) at `challenge`
  pub claimed_evaluations: AllValues<F>,
}

/// Returns the subrelation separators `[1, alpha, alpha^2, ...]`.
pub fn relation_separators<F: PrimeField>(alpha: &F) -> Vec<F> {
  powers(alpha, NUM_SUBRELATIONS)
}

/// Prover side of the relation check
pub struct SumcheckProver;

impl SumcheckProver {
  /// Runs all rounds, appending round univariates and the claimed evaluations to `transcript`.
  pub fn prove<E: Engine>(
    transcript: &mut ProverTranscript<E>,
    polynomials: &ProverPolynomials<E::Scalar>,
    params: &RelationParameters<E::Scalar>,
    alpha: &E::Scalar,
    zeta: &E::Scalar,
  ) -> Result<SumcheckOutput<E::Scalar>, HonkError> {
    let n = polynomials[Entity::W1].len();
    let num_rounds = n.exact_log_2().ok_or(HonkError::InvalidCircuitSize { size: n })?;
    let (_sumcheck_span, sumcheck_t) = start_span!("sumcheck_prove", rounds = num_rounds);

    let alphas = relation_separators(alpha);
    let mut pow = PowPolynomial::new(zeta, num_rounds).evals();
    let mut challenge = Vec::with_capacity(num_rounds);

    // the first round reads the shared columns; later rounds own their partially bound copies
    let mut bound: Option<Vec<Vec<E::Scalar>>> = None;
    for round in 0..num_rounds {
      let columns: Vec<&[E::Scalar]> = match &bound {
        Some(cols) => cols.iter().map(|c| c.as_slice()).collect(),
        None => polynomials.as_slice().iter().map(|c| c.as_slice()).collect(),
      };

      let univariate = compute_round_univariate(&columns, &pow, params, &alphas);
      transcript.send_to_verifier(
        univariate_label(round),
        ProofElement::Scalars(univariate.to_vec()),
      );
      let u = transcript.get_challenge(&challenge_label(round))?;

      let next = columns
        .par_iter()
        .map(|c| bind_bot(c, &u))
        .collect::<Vec<_>>();
      bound = Some(next);
      pow = bind_bot(&pow, &u);
      challenge.push(u);
      debug!(round, "sumcheck round");
    }

    let evals = bound
      .map(|cols| cols.iter().map(|c| c[0]).collect::<Vec<_>>())
      .ok_or(HonkError::InvalidCircuitSize { size: n })?;
    let claimed_evaluations = AllEntities::try_from_vec(evals)?;
    transcript.send_to_verifier(
      EVALUATIONS_LABEL,
      ProofElement::Scalars(claimed_evaluations.as_slice().to_vec()),
    );

    info!(elapsed_ms = %sumcheck_t.elapsed().as_millis(), rounds = num_rounds, "sumcheck_prove");
    Ok(SumcheckOutput {
      challenge,
      claimed_evaluations,
    })
  }
}

// S(k) = sum over edges j of pow_j(k) * sum_s alpha^s R_s(row_j(k)), for k in 0..BATCHED_RELATION_LENGTH
fn compute_round_univariate<F: PrimeField>(
  columns: &[&[F]],
  pow: &[F],
  params: &RelationParameters<F>,
  alphas: &[F],
) -> [F; BATCHED_RELATION_LENGTH] {
  let half = pow.len() / 2;
  (0..half)
    .into_par_iter()
    .fold(
      || {
        (
          [F::ZERO; BATCHED_RELATION_LENGTH],
          AllEntities::splat(F::ZERO),
          vec![F::ZERO; NUM_ALL_ENTITIES],
        )
      },
      |(mut acc, mut row, mut delta), j| {
        for (c, column) in columns.iter().enumerate() {
          row.as_mut_slice()[c] = column[2 * j];
          delta[c] = column[2 * j + 1] - column[2 * j];
        }
        let pow_delta = pow[2 * j + 1] - pow[2 * j];
        let mut scaling = pow[2 * j];

        for (k, acc_k) in acc.iter_mut().enumerate() {
          if k > 0 {
            for (v, d) in row.as_mut_slice().iter_mut().zip(delta.iter()) {
              *v += d;
            }
            scaling += pow_delta;
          }
          let evals = accumulate_all_relations(&row, params, &scaling);
          *acc_k += batch_subrelations(&evals, alphas);
        }
        (acc, row, delta)
      },
    )
    .map(|(acc, _, _)| acc)
    .reduce(
      || [F::ZERO; BATCHED_RELATION_LENGTH],
      |mut a, b| {
        for (x, y) in a.iter_mut().zip(b.iter()) {
          *x += y;
        }
        a
      },
    )
}

/// Verifier side of the relation check
pub struct SumcheckVerifier;

impl SumcheckVerifier {
  /// Replays the rounds, checking each round univariate against the running target and the
  /// final target against the relations evaluated at the claimed evaluations.
  pub fn verify<E: Engine>(
    transcript: &mut VerifierTranscript<'_, E>,
    num_rounds: usize,
    params: &RelationParameters<E::Scalar>,
    alpha: &E::Scalar,
    zeta: &E::Scalar,
  ) -> Result<SumcheckOutput<E::Scalar>, HonkError> {
    let mut target = E::Scalar::ZERO;
    let mut challenge = Vec::with_capacity(num_rounds);

    for round in 0..num_rounds {
      let evals = transcript.receive_scalars(&univariate_label(round), BATCHED_RELATION_LENGTH)?;
      if evals[0] + evals[1] != target {
        return Err(HonkError::InvalidSumcheckProof);
      }
      let u = transcript.get_challenge(&challenge_label(round))?;
      target = UniPoly::from_evals(&evals)?.evaluate(&u);
      challenge.push(u);
    }

    let claimed_evaluations = AllEntities::try_from_vec(
      transcript.receive_scalars(EVALUATIONS_LABEL, NUM_ALL_ENTITIES)?,
    )?;

    let pow_at_u = PowPolynomial::new(zeta, num_rounds).evaluate(&challenge);
    let relations = accumulate_all_relations(&claimed_evaluations, params, &pow_at_u);
    if batch_subrelations(&relations, &relation_separators(alpha)) != target {
      return Err(HonkError::InvalidSumcheckProof);
    }

    Ok(SumcheckOutput {
      challenge,
      claimed_evaluations,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    polys::multilinear::{MultilinearPolynomial, shift_left},
    provider::Bn256EngineKZG,
    proof::Proof,
    traits::{pcs::PCSEngineTrait, transcript::TranscriptEngineTrait},
  };
  use ff::Field;
  use rand::{SeedableRng, rngs::StdRng};
  use std::sync::Arc;

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;

  // an addition-only trace: w_l + w_r = w_o on every row, no copy constraints, no lookups.
  // With beta = gamma = 0 the grand products are identically one.
  fn addition_trace(rng: &mut StdRng, n: usize) -> ProverPolynomials<F> {
    let mut cols = AllEntities::from_fn(|_| vec![F::ZERO; n]);
    for i in 0..n {
      let a = F::random(&mut *rng);
      let b = F::random(&mut *rng);
      cols[Entity::W1][i] = a;
      cols[Entity::W2][i] = b;
      cols[Entity::W3][i] = a + b;
      cols[Entity::QArith][i] = F::ONE;
      cols[Entity::QL][i] = F::ONE;
      cols[Entity::QR][i] = F::ONE;
      cols[Entity::QO][i] = -F::ONE;
    }
    cols[Entity::LagrangeFirst][0] = F::ONE;
    cols[Entity::LagrangeLast][n - 1] = F::ONE;
    for i in 1..n {
      cols[Entity::ZPerm][i] = F::ONE;
    }
    for (shifted, source) in Entity::SHIFTED.iter().zip(Entity::TO_BE_SHIFTED.iter()) {
      cols[*shifted] = shift_left(&cols[*source]);
    }
    cols.map(|_, c| Arc::new(c.clone()))
  }

  fn params(rng: &mut StdRng) -> RelationParameters<F> {
    RelationParameters {
      eta: F::random(&mut *rng),
      public_input_delta: F::ONE,
      ..Default::default()
    }
  }

  fn dummy_proof(transcript: &mut ProverTranscript<E>) -> Proof<E> {
    let (ck, _) = <E as Engine>::PCS::setup(b"sumcheck", 2);
    let mut engine = <E as Engine>::TE::new(b"dummy");
    let (_, opening) = <E as Engine>::PCS::prove(&ck, &mut engine, &[F::ONE], &F::ONE).unwrap();
    Proof {
      entries: transcript.take_entries(),
      opening,
    }
  }

  #[test]
  fn test_sumcheck_round_trip() {
    let mut rng = StdRng::seed_from_u64(31);
    let n = 8;
    let polys = addition_trace(&mut rng, n);
    let params = params(&mut rng);
    let alpha = F::random(&mut rng);
    let zeta = F::random(&mut rng);
    let digest = [0u8; 32];

    let mut pt = ProverTranscript::<E>::new(&digest);
    pt.send_to_verifier("seed", ProofElement::Index(0));
    let out = SumcheckProver::prove(&mut pt, &polys, &params, &alpha, &zeta).unwrap();
    assert_eq!(out.challenge.len(), 3);
    // one univariate per round plus the claimed evaluations
    assert_eq!(pt.num_entries(), 1 + 3 + 1);

    // claimed evaluations are the multilinear evaluations at the challenge point
    for (e, value) in out.claimed_evaluations.iter() {
      let mle = MultilinearPolynomial::new(polys[e].to_vec());
      assert_eq!(mle.evaluate(&out.challenge), *value, "{}", e.label());
    }

    let proof = dummy_proof(&mut pt);
    let mut vt = VerifierTranscript::<E>::new(&digest, &proof);
    vt.receive_index("seed").unwrap();
    let verified = SumcheckVerifier::verify(&mut vt, 3, &params, &alpha, &zeta).unwrap();
    assert_eq!(verified, out);
  }

  #[test]
  fn test_sumcheck_rejects_unsatisfied_trace() {
    let mut rng = StdRng::seed_from_u64(32);
    let n = 8;
    let mut polys = addition_trace(&mut rng, n);
    let mut w3 = polys[Entity::W3].to_vec();
    w3[5] += F::ONE;
    polys[Entity::W3] = Arc::new(w3);

    let params = params(&mut rng);
    let alpha = F::random(&mut rng);
    let zeta = F::random(&mut rng);
    let digest = [0u8; 32];

    let mut pt = ProverTranscript::<E>::new(&digest);
    pt.send_to_verifier("seed", ProofElement::Index(0));
    SumcheckProver::prove(&mut pt, &polys, &params, &alpha, &zeta).unwrap();

    let proof = dummy_proof(&mut pt);
    let mut vt = VerifierTranscript::<E>::new(&digest, &proof);
    vt.receive_index("seed").unwrap();
    assert_eq!(
      SumcheckVerifier::verify(&mut vt, 3, &params, &alpha, &zeta),
      Err(HonkError::InvalidSumcheckProof)
    );
  }
}
