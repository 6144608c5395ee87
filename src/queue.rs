//! The deferred work queue for commitment computations.
//!
//! Rounds enqueue the polynomials they produce and receive a [`QueueHandle`]; a later
//! [`WorkQueue::process`] hands every pending job to a [`QueueExecutor`] in one batch and
//! writes each result into its handle's slot. [`WorkQueue::resolve`] processes first if the
//! handle is still pending. Executors may run jobs in any internal order, so callers control
//! the order in which results reach the transcript by the order in which they resolve.
use crate::{
  Commitment, CommitmentKey, errors::HonkError, start_span,
  traits::{Engine, pcs::PCSEngineTrait},
};
use rayon::prelude::*;
use std::{sync::Arc, time::Instant};
use tracing::{debug, info, info_span};

/// A reference to the eventual result of an enqueued job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct QueueHandle(usize);

/// A pending commitment computation
#[derive(Clone, Debug)]
pub struct CommitJob<E: Engine> {
  /// Transcript label the resulting commitment will be sent under
  pub label: String,
  /// The polynomial to commit to
  pub polynomial: Arc<Vec<E::Scalar>>,
}

/// Runs a batch of commitment jobs.
///
/// Implementations must return exactly one commitment per job, in the order of `jobs`.
pub trait QueueExecutor<E: Engine>: Send + Sync {
  /// Commits to every job's polynomial
  fn execute(
    &self,
    ck: &CommitmentKey<E>,
    jobs: &[CommitJob<E>],
  ) -> Result<Vec<Commitment<E>>, HonkError>;
}

/// Runs jobs on the global rayon pool
#[derive(Clone, Copy, Debug, Default)]
pub struct RayonExecutor;

impl<E: Engine> QueueExecutor<E> for RayonExecutor {
  fn execute(
    &self,
    ck: &CommitmentKey<E>,
    jobs: &[CommitJob<E>],
  ) -> Result<Vec<Commitment<E>>, HonkError> {
    jobs
      .par_iter()
      .map(|job| E::PCS::commit(ck, &job.polynomial))
      .collect()
  }
}

/// Runs jobs on a dedicated rayon pool, isolated from the caller's threads
#[derive(Debug)]
pub struct ThreadPoolExecutor {
  pool: rayon::ThreadPool,
}

impl ThreadPoolExecutor {
  /// Builds a pool with `num_threads` workers
  pub fn new(num_threads: usize) -> Result<Self, HonkError> {
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(num_threads)
      .thread_name(|i| format!("honk-queue-{i}"))
      .build()
      .map_err(|e| HonkError::QueueError {
        reason: e.to_string(),
      })?;
    Ok(Self { pool })
  }
}

impl<E: Engine> QueueExecutor<E> for ThreadPoolExecutor {
  fn execute(
    &self,
    ck: &CommitmentKey<E>,
    jobs: &[CommitJob<E>],
  ) -> Result<Vec<Commitment<E>>, HonkError> {
    self
      .pool
      .install(|| <RayonExecutor as QueueExecutor<E>>::execute(&RayonExecutor, ck, jobs))
  }
}

/// The queue itself: pending jobs plus one result slot per handle ever issued
pub struct WorkQueue<E: Engine> {
  ck: Arc<CommitmentKey<E>>,
  executor: Arc<dyn QueueExecutor<E>>,
  pending: Vec<(QueueHandle, CommitJob<E>)>,
  slots: Vec<Option<Commitment<E>>>,
}

impl<E: Engine> WorkQueue<E> {
  /// Creates an empty queue committing with `ck` on the given executor
  pub fn new(ck: Arc<CommitmentKey<E>>, executor: Arc<dyn QueueExecutor<E>>) -> Self {
    Self {
      ck,
      executor,
      pending: Vec::new(),
      slots: Vec::new(),
    }
  }

  /// Records a commitment job and returns its handle
  pub fn enqueue(&mut self, label: impl Into<String>, polynomial: Arc<Vec<E::Scalar>>) -> QueueHandle {
    let handle = QueueHandle(self.slots.len());
    self.slots.push(None);
    self.pending.push((
      handle,
      CommitJob {
        label: label.into(),
        polynomial,
      },
    ));
    handle
  }

  /// Number of jobs not yet processed
  pub fn num_pending(&self) -> usize {
    self.pending.len()
  }

  /// Runs every pending job and fills in its slot.
  ///
  /// On failure all pending jobs are dropped; the run is expected to abort.
  pub fn process(&mut self) -> Result<(), HonkError> {
    if self.pending.is_empty() {
      return Ok(());
    }
    let (_process_span, process_t) = start_span!("queue_process", jobs = self.pending.len());

    let (handles, jobs): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending).into_iter().unzip();
    let results = self.executor.execute(&self.ck, &jobs)?;
    if results.len() != jobs.len() {
      return Err(HonkError::QueueError {
        reason: format!("executor returned {} results for {} jobs", results.len(), jobs.len()),
      });
    }
    for (handle, comm) in handles.into_iter().zip(results) {
      self.slots[handle.0] = Some(comm);
    }

    debug!(labels = ?jobs.iter().map(|j| j.label.as_str()).collect::<Vec<_>>(), "queue resolved");
    info!(elapsed_ms = %process_t.elapsed().as_millis(), jobs = jobs.len(), "queue_process");
    Ok(())
  }

  /// Returns the commitment for `handle`, processing pending jobs first if needed
  pub fn resolve(&mut self, handle: QueueHandle) -> Result<Commitment<E>, HonkError> {
    let slot = self.slots.get(handle.0).ok_or(HonkError::InvalidIndex)?;
    if slot.is_none() {
      self.process()?;
    }
    self
      .slots
      .get(handle.0)
      .and_then(|s| s.clone())
      .ok_or_else(|| HonkError::QueueError {
        reason: format!("job {} was not materialized", handle.0),
      })
  }

  /// Drops all pending jobs and results; handles issued before are invalidated
  pub fn clear(&mut self) {
    self.pending.clear();
    self.slots.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::Bn256EngineKZG;
  use std::sync::Mutex;

  type E = Bn256EngineKZG;
  type F = <E as Engine>::Scalar;

  /// Commits in reverse job order and records the order it ran jobs in
  #[derive(Default)]
  struct ReversingExecutor {
    order: Mutex<Vec<String>>,
  }

  impl QueueExecutor<E> for ReversingExecutor {
    fn execute(
      &self,
      ck: &CommitmentKey<E>,
      jobs: &[CommitJob<E>],
    ) -> Result<Vec<Commitment<E>>, HonkError> {
      let mut out = Vec::with_capacity(jobs.len());
      for job in jobs.iter().rev() {
        self.order.lock().unwrap().push(job.label.clone());
        out.push(<E as Engine>::PCS::commit(ck, &job.polynomial)?);
      }
      out.reverse();
      Ok(out)
    }
  }

  /// Always fails, standing in for an unavailable execution host
  struct FailingExecutor;

  impl QueueExecutor<E> for FailingExecutor {
    fn execute(
      &self,
      _ck: &CommitmentKey<E>,
      _jobs: &[CommitJob<E>],
    ) -> Result<Vec<Commitment<E>>, HonkError> {
      Err(HonkError::QueueError {
        reason: "execution host unavailable".to_string(),
      })
    }
  }

  fn ck() -> Arc<CommitmentKey<E>> {
    Arc::new(<E as Engine>::PCS::setup(b"queue", 8).0)
  }

  fn poly(seed: u64) -> Arc<Vec<F>> {
    Arc::new((0..8).map(|i| F::from(seed * 10 + i)).collect())
  }

  #[test]
  fn test_results_follow_handles_not_execution_order() {
    let ck = ck();
    let executor = Arc::new(ReversingExecutor::default());
    let mut queue = WorkQueue::<E>::new(ck.clone(), executor.clone());

    let handles = ["A", "B", "C"]
      .iter()
      .enumerate()
      .map(|(i, l)| queue.enqueue(*l, poly(i as u64)))
      .collect::<Vec<_>>();
    assert_eq!(queue.num_pending(), 3);

    let resolved = handles
      .iter()
      .map(|h| queue.resolve(*h).unwrap())
      .collect::<Vec<_>>();
    assert_eq!(queue.num_pending(), 0);
    assert_eq!(*executor.order.lock().unwrap(), vec!["C", "B", "A"]);

    for (i, comm) in resolved.iter().enumerate() {
      assert_eq!(
        *comm,
        <E as Engine>::PCS::commit(&ck, &poly(i as u64)).unwrap()
      );
    }
  }

  #[test]
  fn test_rayon_and_thread_pool_agree() {
    let ck = ck();
    let mut a = WorkQueue::<E>::new(ck.clone(), Arc::new(RayonExecutor));
    let mut b = WorkQueue::<E>::new(ck, Arc::new(ThreadPoolExecutor::new(2).unwrap()));
    for i in 0..4 {
      let ha = a.enqueue(format!("P_{i}"), poly(i));
      let hb = b.enqueue(format!("P_{i}"), poly(i));
      assert_eq!(a.resolve(ha).unwrap(), b.resolve(hb).unwrap());
    }
  }

  #[test]
  fn test_failure_surfaces_from_resolve() {
    let mut queue = WorkQueue::<E>::new(ck(), Arc::new(FailingExecutor));
    let h = queue.enqueue("W_1", poly(1));
    assert!(matches!(queue.resolve(h), Err(HonkError::QueueError { .. })));
  }

  #[test]
  fn test_clear_invalidates_handles() {
    let mut queue = WorkQueue::<E>::new(ck(), Arc::new(RayonExecutor));
    let h = queue.enqueue("W_1", poly(1));
    queue.clear();
    assert_eq!(queue.resolve(h), Err(HonkError::InvalidIndex));
  }
}
