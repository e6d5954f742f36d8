//! Parallel batch rendering. Tasks fan out over a bounded rayon pool; one
//! failing or panicking task is recorded in its report and never takes down
//! the batch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::{
    config::GenerationConfig,
    foundation::{
        core::ImageRgb,
        error::{FondraError, FondraResult},
    },
    pipeline::GenerationPipeline,
};

/// Worker count never exceeds this, regardless of core count.
pub const DEFAULT_WORKER_CEILING: usize = 8;

/// Progress callback cadence, in completed tasks.
pub const DEFAULT_PROGRESS_EVERY: usize = 5;

/// One unit of batch work. `index` orders the final reports and is the
/// task's identity in logs and errors.
#[derive(Clone, Debug)]
pub struct BatchTask {
    pub config: GenerationConfig,
    pub dest: String,
    pub index: usize,
}

/// Outcome of one task, image included on success.
#[derive(Debug)]
pub struct TaskReport {
    pub index: usize,
    pub dest: String,
    pub outcome: FondraResult<ImageRgb>,
}

impl TaskReport {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Shared cancellation flag; cancelling stops tasks that have not started.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Worker threads; `None` uses `min(cores, DEFAULT_WORKER_CEILING)`.
    pub workers: Option<usize>,
    pub progress_every: usize,
    /// Tasks not started within this budget report as cancelled.
    pub deadline: Option<Duration>,
    pub cancel: CancelToken,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            workers: None,
            progress_every: DEFAULT_PROGRESS_EVERY,
            deadline: None,
            cancel: CancelToken::new(),
        }
    }
}

fn worker_count(requested: Option<usize>) -> usize {
    match requested {
        Some(n) => n.max(1),
        None => {
            let cores = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1);
            cores.min(DEFAULT_WORKER_CEILING)
        }
    }
}

fn build_thread_pool(threads: usize) -> FondraResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(|e| FondraError::Other(anyhow::Error::new(e)))
}

/// Renders every task, in parallel, and returns per-task reports ordered by
/// index plus aggregate stats. `progress` is invoked with
/// `(completed_so_far, total)` every `progress_every` completions and once at
/// the end.
#[tracing::instrument(skip(tasks, options, progress), fields(total = tasks.len()))]
pub fn run_batch(
    tasks: Vec<BatchTask>,
    options: &BatchOptions,
    progress: impl Fn(usize, usize) + Sync,
) -> FondraResult<(Vec<TaskReport>, BatchStats)> {
    let total = tasks.len();
    let threads = worker_count(options.workers);
    let pool = build_thread_pool(threads)?;
    tracing::debug!(threads, total, "starting batch");

    let started = Instant::now();
    let done = AtomicUsize::new(0);
    let cadence = options.progress_every.max(1);

    let mut reports: Vec<TaskReport> = pool.install(|| {
        tasks
            .into_par_iter()
            .map(|task| {
                let outcome = run_task(&task, options, started);
                if let Err(err) = &outcome {
                    tracing::warn!(index = task.index, %err, "task failed");
                }
                let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
                if finished % cadence == 0 {
                    progress(finished, total);
                }
                TaskReport {
                    index: task.index,
                    dest: task.dest,
                    outcome,
                }
            })
            .collect()
    });
    progress(total, total);

    reports.sort_by_key(|r| r.index);
    let failed = reports.iter().filter(|r| !r.succeeded()).count();
    let stats = BatchStats {
        total,
        completed: total - failed,
        failed,
    };
    tracing::info!(?stats, elapsed_ms = started.elapsed().as_millis() as u64, "batch finished");
    Ok((reports, stats))
}

fn run_task(task: &BatchTask, options: &BatchOptions, started: Instant) -> FondraResult<ImageRgb> {
    if options.cancel.is_cancelled() {
        return Err(FondraError::Cancelled(task.index));
    }
    if let Some(deadline) = options.deadline
        && started.elapsed() >= deadline
    {
        return Err(FondraError::Cancelled(task.index));
    }

    let config = task.config.clone();
    match catch_unwind(AssertUnwindSafe(move || {
        GenerationPipeline::new(config)?.run()
    })) {
        Ok(outcome) => outcome,
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            Err(FondraError::Other(anyhow::anyhow!(
                "task {} panicked: {msg}",
                task.index
            )))
        }
    }
}
