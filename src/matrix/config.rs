//! Configuration and system parameters for the assignment engine

use crate::constants::{DEFAULT_CHUNK, DEFAULT_TASKS_PER_THREAD};
use crate::error::{AssignError, Result};

/// System parameters for performance tuning
#[derive(Debug, Clone)]
pub struct SystemParameters {
    /// Number of threads to use
    pub n_threads: usize,
}

impl Default for SystemParameters {
    fn default() -> Self {
        Self {
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

/// When deferred work (zombies, pending tuples) is folded into the structure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Materialize {
    /// Leave zombies and pending tuples for a later `wait`
    #[default]
    Lazy,
    /// Finish every assignment with a `wait`
    Eager,
}

/// Configuration for the assignment engine
#[derive(Debug, Clone)]
pub struct AssignConfig {
    /// System parameters for performance tuning
    pub system_params: SystemParameters,

    /// Units of work a task should have before parallelism pays off
    pub chunk: usize,

    /// Tasks created per thread when work is split
    pub tasks_per_thread: usize,

    /// Exact number of tasks to create, overriding the heuristic
    pub ntasks: Option<usize>,

    /// Whether assignments finish with a `wait`
    pub materialize: Materialize,
}

impl Default for AssignConfig {
    fn default() -> Self {
        Self {
            system_params: SystemParameters::default(),
            chunk: DEFAULT_CHUNK,
            tasks_per_thread: DEFAULT_TASKS_PER_THREAD,
            ntasks: None,
            materialize: Materialize::Lazy,
        }
    }
}

impl AssignConfig {
    /// A single-threaded configuration
    pub fn serial() -> Self {
        Self {
            system_params: SystemParameters { n_threads: 1 },
            ntasks: Some(1),
            ..Self::default()
        }
    }

    /// A configuration that always splits work into exactly `ntasks` tasks
    pub fn with_tasks(ntasks: usize) -> Self {
        Self {
            chunk: 1,
            ntasks: Some(ntasks),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.system_params.n_threads == 0 {
            return Err(AssignError::InvalidValue("n_threads must be at least 1".into()));
        }
        if self.chunk == 0 || self.tasks_per_thread == 0 || self.ntasks == Some(0) {
            return Err(AssignError::InvalidValue(
                "chunk, tasks_per_thread and ntasks must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Threads worth using for `work` units of work
    pub fn nthreads_for_work(&self, work: usize) -> usize {
        let by_work = (work / self.chunk.max(1)).max(1);
        by_work.min(self.system_params.n_threads.max(1))
    }

    /// Tasks to create for `work` units of work
    pub fn ntasks_for_work(&self, work: usize) -> usize {
        if let Some(n) = self.ntasks {
            return n.max(1);
        }
        let nthreads = self.nthreads_for_work(work);
        if nthreads == 1 {
            1
        } else {
            nthreads * self.tasks_per_thread
        }
    }
}
