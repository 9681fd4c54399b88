//! Rayon thread pool configuration for scenario batches.
//!
//! [WorkerPool::install] runs a closure with a fixed number of threads, or on
//! Rayon's global pool (all cores) when no count is set.

use rayon::{ThreadPoolBuildError, ThreadPoolBuilder};

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerPool {
    /// Number of worker threads. 0 means the Rayon default.
    pub workers: usize,
}

impl WorkerPool {
    pub fn with_workers(n: usize) -> Self {
        Self { workers: n }
    }

    /// Run `f` with this worker count. A dedicated pool is built only when
    /// [workers](WorkerPool::workers) is non-zero.
    pub fn install<F, R>(&self, f: F) -> Result<R, ThreadPoolBuildError>
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        if self.workers == 0 {
            return Ok(f());
        }
        let pool = ThreadPoolBuilder::new().num_threads(self.workers).build()?;
        Ok(pool.install(f))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_on_default_and_sized_pools() {
        assert_eq!(WorkerPool::default().install(|| 2 + 2).ok(), Some(4));
        let threads = WorkerPool::with_workers(2)
            .install(rayon::current_num_threads)
            .expect("pool builds");
        assert_eq!(threads, 2);
    }
}
