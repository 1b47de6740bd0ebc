use tracing::debug;

/// Worker count shared by the thread/atomic and reduction backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadConfig {
    /// Number of worker threads. Defaults to the number of available CPUs.
    pub num_threads: usize,
}

impl ThreadConfig {
    /// A config with an explicit worker count, clamped to at least 1.
    pub fn with_threads(num_threads: usize) -> Self {
        ThreadConfig {
            num_threads: num_threads.max(1),
        }
    }

    /// Query the hardware concurrency.
    ///
    /// `num_cpus::get` already reports 1 when the count cannot be determined.
    pub fn detect() -> Self {
        let n = num_cpus::get();
        debug!(threads = n, "detected hardware concurrency");
        Self::with_threads(n)
    }
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self::detect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_threads_clamps() {
        assert_eq!(ThreadConfig::with_threads(0).num_threads, 1);
        assert_eq!(ThreadConfig::with_threads(6).num_threads, 6);
    }

    #[test]
    fn test_detect_is_positive() {
        assert!(ThreadConfig::default().num_threads >= 1);
    }

    #[test]
    fn test_detect_matches_cpu_count() {
        assert_eq!(ThreadConfig::detect().num_threads, num_cpus::get());
    }
}
