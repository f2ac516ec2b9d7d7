use std::time::{Duration, Instant};

/// Measures elapsed wall time in microseconds.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    start: Instant,
}

impl Stopwatch {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Microseconds since [`Stopwatch::start`].
    pub fn elapsed_micros(&self) -> u64 {
        self.start.elapsed().as_micros().min(u64::MAX as u128) as u64
    }

    /// Consume the stopwatch and return the elapsed microseconds.
    pub fn stop(self) -> u64 {
        self.elapsed_micros()
    }
}

/// Sleep the calling thread for whole seconds.
pub fn sleep_secs(seconds: u32) {
    std::thread::sleep(Duration::from_secs(seconds as u64));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stopwatch_is_monotonic() {
        let watch = Stopwatch::start();
        std::thread::sleep(Duration::from_millis(5));
        let first = watch.elapsed_micros();
        assert!(first >= 5_000);
        assert!(watch.stop() >= first);
    }
}
