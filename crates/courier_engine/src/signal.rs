use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use crate::surface::SurfaceError;

/// Shared pause/stop flags for one dispatch run.
///
/// Constructed per run and discarded at run end; mutated only by the control
/// plane, read by the worker at its polling checkpoints. This is the only
/// mutable state crossing the control/worker boundary.
#[derive(Debug, Default)]
pub struct RunSignal {
    paused: AtomicBool,
    stop: AtomicBool,
}

impl RunSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }
}

/// Result of a bounded wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waited<T> {
    Ready(T),
    TimedOut,
    /// Stop was requested before the condition held or the timeout passed.
    Interrupted,
}

/// Sleep `total` in `tick` slices, re-checking the stop flag every tick.
/// Returns false as soon as stop is requested, so stop latency is bounded by
/// the tick, never by the full duration.
pub fn interruptible_sleep(signal: &RunSignal, total: Duration, tick: Duration) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if signal.stop_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(tick.min(deadline - now));
    }
}

/// Bounded poll: run `probe` every `interval` until it yields a value, the
/// timeout passes, or stop is requested. The probe always runs at least once,
/// so a zero timeout means a single check.
pub fn wait_until<T>(
    signal: &RunSignal,
    timeout: Duration,
    interval: Duration,
    mut probe: impl FnMut() -> Result<Option<T>, SurfaceError>,
) -> Result<Waited<T>, SurfaceError> {
    let deadline = Instant::now() + timeout;
    loop {
        if signal.stop_requested() {
            return Ok(Waited::Interrupted);
        }
        if let Some(value) = probe()? {
            return Ok(Waited::Ready(value));
        }
        if Instant::now() >= deadline {
            return Ok(Waited::TimedOut);
        }
        thread::sleep(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn interruptible_sleep_runs_to_completion_without_stop() {
        let signal = RunSignal::new();
        let start = Instant::now();
        assert!(interruptible_sleep(
            &signal,
            Duration::from_millis(30),
            Duration::from_millis(5)
        ));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn sleep_is_cut_short_by_stop() {
        let signal = Arc::new(RunSignal::new());
        let stopper = signal.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            stopper.request_stop();
        });
        let start = Instant::now();
        let completed =
            interruptible_sleep(&signal, Duration::from_secs(10), Duration::from_millis(5));
        handle.join().unwrap();
        assert!(!completed);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn wait_until_zero_timeout_probes_exactly_once() {
        let signal = RunSignal::new();
        let mut probes = 0;
        let waited = wait_until(&signal, Duration::ZERO, Duration::from_millis(1), || {
            probes += 1;
            Ok(None::<()>)
        })
        .unwrap();
        assert_eq!(waited, Waited::TimedOut);
        assert_eq!(probes, 1);
    }

    #[test]
    fn wait_until_reports_interruption() {
        let signal = RunSignal::new();
        signal.request_stop();
        let waited = wait_until(&signal, Duration::from_secs(5), Duration::from_millis(1), || {
            Ok(Some(()))
        })
        .unwrap();
        assert_eq!(waited, Waited::Interrupted);
    }
}
