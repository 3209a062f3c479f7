use std::time::{Duration, Instant};

/// Monotonic time source driving the session loop. Timestamps are
/// nanoseconds since an arbitrary per-source epoch and never decrease.
pub trait Clock: Send + Sync {
    fn now_ns(&self) -> u64;
    fn elapsed(&self, ts_ns: u64) -> Duration;
    fn sleep(&self, d: Duration);
}

/// `Instant`-anchored clock with a platform high-precision sleep for
/// frame pacing.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject,
        };

        unsafe {
            if let Ok(timer) = CreateWaitableTimerW(None, true, None) {
                // negative due time = relative, in 100 ns intervals
                let due_time = -(duration.as_nanos() as i64 / 100);

                if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                    WaitForSingleObject(timer, u32::MAX);
                }

                let _ = CloseHandle(timer);
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};
        use std::thread;

        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            thread::sleep(duration);
        }
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn elapsed(&self, ts_ns: u64) -> Duration {
        Duration::from_nanos(self.now_ns().saturating_sub(ts_ns))
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Rolling tick-interval statistics for the presentation loop. Boundary
/// markers coalesce if ticks arrive slower than the session's cadence
/// contract, so the loop watches its own intervals here.
#[derive(Debug, Clone)]
pub struct CadenceMonitor {
    intervals: Vec<Duration>,
    max_samples: usize,
    last_tick_ns: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct CadenceStats {
    pub average_tick_ns: f64,
    pub jitter_ns: f64,
    pub min_tick_ns: f64,
    pub max_tick_ns: f64,
    pub effective_hz: f64,
}

impl CadenceMonitor {
    pub fn new(max_samples: usize) -> Self {
        Self {
            intervals: Vec::with_capacity(max_samples),
            max_samples,
            last_tick_ns: None,
        }
    }

    /// Records one tick and returns the interval since the previous one.
    pub fn record_tick(&mut self, now_ns: u64) -> Option<Duration> {
        let interval = self
            .last_tick_ns
            .map(|last| Duration::from_nanos(now_ns.saturating_sub(last)));
        self.last_tick_ns = Some(now_ns);

        if let Some(d) = interval {
            if self.intervals.len() >= self.max_samples {
                self.intervals.remove(0);
            }
            self.intervals.push(d);
        }
        interval
    }

    pub fn stats(&self) -> CadenceStats {
        let times: Vec<f64> = self
            .intervals
            .iter()
            .map(|d| d.as_nanos() as f64)
            .collect();
        if times.is_empty() {
            return CadenceStats {
                average_tick_ns: 0.0,
                jitter_ns: 0.0,
                min_tick_ns: 0.0,
                max_tick_ns: 0.0,
                effective_hz: 0.0,
            };
        }
        let sum: f64 = times.iter().sum();
        let avg = sum / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let jitter = var.sqrt();
        let min = *times
            .iter()
            .min_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap();
        let max = *times
            .iter()
            .max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap();
        CadenceStats {
            average_tick_ns: avg,
            jitter_ns: jitter,
            min_tick_ns: min,
            max_tick_ns: max,
            effective_hz: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}
