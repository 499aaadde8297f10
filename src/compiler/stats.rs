//! Code installation statistics
//!
//! One [`CodeInstallStats`] per install category. Compiler threads update
//! them concurrently with independent atomic adds; readers may see a count
//! and a size from slightly different moments, but never a torn value.

use super::broker::InstalledCode;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Accumulates wall time across many start/stop pairs
#[derive(Debug, Default)]
pub struct ElapsedTimer {
    nanos: AtomicU64,
    intervals: AtomicU64,
}

impl ElapsedTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an interval; it is added when the guard drops
    pub fn start(&self) -> TimerGuard<'_> {
        TimerGuard {
            timer: self,
            started: Instant::now(),
        }
    }

    /// Add an externally measured interval
    pub fn add(&self, elapsed: Duration) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.fetch_add(nanos, Ordering::Relaxed);
        self.intervals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    pub fn seconds(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Number of completed intervals
    pub fn intervals(&self) -> u64 {
        self.intervals.load(Ordering::Relaxed)
    }
}

/// Running interval of an [`ElapsedTimer`]
#[must_use = "the interval ends when the guard is dropped"]
pub struct TimerGuard<'a> {
    timer: &'a ElapsedTimer,
    started: Instant,
}

impl TimerGuard<'_> {
    /// End the interval now
    pub fn stop(self) {}
}

impl Drop for TimerGuard<'_> {
    fn drop(&mut self) {
        self.timer.add(self.started.elapsed());
    }
}

/// Point-in-time copy of a [`CodeInstallStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InstallSnapshot {
    pub count: u64,
    pub total_size: u64,
    pub code_size: u64,
    pub elapsed: Duration,
}

impl InstallSnapshot {
    pub fn average_size(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total_size / self.count
        }
    }
}

/// Per-category install aggregate
#[derive(Debug, Default)]
pub struct CodeInstallStats {
    timer: ElapsedTimer,
    count: AtomicU64,
    code_blobs_size: AtomicU64,
    code_blobs_code_size: AtomicU64,
}

impl CodeInstallStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timer the caller runs around each install
    pub fn timer(&self) -> &ElapsedTimer {
        &self.timer
    }

    /// Record that `code` has just been installed in the code cache
    pub fn on_install(&self, code: &dyn InstalledCode) {
        self.count.fetch_add(1, Ordering::Relaxed);
        self.code_blobs_size
            .fetch_add(code.total_size() as u64, Ordering::Relaxed);
        self.code_blobs_code_size
            .fetch_add(code.code_size() as u64, Ordering::Relaxed);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> InstallSnapshot {
        InstallSnapshot {
            count: self.count(),
            total_size: self.code_blobs_size.load(Ordering::Relaxed),
            code_size: self.code_blobs_code_size.load(Ordering::Relaxed),
            elapsed: self.timer.elapsed(),
        }
    }

    /// Write a one-line summary prefixed with `prefix`
    pub fn print_on(&self, out: &mut dyn Write, prefix: &str) -> io::Result<()> {
        writeln!(out, "{}{}", prefix, self.snapshot())
    }
}

impl fmt::Display for InstallSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:7.3} s (installs: {}, CodeBlob total size: {}, CodeBlob code size: {}, avg size: {})",
            self.elapsed.as_secs_f64(),
            self.count,
            self.total_size,
            self.code_size,
            self.average_size()
        )
    }
}
