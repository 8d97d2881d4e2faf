// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress bookkeeping for one task.

use burner_core::BurnAction;
use std::time::{Duration, Instant};

/// Elapsed time under which an average rate is too noisy to report.
const MIN_AVERAGE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Default)]
pub(crate) struct Progress {
    started: Option<Instant>,
    /// Fraction reported directly by a job; wins over byte counts
    fraction: Option<f64>,
    /// Bytes of the tracks already finished in this task
    finished_bytes: u64,
    written: u64,
    rate: Option<u64>,
    use_average: bool,
    total: Option<u64>,
    pub(crate) action: BurnAction,
    pub(crate) label: Option<String>,
    pub(crate) dangerous: bool,
}

impl Progress {
    pub(crate) fn is_started(&self) -> bool {
        self.started.is_some()
    }

    pub(crate) fn start(&mut self, now: Instant, total: Option<u64>) {
        if self.started.is_none() {
            self.started = Some(now);
        }
        self.total = total.filter(|t| *t > 0).or(self.total);
    }

    /// Forget everything except the current action.
    pub(crate) fn reset(&mut self) {
        let action = self.action;
        let label = self.label.take();
        *self = Self { action, label, ..Self::default() };
    }

    pub(crate) fn set_fraction(&mut self, fraction: f64) {
        self.fraction = Some(fraction.clamp(0.0, 1.0));
    }

    pub(crate) fn set_rate(&mut self, rate: u64) {
        self.rate = Some(rate);
    }

    pub(crate) fn set_use_average(&mut self, value: bool) {
        self.use_average = value;
    }

    pub(crate) fn set_written_track(&mut self, bytes: u64) {
        self.written = self.finished_bytes + bytes;
    }

    pub(crate) fn set_written_session(&mut self, bytes: u64) {
        self.written = bytes;
    }

    /// The current track is done; later track counts start from here.
    pub(crate) fn next_track(&mut self) {
        self.finished_bytes = self.written;
    }

    pub(crate) fn written(&self) -> u64 {
        self.written
    }

    pub(crate) fn fraction(&self) -> Option<f64> {
        self.fraction.or_else(|| {
            let total = self.total?;
            Some((self.written as f64 / total as f64).clamp(0.0, 1.0))
        })
    }

    /// Bytes per second: the reported rate, or the average since start.
    pub(crate) fn rate(&self, now: Instant) -> Option<u64> {
        match (self.use_average, self.rate) {
            (false, Some(rate)) => Some(rate),
            _ => self.average_rate(now),
        }
    }

    pub(crate) fn average_rate(&self, now: Instant) -> Option<u64> {
        let elapsed = now.checked_duration_since(self.started?)?;
        if elapsed < MIN_AVERAGE_WINDOW || self.written == 0 {
            return None;
        }
        Some((self.written as f64 / elapsed.as_secs_f64()) as u64)
    }

    pub(crate) fn remaining(&self, now: Instant) -> Option<Duration> {
        let rate = self.rate(now).filter(|r| *r > 0)?;
        match self.total {
            Some(total) => {
                Some(Duration::from_secs(total.saturating_sub(self.written) / rate))
            }
            // Extrapolate from the reported fraction
            None => {
                let fraction = self.fraction.filter(|f| *f > 0.0)?;
                let total = self.written as f64 / fraction;
                Some(Duration::from_secs_f64((total - self.written as f64).max(0.0) / rate as f64))
            }
        }
    }
}

#[cfg(test)]
#[path = "progress_tests.rs"]
mod tests;
