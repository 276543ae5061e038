//! Progress reporting and cooperative cancellation

use crate::{PdfError, Result};
use std::sync::atomic::{AtomicBool, Ordering};

/// Highest value reported before a job has actually finished
const MAX_RUNNING: u32 = 99;

/// Percentage reporter handed to every operation
///
/// Reports are clamped to `[0, 99]` and never go backwards; only
/// [`Progress::finish`] emits `100`. Each report is also a cancellation point:
/// once the flag is raised the next report fails with [`PdfError::Cancelled`]
/// and nothing more is emitted.
#[derive(Default)]
pub struct Progress<'a> {
    sink: Option<&'a mut (dyn FnMut(u8) + 'a)>,
    cancel: Option<&'a AtomicBool>,
    last: Option<u8>,
}

impl<'a> Progress<'a> {
    /// A reporter that emits nothing and is never cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// A reporter that forwards percentages to `sink`
    pub fn with_sink(sink: &'a mut (dyn FnMut(u8) + 'a)) -> Self {
        Self {
            sink: Some(sink),
            cancel: None,
            last: None,
        }
    }

    /// Observe `flag` as the cancellation signal
    pub fn cancel_on(mut self, flag: &'a AtomicBool) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Fail with [`PdfError::Cancelled`] if cancellation was requested
    pub fn check(&self) -> Result<()> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(PdfError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Report an absolute percentage
    pub fn report(&mut self, percent: u32) -> Result<()> {
        self.check()?;
        let value = percent.min(MAX_RUNNING) as u8;
        self.emit(value);
        Ok(())
    }

    /// Report `start + round(done / total * span)`
    ///
    /// Used inside per-page and per-file loops.
    pub fn report_step(&mut self, start: u32, span: u32, done: usize, total: usize) -> Result<()> {
        let fraction = if total == 0 {
            1.0
        } else {
            done.min(total) as f64 / total as f64
        };
        self.report(start + (fraction * span as f64).round() as u32)
    }

    /// Report completion
    pub fn finish(&mut self) -> Result<()> {
        self.check()?;
        self.emit(100);
        Ok(())
    }

    /// Last emitted value, if any
    pub fn last(&self) -> Option<u8> {
        self.last
    }

    fn emit(&mut self, value: u8) {
        if self.last.is_some_and(|last| value <= last) {
            return;
        }
        self.last = Some(value);
        if let Some(sink) = self.sink.as_mut() {
            sink(value);
        }
    }
}

impl std::fmt::Debug for Progress<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("last", &self.last)
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_reports_are_clamped_and_monotonic() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u8| seen.push(p);
            let mut progress = Progress::with_sink(&mut sink);
            progress.report(0).unwrap();
            progress.report(30).unwrap();
            progress.report(20).unwrap();
            progress.report(30).unwrap();
            progress.report(150).unwrap();
            progress.finish().unwrap();
        }
        assert_eq!(seen, vec![0, 30, 99, 100]);
    }

    #[test]
    fn test_report_step() {
        let mut seen = Vec::new();
        {
            let mut sink = |p: u8| seen.push(p);
            let mut progress = Progress::with_sink(&mut sink);
            for i in 0..3 {
                progress.report_step(20, 60, i + 1, 3).unwrap();
            }
        }
        assert_eq!(seen, vec![40, 60, 80]);
    }

    #[test]
    fn test_report_step_empty_total() {
        let mut progress = Progress::new();
        progress.report_step(10, 80, 0, 0).unwrap();
        assert_eq!(progress.last(), Some(90));
    }

    #[test]
    fn test_cancellation_stops_reports() {
        let flag = AtomicBool::new(false);
        let mut seen = Vec::new();
        {
            let mut sink = |p: u8| seen.push(p);
            let mut progress = Progress::with_sink(&mut sink).cancel_on(&flag);
            progress.report(10).unwrap();
            flag.store(true, Ordering::Relaxed);
            assert!(matches!(progress.report(20), Err(PdfError::Cancelled)));
            assert!(matches!(progress.finish(), Err(PdfError::Cancelled)));
        }
        assert_eq!(seen, vec![10]);
    }

    #[test]
    fn test_silent_progress() {
        let mut progress = Progress::new();
        assert_eq!(progress.last(), None);
        progress.report(42).unwrap();
        progress.finish().unwrap();
        assert_eq!(progress.last(), Some(100));
    }
}
