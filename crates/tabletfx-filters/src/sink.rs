//! Downstream emission.
//!
//! The stage hands each consumed report to a [`ReportSink`] exactly once.

use crate::report::DeviceReport;
use crossbeam::channel::Sender;
use tracing::warn;

/// The next stage of the pipeline.
pub trait ReportSink {
    /// Accept one report.
    fn emit(&mut self, report: DeviceReport);
}

impl ReportSink for Vec<DeviceReport> {
    fn emit(&mut self, report: DeviceReport) {
        self.push(report);
    }
}

/// Adapts a closure into a sink.
///
/// ```
/// use tabletfx_filters::{DeviceReport, FnSink, ReportSink};
///
/// let mut count = 0;
/// let mut sink = FnSink(|_report: DeviceReport| count += 1);
/// sink.emit(DeviceReport::at(1.0, 1.0));
/// drop(sink);
/// assert_eq!(count, 1);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnSink<F>(pub F);

impl<F: FnMut(DeviceReport)> ReportSink for FnSink<F> {
    fn emit(&mut self, report: DeviceReport) {
        (self.0)(report);
    }
}

/// A disconnected receiver drops the report with a warning.
impl ReportSink for Sender<DeviceReport> {
    fn emit(&mut self, report: DeviceReport) {
        if self.send(report).is_err() {
            warn!("Downstream receiver disconnected, dropping report");
        }
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn emit(&mut self, report: DeviceReport) {
        (**self).emit(report);
    }
}
