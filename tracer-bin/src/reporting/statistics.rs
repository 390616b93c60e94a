use std::fmt::{Display, Formatter, Result as FmtResult};
use std::time::Duration;
use tracer_trace::Trace;

pub fn fmt_duration(d: &Duration) -> String {
    if d.as_secs() >= 5 {
        let s: f64 = d.as_secs() as f64 + (d.subsec_millis() as f64 / 1000.0);
        format!("{:.3}s", s)
    } else {
        format!("{}ms", (d.as_secs() * 1000) + (d.subsec_millis() as u64))
    }
}

pub fn fmt_size(s: u64) -> String {
    let magnitudes = &["B", "KB", "MB", "GB"];
    let max_magnitude = magnitudes.len() - 1;
    let mut total = s as f64;
    let mut cur_magnitude = 0;
    while total > 1024.0 && cur_magnitude < max_magnitude {
        total /= 1024.0;
        cur_magnitude += 1;
    }
    if cur_magnitude == 0 {
        format!("{:.0}{}", total, magnitudes[cur_magnitude])
    } else {
        format!("{:.1}{}", total, magnitudes[cur_magnitude])
    }
}

/// One-line account of the body transfer for the log.
pub struct TransferSummary<'a> {
    trace: &'a Trace,
}

impl<'a> TransferSummary<'a> {
    pub fn new(trace: &'a Trace) -> TransferSummary<'a> {
        TransferSummary { trace }
    }
}

impl<'a> Display for TransferSummary<'a> {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "Total transferred: {}", fmt_size(self.trace.total_bytes()))?;
        if let Some(d) = self.trace.duration() {
            write!(f, " in {}", fmt_duration(&d))?;
        }
        if let Some(rate) = self.trace.throughput() {
            write!(f, " ({:.3} kB/s)", rate / 1024.0)?;
        }
        if let Some(peak) = self.trace.peak_second() {
            write!(f, ", peak {}/s", fmt_size(peak))?;
        }
        Ok(())
    }
}
