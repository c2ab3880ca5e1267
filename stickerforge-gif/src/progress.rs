//! Console progress reporting with elapsed time

use std::time::Instant;

/// Prints fractional progress to stdout at a fixed percentage granularity.
///
/// Fractions are clamped to `[0, 1]`; one printer phase corresponds to one
/// conversion attempt, and `start_phase` relabels the printer and restarts
/// its clock for the next attempt.
pub struct ProgressPrinter {
    label: String,
    start: Instant,
    last_percent: i64,
    step: i64,
}

impl ProgressPrinter {
    /// Creates a printer that reports roughly every `step` percent.
    pub fn new(label: &str, step: u8) -> Self {
        Self {
            label: label.to_string(),
            start: Instant::now(),
            last_percent: -1,
            step: i64::from(step.max(1)),
        }
    }

    /// Relabels the printer and restarts its clock.
    pub fn start_phase(&mut self, label: &str) {
        self.label = label.to_string();
        self.start = Instant::now();
        self.last_percent = -1;
    }

    /// Records fractional progress, printing when it has advanced enough.
    pub fn update(&mut self, fraction: f64) {
        let percent = (fraction.clamp(0.0, 1.0) * 100.0).floor() as i64;
        let due = self.last_percent < 0
            || percent >= self.last_percent + self.step
            || (percent == 100 && self.last_percent != 100);
        if !due {
            return;
        }
        self.last_percent = percent;
        println!(
            "  {} {}% - elapsed: {}",
            self.label,
            percent,
            format_duration(self.start.elapsed().as_secs_f64()),
        );
    }
}

/// Formats seconds into a human-readable duration string
fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        let mins = (secs / 60.0).floor();
        format!("{}m {:.0}s", mins, secs - mins * 60.0)
    } else {
        let hours = (secs / 3600.0).floor();
        let rest = secs - hours * 3600.0;
        let mins = (rest / 60.0).floor();
        format!("{}h {}m {:.0}s", hours, mins, rest - mins * 60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_format_across_scales() {
        assert_eq!(format_duration(3.25), "3.2s");
        assert_eq!(format_duration(95.0), "1m 35s");
        assert_eq!(format_duration(3723.0), "1h 2m 3s");
    }

    #[test]
    fn update_throttles_to_the_step() {
        let mut printer = ProgressPrinter::new("test", 10);
        printer.update(0.0);
        assert_eq!(printer.last_percent, 0);
        printer.update(0.05);
        assert_eq!(printer.last_percent, 0); // below the step, not recorded
        printer.update(0.5);
        assert_eq!(printer.last_percent, 50);
        printer.update(1.0);
        assert_eq!(printer.last_percent, 100);
    }

    #[test]
    fn start_phase_resets_the_baseline() {
        let mut printer = ProgressPrinter::new("one", 5);
        printer.update(1.0);
        printer.start_phase("two");
        assert_eq!(printer.last_percent, -1);
        printer.update(0.0);
        assert_eq!(printer.last_percent, 0);
    }
}
