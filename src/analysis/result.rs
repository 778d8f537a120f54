//! Sampling step result types

use serde::{Deserialize, Serialize};

/// Summary of one completed sampling step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    /// Step index that was just sampled (`0..buffer_length`)
    pub step_index: usize,

    /// Whether this step completed the temporal window
    /// (`step_index == buffer_length − 1`)
    pub window_complete: bool,

    /// Whether any normalized value reached 1.0 under the factors in effect
    /// at the start of the step; only evaluated while calibrating
    pub clipping: bool,
}

/// What a call to advance the pipeline did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Sampling is disabled; nothing happened
    Disabled,
    /// Capture could not supply samples; nothing was written and the step
    /// cursor did not move
    Skipped,
    /// Samples were written and observers notified
    Sampled(StepReport),
}

impl StepOutcome {
    /// The step report, if samples were written
    pub fn report(&self) -> Option<StepReport> {
        match self {
            StepOutcome::Sampled(report) => Some(*report),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_accessor() {
        let report = StepReport {
            step_index: 3,
            window_complete: true,
            clipping: false,
        };
        assert_eq!(StepOutcome::Sampled(report).report(), Some(report));
        assert_eq!(StepOutcome::Skipped.report(), None);
        assert_eq!(StepOutcome::Disabled.report(), None);
    }

    #[test]
    fn test_report_serializes() {
        let report = StepReport {
            step_index: 1,
            window_complete: false,
            clipping: true,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"step_index\":1"));
        let back: StepReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
