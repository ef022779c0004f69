//! Per-epoch loss/accuracy bookkeeping.

use std::fmt;

#[cfg(feature = "serde")]
use serde::Serialize;

/// Raw totals from one pass over a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepOutcome {
    /// Sum of squared residuals over every sample.
    pub loss: f32,
    /// Samples whose predicted class matched the label.
    pub hits: usize,
}

/// Normalized loss and accuracy, one entry per completed epoch.
///
/// `err` and `acc` always have the same length: they only grow through
/// [`ExecutionStats::push`].
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExecutionStats {
    err: Vec<f32>,
    acc: Vec<f32>,
}

impl ExecutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `loss / data_len` and `hits / data_len`.
    ///
    /// Panics if `data_len == 0`.
    pub fn push(&mut self, outcome: StepOutcome, data_len: usize) {
        assert!(data_len > 0, "data_len must be > 0");
        let n = data_len as f32;
        self.err.push(outcome.loss / n);
        self.acc.push(outcome.hits as f32 / n);
    }

    #[inline]
    pub fn err(&self) -> &[f32] {
        &self.err
    }

    #[inline]
    pub fn acc(&self) -> &[f32] {
        &self.acc
    }

    /// Number of recorded epochs.
    #[inline]
    pub fn len(&self) -> usize {
        self.err.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.err.is_empty()
    }

    /// Most recent `(err, acc)` pair.
    pub fn last(&self) -> Option<(f32, f32)> {
        Some((*self.err.last()?, *self.acc.last()?))
    }
}

impl fmt::Display for ExecutionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Err: {:?}\t Acc: {:?}", self.err, self.acc)
    }
}

/// Which dataset a set of statistics belongs to.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Train,
    Test,
}

impl Phase {
    pub const ALL: [Phase; 2] = [Phase::Train, Phase::Test];

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Train => "train",
            Phase::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics for a whole training run.
#[cfg_attr(feature = "serde", derive(Serialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainReport {
    pub train: ExecutionStats,
    pub test: ExecutionStats,
}

impl TrainReport {
    pub fn phase(&self, phase: Phase) -> &ExecutionStats {
        match phase {
            Phase::Train => &self.train,
            Phase::Test => &self.test,
        }
    }

    /// Completed epochs.
    pub fn epochs(&self) -> usize {
        self.train.len()
    }
}
