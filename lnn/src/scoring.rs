use crate::dataset::Split;
use crate::net::OUTPUT_CELLS;
use std::fmt::Write;

/// Result of one example within a pass.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProgressEvent {
    pub split: Split,
    pub index: usize,
    pub predicted: usize,
    pub actual: usize,
    /// Mispredictions so far, including this example.
    pub error_count: usize,
    /// Examples processed so far, including this example.
    pub total: usize,
}

impl ProgressEvent {
    #[inline]
    pub fn is_correct(&self) -> bool {
        self.predicted == self.actual
    }

    pub fn success_rate(&self) -> f64 {
        1.0 - self.error_count as f64 / self.total as f64
    }
}

/// Outcome of a complete pass over one split.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct PassSummary {
    pub split: Split,
    pub errors: usize,
    pub total: usize,
}

impl PassSummary {
    pub fn error_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.errors as f64 / self.total as f64
        }
    }

    pub fn success_rate(&self) -> f64 {
        1.0 - self.error_rate()
    }
}

/// Receives the progress of training and testing passes.
pub trait Scorer {
    fn process_example(&mut self, event: &ProgressEvent);

    fn finish_pass(&mut self, _summary: &PassSummary) {}
}

pub struct NoOpScorer;

impl Scorer for NoOpScorer {
    #[inline]
    fn process_example(&mut self, _event: &ProgressEvent) {}
}

impl<S: Scorer + ?Sized> Scorer for &mut S {
    fn process_example(&mut self, event: &ProgressEvent) {
        (**self).process_example(event)
    }
    fn finish_pass(&mut self, summary: &PassSummary) {
        (**self).finish_pass(summary)
    }
}

impl<A: Scorer, B: Scorer> Scorer for (A, B) {
    fn process_example(&mut self, event: &ProgressEvent) {
        self.0.process_example(event);
        self.1.process_example(event);
    }
    fn finish_pass(&mut self, summary: &PassSummary) {
        self.0.finish_pass(summary);
        self.1.finish_pass(summary);
    }
}

/// Accumulates a confusion matrix indexed by `[actual][predicted]`.
#[derive(Clone, Debug, Default)]
pub struct MulticlassScorer {
    matrix: [[usize; OUTPUT_CELLS]; OUTPUT_CELLS],
    count: usize,
}

impl MulticlassScorer {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn matrix(&self) -> &[[usize; OUTPUT_CELLS]; OUTPUT_CELLS] {
        &self.matrix
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn total_correct(&self) -> usize {
        (0..OUTPUT_CELLS).map(|i| self.matrix[i][i]).sum()
    }

    pub fn report(&self) -> String {
        let mut out = String::from("Confusion Matrix (rows: actual, columns: predicted):\n");
        out.push_str("     ");
        for j in 0..OUTPUT_CELLS {
            let _ = write!(out, "{j:>6}");
        }
        out.push('\n');
        for (i, row) in self.matrix.iter().enumerate() {
            let total: usize = row.iter().sum();
            let _ = write!(out, "{i:>3}: ");
            for &e in row {
                let rate = if total == 0 { 0.0 } else { e as f64 / total as f64 };
                let _ = write!(out, "{rate:>6.3}");
            }
            out.push('\n');
        }
        let total_incorrect = self.count - self.total_correct();
        let percent_incorrect = if self.count == 0 {
            0.0
        } else {
            (total_incorrect as f64 / self.count as f64) * 100.0
        };
        let _ = write!(
            out,
            "Error rate: {percent_incorrect:.2}% ({total_incorrect}/{})",
            self.count
        );
        out
    }

    pub fn print_report(&self) {
        println!("{}", self.report());
    }
}

impl Scorer for MulticlassScorer {
    fn process_example(&mut self, event: &ProgressEvent) {
        if event.actual < OUTPUT_CELLS && event.predicted < OUTPUT_CELLS {
            self.matrix[event.actual][event.predicted] += 1;
            self.count += 1;
        }
    }
}
