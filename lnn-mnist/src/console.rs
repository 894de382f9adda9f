use lnn::scoring::{PassSummary, ProgressEvent, Scorer};
use log::warn;
use std::io::Write;

/// Writes pass progress to a terminal, refreshing a single line every `every` examples.
pub struct ConsoleScorer<W: Write> {
    out: W,
    every: usize,
    failed: bool,
}

impl<W: Write> ConsoleScorer<W> {
    /// `every == 0` only prints the pass summaries.
    pub fn new(out: W, every: usize) -> Self {
        ConsoleScorer {
            out,
            every,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, args: std::fmt::Arguments<'_>) {
        let res = self.out.write_fmt(args).and_then(|_| self.out.flush());
        if let Err(err) = res {
            if !self.failed {
                warn!("failed to write progress: {err}");
            }
            self.failed = true;
        }
    }
}

impl<W: Write> Scorer for ConsoleScorer<W> {
    fn process_example(&mut self, event: &ProgressEvent) {
        if self.every == 0 || event.total % self.every != 0 {
            return;
        }
        self.write(format_args!(
            "\r    {:<8} {:>6} images   Prediction: {}   Actual: {}   Success rate: {:>6.2}%",
            event.split,
            event.total,
            event.predicted,
            event.actual,
            event.success_rate() * 100.0
        ));
    }

    fn finish_pass(&mut self, summary: &PassSummary) {
        let lead = if self.every == 0 { "" } else { "\n" };
        self.write(format_args!(
            "{lead}    {} done: {} of {} images mispredicted, success rate {:.2}%\n",
            summary.split,
            summary.errors,
            summary.total,
            summary.success_rate() * 100.0
        ));
    }
}
