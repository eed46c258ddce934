use std::time::Duration;

use cpj_core::style;
use cpj_core::testing::{CompileVerdict, ProgressSink, RunVerdict};
use indicatif::{ProgressBar, ProgressStyle};

/// Renders runner progress as one spinner line of colored verdict
/// brackets, e.g. `[m c] [1 2 3 3]`.
pub struct ConsoleProgress {
    bar: ProgressBar,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::new_spinner().with_style(
            ProgressStyle::default_spinner()
                .template("{spinner} {msg}")
                .unwrap(),
        );
        bar.enable_steady_tick(Duration::from_millis(50));
        Self { bar }
    }

    /// Clears the spinner line so the final report starts clean.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_compile_progress(&self, compile: &[CompileVerdict], run_total: usize) {
        self.bar.set_message(format!(
            "{} compiling, {} runs pending",
            style::compile_bracket_line(compile),
            run_total,
        ));
    }

    fn on_run_progress(
        &self,
        compile: &[CompileVerdict],
        runs: &[RunVerdict],
        unit_ids: &[String],
    ) {
        self.bar.set_message(format!(
            "{} {} running",
            style::compile_bracket_line(compile),
            style::run_bracket_line(runs, unit_ids),
        ));
    }
}
