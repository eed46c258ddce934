use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Context as _;
use tokio::sync::mpsc;

use crate::config::CompilerConfig;
use crate::storage::ContentStore;

use super::checker::{Checker, CheckerVerdict};
use super::execution::{CompileOutcome, Execution, ExecutionOutcome};
use super::testcase::{RunUnit, TestCaseMode, TestCaseSet};
use super::verdict::{CompileVerdict, RunVerdict};

/// Receiver of live progress snapshots. The runner emits one compile
/// snapshot per finished compile task and one run snapshot per finished run
/// unit; in-flight entries show as `Compiling` / `Running`.
pub trait ProgressSink: Send + Sync {
    fn on_compile_progress(&self, compile: &[CompileVerdict], run_total: usize);
    fn on_run_progress(&self, compile: &[CompileVerdict], runs: &[RunVerdict], unit_ids: &[String]);
}

/// Sink that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl ProgressSink for SilentSink {
    fn on_compile_progress(&self, _: &[CompileVerdict], _: usize) {}
    fn on_run_progress(&self, _: &[CompileVerdict], _: &[RunVerdict], _: &[String]) {}
}

/// One source file to compile and where its binary goes.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub source: PathBuf,
    pub binary: PathBuf,
}

impl Artifact {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        let source: PathBuf = source.into();
        let binary = source.with_extension("out");
        Self {
            name: name.into(),
            source,
            binary,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompileReport {
    pub artifacts: Vec<String>,
    pub verdicts: Vec<CompileVerdict>,
}

impl CompileReport {
    pub fn success(&self) -> bool {
        self.verdicts
            .iter()
            .all(|&v| v == CompileVerdict::Success)
    }

    pub fn failed_artifacts(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .zip(&self.verdicts)
            .filter(|(_, &v)| v == CompileVerdict::CompilationError)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Judged outcome of one run unit, kept in original testcase/sub-id order.
#[derive(Debug, Clone)]
pub struct UnitReport {
    pub display_id: String,
    pub verdict: RunVerdict,
    pub input: String,
    pub expected_output: String,
    pub actual_output: String,
    pub wrong_answer_reason: String,
}

#[derive(Debug, Clone)]
pub struct RunPhaseReport {
    pub units: Vec<UnitReport>,
    /// The first non-accepted verdict in completion order, or Accepted.
    /// Which failing unit becomes representative is scheduler-dependent.
    pub overall: RunVerdict,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub compile: CompileReport,
    /// `None` iff compilation failed; no unit is ever judged then.
    pub run: Option<RunPhaseReport>,
    pub elapsed: Duration,
}

/// Orchestrates one judging run: a concurrent compile phase over at most
/// two artifacts, then one concurrent task per run unit.
#[derive(Debug, Clone)]
pub struct Runner {
    exec: Execution,
    compiler: CompilerConfig,
    checker: Checker,
    time_limit: Duration,
}

impl Runner {
    pub fn new(compiler: CompilerConfig, checker: Checker, time_limit: Duration) -> Self {
        Self {
            exec: Execution::new(),
            compiler,
            checker,
            time_limit,
        }
    }

    pub fn shell(mut self, shell: impl Into<PathBuf>) -> Self {
        self.exec = self.exec.shell(shell);
        self
    }

    pub fn get_checker(&self) -> &Checker {
        &self.checker
    }

    /// Judges the whole set. MULTIPLE mode requires every scraped testcase
    /// to pass its multitest check beforehand.
    pub async fn run(
        &self,
        set: &TestCaseSet,
        mode: TestCaseMode,
        candidate: Artifact,
        store: &dyn ContentStore,
        sink: &dyn ProgressSink,
    ) -> anyhow::Result<RunReport> {
        let start = Instant::now();
        let units = set.run_units(mode, store).await?;

        let candidate_binary = candidate.binary.clone();
        let mut artifacts = vec![candidate];
        if let Some(custom) = self.checker.custom() {
            artifacts.push(Artifact {
                name: "checker".to_owned(),
                source: custom.source.clone(),
                binary: custom.binary.clone(),
            });
        }

        let compile_verdicts = self.compile_phase(&artifacts, units.len(), sink).await?;
        let compile = CompileReport {
            artifacts: artifacts.into_iter().map(|a| a.name).collect(),
            verdicts: compile_verdicts,
        };

        if !compile.success() {
            return Ok(RunReport {
                compile,
                run: None,
                elapsed: start.elapsed(),
            });
        }

        let run = self
            .run_phase(&units, &candidate_binary, &compile.verdicts, sink)
            .await?;

        Ok(RunReport {
            compile,
            run: Some(run),
            elapsed: start.elapsed(),
        })
    }

    /// Ad hoc single-artifact compile (custom invocation). The caller hands
    /// the binary to an interactive terminal only on `Success`.
    pub async fn custom_invocation(&self, artifact: &Artifact) -> anyhow::Result<CompileVerdict> {
        let outcome = self
            .exec
            .compile(&artifact.source, &artifact.binary, &self.compiler)
            .await?;
        Ok(match outcome {
            CompileOutcome::Success => CompileVerdict::Success,
            CompileOutcome::CompilationError => CompileVerdict::CompilationError,
        })
    }

    async fn compile_phase(
        &self,
        artifacts: &[Artifact],
        run_total: usize,
        sink: &dyn ProgressSink,
    ) -> anyhow::Result<Vec<CompileVerdict>> {
        let mut verdicts = vec![CompileVerdict::Compiling; artifacts.len()];
        let (tx, mut rx) = mpsc::unbounded_channel();

        for (index, artifact) in artifacts.iter().enumerate() {
            let exec = self.exec.clone();
            let compiler = self.compiler.clone();
            let artifact = artifact.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let verdict = match exec
                    .compile(&artifact.source, &artifact.binary, &compiler)
                    .await
                {
                    Ok(CompileOutcome::Success) => CompileVerdict::Success,
                    Ok(CompileOutcome::CompilationError) => CompileVerdict::CompilationError,
                    Err(e) => {
                        log::warn!("Failed to compile '{}': {:#}", artifact.name, e);
                        CompileVerdict::CompilationError
                    }
                };
                // each task reports its own index exactly once
                let _ = tx.send((index, verdict));
            });
        }
        drop(tx);

        for _ in 0..artifacts.len() {
            let (index, verdict) = rx
                .recv()
                .await
                .context("Compile task finished without reporting")?;
            verdicts[index] = verdict;
            sink.on_compile_progress(&verdicts, run_total);
        }
        Ok(verdicts)
    }

    async fn run_phase(
        &self,
        units: &[RunUnit],
        candidate_binary: &std::path::Path,
        compile_verdicts: &[CompileVerdict],
        sink: &dyn ProgressSink,
    ) -> anyhow::Result<RunPhaseReport> {
        let unit_ids: Vec<String> = units.iter().map(|u| u.display_id.clone()).collect();
        let mut verdicts = vec![RunVerdict::Running; units.len()];
        let mut actual_outputs = vec![String::new(); units.len()];
        let mut wrong_answer_reasons = vec![String::new(); units.len()];

        let (tx, mut rx) = mpsc::unbounded_channel();

        for (index, unit) in units.iter().enumerate() {
            let exec = self.exec.clone();
            let checker = self.checker.clone();
            let time_limit = self.time_limit;
            let unit = unit.clone();
            let binary = candidate_binary.to_owned();
            let tx = tx.clone();
            tokio::spawn(async move {
                let (verdict, actual, reason) =
                    judge_unit(&exec, &checker, &binary, &unit, time_limit).await;
                let _ = tx.send((index, verdict, actual, reason));
            });
        }
        drop(tx);

        // the first non-accepted verdict in completion order wins
        let mut overall = RunVerdict::Accepted;
        for _ in 0..units.len() {
            let (index, verdict, actual, reason) = rx
                .recv()
                .await
                .context("Run task finished without reporting")?;
            verdicts[index] = verdict;
            actual_outputs[index] = actual;
            wrong_answer_reasons[index] = reason;
            if verdict != RunVerdict::Accepted && overall == RunVerdict::Accepted {
                overall = verdict;
            }
            sink.on_run_progress(compile_verdicts, &verdicts, &unit_ids);
        }

        let unit_reports = units
            .iter()
            .enumerate()
            .map(|(i, unit)| UnitReport {
                display_id: unit.display_id.clone(),
                verdict: verdicts[i],
                input: unit.input.clone(),
                expected_output: unit.expected_output.clone(),
                actual_output: std::mem::take(&mut actual_outputs[i]),
                wrong_answer_reason: std::mem::take(&mut wrong_answer_reasons[i]),
            })
            .collect();

        Ok(RunPhaseReport {
            units: unit_reports,
            overall,
        })
    }
}

/// Judges one unit: run the candidate, then (on success) ask the checker.
/// Infrastructure failures degrade to per-unit verdicts so sibling units
/// keep running.
async fn judge_unit(
    exec: &Execution,
    checker: &Checker,
    binary: &std::path::Path,
    unit: &RunUnit,
    time_limit: Duration,
) -> (RunVerdict, String, String) {
    let outcome = match exec.run(binary, &unit.input, time_limit).await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("Failed to run unit {}: {:#}", unit.display_id, e);
            return (RunVerdict::RuntimeError, String::new(), String::new());
        }
    };

    let actual_output = match outcome {
        ExecutionOutcome::RuntimeError => {
            return (RunVerdict::RuntimeError, String::new(), String::new())
        }
        ExecutionOutcome::TimeLimitExceeded => {
            return (RunVerdict::TimeLimitExceeded, String::new(), String::new())
        }
        ExecutionOutcome::Success(output) => output,
    };

    let checker_verdict = match checker
        .check(
            exec,
            &unit.input,
            &unit.expected_output,
            &actual_output,
            time_limit,
        )
        .await
    {
        Ok(verdict) => verdict,
        Err(e) => {
            log::warn!("Checker failed on unit {}: {:#}", unit.display_id, e);
            return (RunVerdict::CheckerRuntimeError, actual_output, String::new());
        }
    };

    match checker_verdict {
        CheckerVerdict::Accepted => (RunVerdict::Accepted, actual_output, String::new()),
        CheckerVerdict::WrongAnswer(reason) => (RunVerdict::WrongAnswer, actual_output, reason),
        CheckerVerdict::CheckerRuntimeError => {
            (RunVerdict::CheckerRuntimeError, actual_output, String::new())
        }
        CheckerVerdict::CheckerTimeLimitExceeded => (
            RunVerdict::CheckerTimeLimitExceeded,
            actual_output,
            String::new(),
        ),
    }
}

#[cfg(test)]
mod test {
    use super::super::execution::test_util::script;
    use super::*;
    use crate::storage::MemStore;
    use crate::testing::checker::CustomChecker;
    use crate::testing::testcase::TestCaseKind;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        compile_snapshots: Mutex<Vec<Vec<CompileVerdict>>>,
        run_snapshots: Mutex<Vec<Vec<RunVerdict>>>,
    }

    impl ProgressSink for RecordingSink {
        fn on_compile_progress(&self, compile: &[CompileVerdict], _run_total: usize) {
            self.compile_snapshots.lock().unwrap().push(compile.to_vec());
        }

        fn on_run_progress(
            &self,
            _compile: &[CompileVerdict],
            runs: &[RunVerdict],
            _unit_ids: &[String],
        ) {
            self.run_snapshots.lock().unwrap().push(runs.to_vec());
        }
    }

    /// "Compiles" a shell-script candidate by copying it (the mode bits
    /// come along).
    fn copy_compiler() -> CompilerConfig {
        CompilerConfig {
            command: "cp #{src} #{out}".to_owned(),
        }
    }

    async fn user_set(ios: &[(&str, &str)]) -> (TestCaseSet, MemStore) {
        let store = MemStore::new();
        let mut set = TestCaseSet::default();
        for (input, output) in ios {
            set.add(TestCaseKind::UserAdded, input, output, &store)
                .await
                .unwrap();
        }
        (set, store)
    }

    fn cleanup(artifact: &Artifact) {
        let _ = std::fs::remove_file(&artifact.source);
        let _ = std::fs::remove_file(&artifact.binary);
    }

    #[tokio::test]
    async fn end_to_end_echo_candidate_accepts_everything() {
        let (set, store) = user_set(&[("1 2 3\n", "1 2 3\n"), ("hi\n", "hi\n")]).await;
        let candidate = Artifact::new("main", script("echo-cand", "exec cat"));
        let runner = Runner::new(copy_compiler(), Checker::Tokens, Duration::from_secs(1));
        let sink = RecordingSink::default();

        let report = runner
            .run(&set, TestCaseMode::One, candidate.clone(), &store, &sink)
            .await
            .unwrap();

        assert!(report.compile.success());
        let run = report.run.unwrap();
        assert_eq!(run.overall, RunVerdict::Accepted);
        assert_eq!(run.units.len(), 2);
        assert_eq!(run.units[0].display_id, "1");
        assert_eq!(run.units[1].display_id, "2");
        assert!(run.units.iter().all(|u| u.verdict == RunVerdict::Accepted));

        // one snapshot per compile task and per run unit
        assert_eq!(sink.compile_snapshots.lock().unwrap().len(), 1);
        assert_eq!(sink.run_snapshots.lock().unwrap().len(), 2);
        cleanup(&candidate);
    }

    #[tokio::test]
    async fn compile_failure_prevents_the_run_phase() {
        let (set, store) = user_set(&[("x\n", "x\n")]).await;
        let candidate = Artifact::new("main", script("ce-cand", "exit 0"));
        let compiler = CompilerConfig {
            command: "false #{src} #{out}".to_owned(),
        };
        let runner = Runner::new(compiler, Checker::Tokens, Duration::from_secs(1));
        let sink = RecordingSink::default();

        let report = runner
            .run(&set, TestCaseMode::One, candidate.clone(), &store, &sink)
            .await
            .unwrap();

        assert!(!report.compile.success());
        assert_eq!(report.compile.failed_artifacts(), vec!["main"]);
        assert!(report.run.is_none());
        assert!(sink.run_snapshots.lock().unwrap().is_empty());
        cleanup(&candidate);
    }

    #[tokio::test]
    async fn overall_verdict_is_one_of_the_failing_verdicts() {
        let (set, store) = user_set(&[
            ("1\n", "1\n"),
            ("2\n", "2\n"),
            ("3\n", "3\n"),
            ("4\n", "4\n"),
        ])
        .await;
        let candidate = Artifact::new(
            "main",
            script(
                "mixed-cand",
                r#"read x
if [ "$x" = 2 ]; then exit 7; fi
if [ "$x" = 3 ]; then exec sleep 5; fi
echo "$x""#,
            ),
        );
        let runner = Runner::new(copy_compiler(), Checker::Tokens, Duration::from_millis(300));
        let sink = RecordingSink::default();

        let report = runner
            .run(&set, TestCaseMode::One, candidate.clone(), &store, &sink)
            .await
            .unwrap();
        let run = report.run.unwrap();

        // per-unit verdicts are in original order regardless of completion
        // order
        assert_eq!(run.units[0].verdict, RunVerdict::Accepted);
        assert_eq!(run.units[1].verdict, RunVerdict::RuntimeError);
        assert_eq!(run.units[2].verdict, RunVerdict::TimeLimitExceeded);
        assert_eq!(run.units[3].verdict, RunVerdict::Accepted);

        // the representative failure is whichever failing unit finished
        // first; assert membership, not identity
        assert!(matches!(
            run.overall,
            RunVerdict::RuntimeError | RunVerdict::TimeLimitExceeded
        ));
        cleanup(&candidate);
    }

    #[tokio::test]
    async fn wrong_answer_carries_reason_and_outputs() {
        let (set, store) = user_set(&[("x\n", "1 2 3\n")]).await;
        let candidate = Artifact::new("main", script("wa-cand", "echo 1 5 3"));
        let runner = Runner::new(copy_compiler(), Checker::Tokens, Duration::from_secs(1));

        let report = runner
            .run(&set, TestCaseMode::One, candidate.clone(), &store, &SilentSink)
            .await
            .unwrap();
        let run = report.run.unwrap();

        assert_eq!(run.overall, RunVerdict::WrongAnswer);
        let unit = &run.units[0];
        assert_eq!(unit.verdict, RunVerdict::WrongAnswer);
        assert_eq!(unit.actual_output, "1 5 3\n");
        assert_eq!(unit.wrong_answer_reason, "Expected \"2\", got \"5\" at token 2");
        cleanup(&candidate);
    }

    #[tokio::test]
    async fn custom_checker_is_compiled_and_consulted() {
        let (set, store) = user_set(&[("1\n", "COMPLETELY DIFFERENT\n")]).await;
        let candidate = Artifact::new("main", script("cc-cand", "exec cat"));
        let checker_source = script("cc-chk", "exit 0"); // accepts everything
        let checker = Checker::Custom(CustomChecker {
            binary: checker_source.with_extension("out"),
            source: checker_source.clone(),
        });
        let runner = Runner::new(copy_compiler(), checker, Duration::from_secs(1));
        let sink = RecordingSink::default();

        let report = runner
            .run(&set, TestCaseMode::One, candidate.clone(), &store, &sink)
            .await
            .unwrap();

        // candidate and checker both compile, each with its own snapshot
        assert_eq!(report.compile.artifacts, vec!["main", "checker"]);
        assert_eq!(sink.compile_snapshots.lock().unwrap().len(), 2);

        // the token checker would reject this output; the custom checker
        // accepted it
        assert_eq!(report.run.unwrap().overall, RunVerdict::Accepted);

        let _ = std::fs::remove_file(checker_source.with_extension("out"));
        let _ = std::fs::remove_file(checker_source);
        cleanup(&candidate);
    }
}
