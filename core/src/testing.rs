pub mod checker;
pub mod execution;
pub mod runner;
pub mod testcase;
pub mod verdict;

pub use checker::{Checker, CheckerVerdict, CustomChecker};
pub use execution::{CompileOutcome, Execution, ExecutionOutcome};
pub use runner::{
    Artifact, CompileReport, ProgressSink, RunPhaseReport, RunReport, Runner, SilentSink,
    UnitReport,
};
pub use testcase::{
    IoFile, IoPair, MultitestEditor, MultitestSplit, RunUnit, TestCase, TestCaseKind,
    TestCaseMode, TestCaseSet, MULTITEST_HEADER,
};
pub use verdict::{CompileVerdict, RunVerdict};
