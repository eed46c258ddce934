use strum::Display;

/// Verdict of one compile task. `Compiling` is the transient in-flight state
/// shown by progress sinks; the final states are `Success` and
/// `CompilationError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum CompileVerdict {
    #[strum(serialize = "compiling")]
    Compiling,
    #[strum(serialize = "OK")]
    Success,
    #[strum(serialize = "CE")]
    CompilationError,
}

impl CompileVerdict {
    pub fn is_final(self) -> bool {
        self != CompileVerdict::Compiling
    }
}

/// Verdict of one run unit: the union of execution and checker outcomes,
/// plus the transient `Running` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum RunVerdict {
    #[strum(serialize = "running")]
    Running,
    #[strum(serialize = "AC")]
    Accepted,
    #[strum(serialize = "WA")]
    WrongAnswer,
    #[strum(serialize = "RTE")]
    RuntimeError,
    #[strum(serialize = "TLE")]
    TimeLimitExceeded,
    #[strum(serialize = "checker RTE")]
    CheckerRuntimeError,
    #[strum(serialize = "checker TLE")]
    CheckerTimeLimitExceeded,
}

impl RunVerdict {
    pub fn is_accepted(self) -> bool {
        self == RunVerdict::Accepted
    }

    pub fn is_final(self) -> bool {
        self != RunVerdict::Running
    }
}
