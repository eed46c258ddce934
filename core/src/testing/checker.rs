use std::path::PathBuf;
use std::time::Duration;

use super::execution::{Execution, ExecutionOutcome};

/// Delimiter line between the three sections piped to a custom checker.
const IO_DELIM: &str = "---";

/// Custom checkers re-read doubled io, so they get extra time.
const CUSTOM_CHECKER_TIME_FACTOR: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckerVerdict {
    Accepted,
    WrongAnswer(String),
    CheckerRuntimeError,
    CheckerTimeLimitExceeded,
}

/// An external checker: its own source, compiled alongside the candidate,
/// and the resulting binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomChecker {
    pub source: PathBuf,
    pub binary: PathBuf,
}

/// Pluggable oracle deciding whether the candidate output is correct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Checker {
    Tokens,
    YesNo,
    Custom(CustomChecker),
}

impl Checker {
    /// One-character discriminant used for persistence.
    pub const fn short_name(&self) -> char {
        match self {
            Checker::Tokens => 't',
            Checker::YesNo => 'y',
            Checker::Custom(_) => 'c',
        }
    }

    pub fn custom(&self) -> Option<&CustomChecker> {
        match self {
            Checker::Custom(c) => Some(c),
            _ => None,
        }
    }

    pub async fn check(
        &self,
        exec: &Execution,
        input: &str,
        expected_output: &str,
        actual_output: &str,
        time_limit: Duration,
    ) -> anyhow::Result<CheckerVerdict> {
        match self {
            Checker::Tokens => Ok(check_tokens(expected_output, actual_output)),
            Checker::YesNo => Ok(check_yes_no(expected_output, actual_output)),
            Checker::Custom(checker) => {
                check_custom(checker, exec, input, expected_output, actual_output, time_limit)
                    .await
            }
        }
    }
}

/// Compares the whitespace-separated token sequences of the two outputs.
fn check_tokens(expected_output: &str, actual_output: &str) -> CheckerVerdict {
    let expected: Vec<&str> = expected_output.split_whitespace().collect();
    let actual: Vec<&str> = actual_output.split_whitespace().collect();

    if expected == actual {
        return CheckerVerdict::Accepted;
    }
    if expected.len() != actual.len() {
        return CheckerVerdict::WrongAnswer(format!(
            "Expected {} tokens, got {}",
            expected.len(),
            actual.len()
        ));
    }
    let i = expected
        .iter()
        .zip(&actual)
        .position(|(e, a)| e != a)
        .expect("unequal sequences of equal length have a divergence");
    CheckerVerdict::WrongAnswer(format!(
        "Expected \"{}\", got \"{}\" at token {}",
        expected[i],
        actual[i],
        i + 1
    ))
}

/// Case-insensitive yes/no comparison: every actual token must be yes or
/// no, then the lower-cased outputs are compared token-wise.
fn check_yes_no(expected_output: &str, actual_output: &str) -> CheckerVerdict {
    let actual_lower = actual_output.to_lowercase();
    for (i, token) in actual_lower.split_whitespace().enumerate() {
        if token != "yes" && token != "no" {
            return CheckerVerdict::WrongAnswer(format!(
                "Expected \"yes\"/\"no\", got \"{}\" at token {}",
                token,
                i + 1
            ));
        }
    }
    check_tokens(&expected_output.to_lowercase(), &actual_lower)
}

/// Pipes `input --- actual --- expected` to the external checker; an empty
/// stdout accepts, a nonempty stdout is the wrong-answer reason verbatim.
async fn check_custom(
    checker: &CustomChecker,
    exec: &Execution,
    input: &str,
    expected_output: &str,
    actual_output: &str,
    time_limit: Duration,
) -> anyhow::Result<CheckerVerdict> {
    let stdin = [input, actual_output, expected_output].join(&format!("\n{}\n", IO_DELIM));
    let outcome = exec
        .run(
            &checker.binary,
            &stdin,
            time_limit * CUSTOM_CHECKER_TIME_FACTOR,
        )
        .await?;

    Ok(match outcome {
        ExecutionOutcome::Success(output) if output.is_empty() => CheckerVerdict::Accepted,
        ExecutionOutcome::Success(output) => CheckerVerdict::WrongAnswer(output),
        ExecutionOutcome::RuntimeError => CheckerVerdict::CheckerRuntimeError,
        ExecutionOutcome::TimeLimitExceeded => CheckerVerdict::CheckerTimeLimitExceeded,
    })
}
