use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context as _};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::testing::{Checker, CustomChecker, TestCaseKind, TestCaseMode};

use super::store::FsStore;

pub const PROBLEM_METADATA_FILENAME: &str = ".problem.json";
pub const TESTCASE_DIR_NAME: &str = "testcase";

const CHECKER_SOURCE_FILENAME: &str = "checker.cpp";
const CHECKER_BINARY_FILENAME: &str = "checker.out";
const MAIN_TEMPLATE_FILENAME: &str = "main.cpp";

/// Persisted problem metadata: everything needed to reconstruct the
/// testcase set and judge settings offline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProblemMeta {
    pub name: String,
    pub time_limit_secs: f64,
    /// One-character checker discriminant: 't', 'y' or 'c'.
    pub checker: char,
    pub mode: TestCaseMode,
    /// Kinds of the testcases, in id order.
    pub testcases: Vec<TestCaseKind>,
    pub fetched_at: DateTime<Local>,
}

impl ProblemMeta {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_secs)
    }
}

/// Layout of one problem directory.
#[derive(Debug, Clone)]
pub struct ProblemDir {
    dir: PathBuf,
}

impl ProblemDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn metadata_filepath(&self) -> PathBuf {
        self.dir.join(PROBLEM_METADATA_FILENAME)
    }

    pub fn testcase_dir(&self) -> PathBuf {
        self.dir.join(TESTCASE_DIR_NAME)
    }

    /// Content store rooted at the testcase dir.
    pub fn store(&self) -> FsStore {
        FsStore::new(self.testcase_dir())
    }

    pub fn main_template_filepath(&self) -> PathBuf {
        self.dir.join(MAIN_TEMPLATE_FILENAME)
    }

    pub fn checker_source(&self) -> PathBuf {
        self.dir.join(CHECKER_SOURCE_FILENAME)
    }

    pub fn checker_binary(&self) -> PathBuf {
        self.dir.join(CHECKER_BINARY_FILENAME)
    }

    pub fn exists(&self) -> bool {
        self.metadata_filepath().is_file()
    }

    pub fn save_meta(&self, meta: &ProblemMeta) -> anyhow::Result<()> {
        fsutil::write_json_with_mkdir(self.metadata_filepath(), meta)
            .context("Failed to save problem metadata")?;
        Ok(())
    }

    pub fn load_meta(&self) -> anyhow::Result<ProblemMeta> {
        let meta = fsutil::read_json_with_deserialize(self.metadata_filepath())
            .context("Failed to load problem metadata")?;
        Ok(meta)
    }

    /// Rebuilds the checker from its persisted discriminant.
    pub fn checker(&self, meta: &ProblemMeta) -> anyhow::Result<Checker> {
        Ok(match meta.checker {
            't' => Checker::Tokens,
            'y' => Checker::YesNo,
            'c' => Checker::Custom(CustomChecker {
                source: self.checker_source(),
                binary: self.checker_binary(),
            }),
            other => bail!("Unknown checker discriminant '{}'", other),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn metadata_roundtrip_keeps_the_checker_discriminant() {
        let dir = std::env::temp_dir().join(format!("cpj-problem-test-{}", std::process::id()));
        let problem = ProblemDir::new(&dir);

        let meta = ProblemMeta {
            name: "A. Theatre Square".to_owned(),
            time_limit_secs: 2.0,
            checker: 'y',
            mode: TestCaseMode::Multiple,
            testcases: vec![TestCaseKind::Scraped, TestCaseKind::UserAdded],
            fetched_at: Local::now(),
        };
        problem.save_meta(&meta).unwrap();
        assert!(problem.exists());

        let loaded = problem.load_meta().unwrap();
        assert_eq!(loaded, meta);
        assert_eq!(loaded.time_limit(), Duration::from_secs_f64(2.0));
        assert_eq!(problem.checker(&loaded).unwrap(), Checker::YesNo);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn custom_checker_points_into_the_problem_dir() {
        let problem = ProblemDir::new("/work/contests/1234/a");
        let meta = ProblemMeta {
            name: "B".to_owned(),
            time_limit_secs: 1.0,
            checker: 'c',
            mode: TestCaseMode::One,
            testcases: vec![],
            fetched_at: Local::now(),
        };
        let checker = problem.checker(&meta).unwrap();
        let custom = checker.custom().unwrap();
        assert_eq!(custom.source, Path::new("/work/contests/1234/a/checker.cpp"));
        assert_eq!(custom.binary, Path::new("/work/contests/1234/a/checker.out"));

        let bad = ProblemMeta { checker: 'x', ..meta };
        assert!(problem.checker(&bad).is_err());
    }
}
