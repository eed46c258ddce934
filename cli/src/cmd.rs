pub mod add;
pub mod checker;
pub mod init;
pub mod judge;
pub mod mode;
pub mod multitest;
pub mod new;
pub mod rm;
pub mod run;
pub mod view;

use cpj_core::testing::{IoFile, TestCaseMode};

#[derive(Debug, clap::Parser)]
#[command(author, version, about, long_about = None)]
pub struct GlobalArgs {
    #[command(subcommand)]
    pub subcmd: Subcommand,
}

#[derive(Debug, clap::Subcommand)]
pub enum Subcommand {
    Init(init::Args),
    New(new::Args),
    Add(add::Args),
    Rm(rm::Args),
    View(view::Args),
    Multitest(multitest::Args),
    Mode(mode::Args),
    Checker(checker::Args),

    #[command(alias("t"))]
    Judge(judge::Args),

    #[command(alias("r"))]
    Run(run::Args),
}

pub type SubcmdResult = anyhow::Result<()>;

impl GlobalArgs {
    pub async fn exec_subcmd(&self) -> SubcmdResult {
        use Subcommand::*;
        match &self.subcmd {
            Init(args) => init::exec(args, self),
            New(args) => new::exec(args, self).await,
            Add(args) => add::exec(args, self).await,
            Rm(args) => rm::exec(args, self).await,
            View(args) => view::exec(args, self).await,
            Multitest(args) => multitest::exec(args, self).await,
            Mode(args) => mode::exec(args, self).await,
            Checker(args) => checker::exec(args, self),
            Judge(args) => judge::exec(args, self).await,
            Run(args) => run::exec(args, self).await,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgTestCaseMode {
    One,
    Multiple,
}

impl From<ArgTestCaseMode> for TestCaseMode {
    fn from(value: ArgTestCaseMode) -> Self {
        match value {
            ArgTestCaseMode::One => TestCaseMode::One,
            ArgTestCaseMode::Multiple => TestCaseMode::Multiple,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgIoFile {
    Input,
    Output,
}

impl From<ArgIoFile> for IoFile {
    fn from(value: ArgIoFile) -> Self {
        match value {
            ArgIoFile::Input => IoFile::Input,
            ArgIoFile::Output => IoFile::Output,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
#[clap(rename_all = "lower")]
pub enum ArgChecker {
    Tokens,
    Yesno,
    Custom,
}

impl ArgChecker {
    pub fn discriminant(self) -> char {
        match self {
            ArgChecker::Tokens => 't',
            ArgChecker::Yesno => 'y',
            ArgChecker::Custom => 'c',
        }
    }
}
