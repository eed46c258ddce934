use super::{ArgTestCaseMode, GlobalArgs, SubcmdResult};
use crate::util;
use cpj_core::action;

/// Persists how testcases are judged: whole, or split into multitests.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(value_enum)]
    pub mode: ArgTestCaseMode,
}

pub async fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let problem = action::problem_dir_here(util::current_dir())?;
    let _ = action::do_set_mode(&problem, args.mode.into()).await?;
    Ok(())
}
