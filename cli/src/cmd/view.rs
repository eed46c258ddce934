use cpj_core::action;

use super::{GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Testcase ids to view; all when omitted
    #[arg()]
    pub ids: Vec<usize>,
}

pub async fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let problem = action::problem_dir_here(util::current_dir())?;
    action::do_view_testcases(&problem, &args.ids).await
}
