use cpj_core::{action, print_success};

use super::{GlobalArgs, SubcmdResult};
use crate::util;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Id of the testcase to delete (scraped testcases cannot be deleted)
    #[arg()]
    pub id: usize,
}

pub async fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let problem = action::problem_dir_here(util::current_dir())?;

    if action::do_remove_testcase(&problem, args.id).await? {
        print_success!("Deleted testcase {}", args.id);
    }
    Ok(())
}
