use cpj_core::{action, print_success};

use super::{GlobalArgs, SubcmdResult};
use crate::{config, util};

/// Adds a user testcase, editing its input and output in the editor.
#[derive(Debug, clap::Args)]
pub struct Args {}

pub async fn exec(_args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config()?;
    let problem = action::problem_dir_here(util::current_dir())?;

    let id = action::do_add_testcase(&problem, &cfg).await?;
    print_success!("Added testcase {}", id);
    Ok(())
}
