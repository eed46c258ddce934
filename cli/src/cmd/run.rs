use cpj_core::action;

use super::{GlobalArgs, SubcmdResult};
use crate::{config, util};

/// Custom invocation: compile the candidate and run it in an interactive
/// terminal session.
#[derive(Debug, clap::Args)]
pub struct Args {}

pub async fn exec(_args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config()?;
    action::do_custom_invocation(&util::current_dir(), &cfg).await
}
