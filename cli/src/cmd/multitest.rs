use super::{ArgIoFile, GlobalArgs, SubcmdResult};
use crate::{config, util};
use cpj_core::action;

/// Edits the multitest files of scraped testcases and re-validates them.
#[derive(Debug, clap::Args)]
pub struct Args {
    /// Restrict to one testcase id
    #[arg()]
    pub id: Option<usize>,

    /// Restrict to the input or output file
    #[arg(long, value_enum)]
    pub io: Option<ArgIoFile>,

    /// Skip files that are already split correctly
    #[arg(short, long)]
    pub necessary_only: bool,
}

pub async fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config()?;
    let problem = action::problem_dir_here(util::current_dir())?;

    action::do_edit_multitests(
        &problem,
        &cfg,
        args.id,
        args.io.map(Into::into),
        args.necessary_only,
    )
    .await
}
