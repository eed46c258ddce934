use cpj_core::{action, style, testing::TestCaseMode};

use super::{GlobalArgs, SubcmdResult};
use crate::{config, progress::ConsoleProgress, util};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Judge each multitest subtest independently
    #[arg(short, long)]
    pub multitests: bool,

    /// Judge every testcase as one unit, whatever the persisted mode says
    #[arg(long, conflicts_with = "multitests")]
    pub one: bool,

    /// Time limit in seconds (defaults to the problem's one)
    #[arg(short, long)]
    pub time_limit: Option<f64>,
}

pub async fn exec(args: &Args, _global_args: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config()?;
    let problem = action::problem_dir_here(util::current_dir())?;

    let mode_override = if args.multitests {
        Some(TestCaseMode::Multiple)
    } else if args.one {
        Some(TestCaseMode::One)
    } else {
        None
    };

    let sink = ConsoleProgress::new();
    let report = action::do_judge(&problem, &cfg, mode_override, args.time_limit, &sink).await?;
    sink.finish();

    style::print_run_report(&report);
    Ok(())
}
