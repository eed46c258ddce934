use std::path::PathBuf;

use cpj_core::{action, print_success};

use super::{ArgChecker, GlobalArgs, SubcmdResult};
use crate::config;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Problem name; the problem dir is created under the current dir
    #[arg()]
    pub name: String,

    /// Dir with already-scraped samples stored as 1.in/1.out, 2.in/2.out, ...
    #[arg(short, long)]
    pub samples: Option<PathBuf>,

    /// Time limit in seconds (defaults to the configured one)
    #[arg(short, long)]
    pub time_limit: Option<f64>,

    #[arg(short, long, value_enum, default_value_t = ArgChecker::Tokens)]
    pub checker: ArgChecker,
}

pub async fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let cfg = config::load_config()?;

    let samples = match &args.samples {
        Some(dir) => action::read_samples_dir(dir)?,
        None => Vec::new(),
    };
    let time_limit = args.time_limit.unwrap_or(cfg.test.time_limit_secs);

    let problem = action::new_problem(
        crate::util::current_dir().join(&args.name),
        &args.name,
        time_limit,
        args.checker.discriminant(),
        &samples,
    )
    .await?;

    print_success!(
        "Successfully created problem {} (path: {})",
        args.name,
        problem.dir().to_string_lossy()
    );
    Ok(())
}
