use cpj_core::{action, print_success};

use super::{ArgChecker, GlobalArgs, SubcmdResult};
use crate::util;

/// Persists which checker judges this problem.
#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(value_enum)]
    pub checker: ArgChecker,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    let problem = action::problem_dir_here(util::current_dir())?;
    action::do_set_checker(&problem, args.checker.discriminant())?;
    print_success!("Set checker to {:?}", args.checker);
    Ok(())
}
