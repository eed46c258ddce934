use cpj_core::{action, print_success};
use std::path::PathBuf;

use super::{GlobalArgs, SubcmdResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[arg(default_value = "./")]
    dir: PathBuf,
}

pub fn exec(args: &Args, _: &GlobalArgs) -> SubcmdResult {
    action::init_repository(&args.dir)?;
    print_success!(
        "Successfully initialized cpj repository. (path: {})",
        args.dir.to_string_lossy()
    );
    Ok(())
}
