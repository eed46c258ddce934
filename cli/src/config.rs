use std::path::PathBuf;

use cpj_core::Config;
use serde::Deserialize;

use crate::util;

/// `CPJ_*` environment overrides applied on top of the repository config,
/// e.g. `CPJ_EDITOR='code --wait #{file}'`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvOverrides {
    pub editor: Option<String>,
    pub compiler: Option<String>,
    pub shell: Option<PathBuf>,
    pub time_limit_secs: Option<f64>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        envy::prefixed("CPJ_").from_env().unwrap_or_else(|e| {
            log::error!("Invalid CPJ_* environment variable: {:#}", e);
            std::process::exit(1)
        })
    }

    pub fn apply(self, mut cfg: Config) -> Config {
        let EnvOverrides {
            editor,
            compiler,
            shell,
            time_limit_secs,
        } = self;

        editor.map(|v| cfg.editor.command = v);
        compiler.map(|v| cfg.compiler.command = v);
        shell.map(|v| cfg.test.shell = v);
        time_limit_secs.map(|v| cfg.test.time_limit_secs = v);
        cfg
    }
}

/// Loads `cpj.toml` from the current dir or an ancestor and applies the
/// environment overrides.
pub fn load_config() -> anyhow::Result<Config> {
    let cfg = Config::from_file_finding_in_ancestors(util::current_dir())?;
    if let Some(path) = &cfg.source_config_file {
        log::info!(
            "Using config {}",
            util::replace_homedir_to_tilde(path).to_string_lossy()
        );
    }
    Ok(EnvOverrides::from_env().apply(cfg))
}
