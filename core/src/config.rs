use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::result::Result as StdResult;
use std::time::Duration;

use anyhow::Context as _;
use rust_embed::RustEmbed;
use serde::Deserialize;

use crate::serdable::GlobPattern;
use crate::str_interp::{interp, InterpError};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(skip)]
    pub source_config_file: Option<PathBuf>,
    pub test: TestConfig,
    pub compiler: CompilerConfig,
    pub editor: EditorConfig,
    pub terminal: TerminalConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TestConfig {
    pub shell: PathBuf,
    /// Glob selecting the candidate source file in the problem dir.
    pub include: GlobPattern,
    /// Default time limit, used when the problem metadata has none.
    pub time_limit_secs: f64,
}

impl TestConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_secs_f64(self.time_limit_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompilerConfig {
    /// Compile command template with `#{src}` and `#{out}` placeholders.
    pub command: String,
}

impl CompilerConfig {
    pub fn compile_command(&self, src: &Path, out: &Path) -> StdResult<String, InterpError> {
        let mut vars: HashMap<&'static str, &OsStr> = HashMap::new();
        vars.insert("src", src.as_os_str());
        vars.insert("out", out.as_os_str());
        interp(&self.command, &vars)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EditorConfig {
    /// Editor command template with a `#{file}` placeholder. Must block
    /// until the user closes the editor.
    pub command: String,
}

impl EditorConfig {
    pub fn edit_command(&self, file: &Path) -> StdResult<String, InterpError> {
        let mut vars: HashMap<&'static str, &OsStr> = HashMap::new();
        vars.insert("file", file.as_os_str());
        interp(&self.command, &vars)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TerminalConfig {
    /// Command template launching an interactive terminal session running
    /// `#{bin}` (custom invocation).
    pub command: String,
}

impl TerminalConfig {
    pub fn launch_command(&self, bin: &Path) -> StdResult<String, InterpError> {
        let mut vars: HashMap<&'static str, &OsStr> = HashMap::new();
        vars.insert("bin", bin.as_os_str());
        interp(&self.command, &vars)
    }
}

#[derive(RustEmbed)]
#[folder = "assets/"]
struct Asset;

impl Config {
    pub const FILENAME: &str = "cpj.toml";

    pub fn example_toml() -> String {
        let file = Asset::get(Self::FILENAME).unwrap();
        std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
    }

    pub fn from_toml(s: &str) -> StdResult<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn from_toml_file(filepath: PathBuf) -> anyhow::Result<Self> {
        let toml = fsutil::read_to_string(&filepath).context("Cannot read a file")?;
        let mut cfg = Self::from_toml(&toml)
            .with_context(|| format!("Invalid config TOML: {:?}", filepath))?;
        cfg.source_config_file = Some(filepath);
        Ok(cfg)
    }

    /// Find config file in ancestor dirs, including current dir.
    pub fn find_file_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<PathBuf> {
        let cur_dir = cur_dir.as_ref();
        cur_dir
            .ancestors()
            .map(|dir| dir.join(Self::FILENAME))
            .find(|path| path.is_file())
            .with_context(|| {
                format!(
                    "Not in a cpj-repository dir: Cannot find '{}'",
                    Self::FILENAME
                )
            })
    }

    pub fn from_file_finding_in_ancestors(cur_dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let config_filepath = Config::find_file_in_ancestors(cur_dir)?;
        Self::from_toml_file(config_filepath)
    }
}

/// Base file templates written on problem initialization.
pub fn template_main_cpp() -> String {
    let file = Asset::get("template/main.cpp").unwrap();
    std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
}

pub fn template_checker_cpp() -> String {
    let file = Asset::get("template/checker.cpp").unwrap();
    std::str::from_utf8(file.data.as_ref()).unwrap().to_owned()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn example_toml_should_be_parsable() {
        let toml = Config::example_toml();
        let cfg = Config::from_toml(&toml).unwrap();

        let Config {
            source_config_file,
            test,
            compiler,
            editor,
            terminal,
        } = cfg;

        assert_eq!(source_config_file, None);
        assert_eq!(test.shell, Path::new("/bin/sh"));
        assert_eq!(test.include, GlobPattern::parse("[mM]ain.cpp").unwrap());
        assert_eq!(test.time_limit_secs, 1.0);
        assert!(compiler.command.contains("#{src}"));
        assert!(compiler.command.contains("#{out}"));
        assert!(editor.command.contains("#{file}"));
        assert!(terminal.command.contains("#{bin}"));
    }

    #[test]
    fn compile_command_interpolation() {
        let compiler = CompilerConfig {
            command: "g++-13 -std=c++20 #{src} -o #{out}".to_owned(),
        };
        let cmd = compiler
            .compile_command(Path::new("a/main.cpp"), Path::new("a/main.out"))
            .unwrap();
        assert_eq!(cmd, "g++-13 -std=c++20 a/main.cpp -o a/main.out");
    }

    #[test]
    fn templates_should_be_embedded() {
        assert!(template_main_cpp().contains("int main()"));
        assert!(template_checker_cpp().contains("---"));
    }
}
