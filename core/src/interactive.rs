use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use async_trait::async_trait;
use tokio::process::Command;

use crate::config::EditorConfig;
use crate::storage::{ContentHandle, FsStore};
use crate::testing::{IoFile, MultitestEditor};

pub mod util {
    use dialoguer::{theme::ColorfulTheme, Confirm};
    use std::io;

    fn theme() -> ColorfulTheme {
        ColorfulTheme::default()
    }

    pub fn ask_confirm(prompt: &str, default: bool) -> io::Result<bool> {
        Confirm::with_theme(&theme())
            .with_prompt(prompt)
            .default(default)
            .interact()
    }
}

pub fn confirm_remove_testcase(id: usize) -> bool {
    util::ask_confirm(&format!("Delete testcase {}?", id), false).unwrap_or(false)
}

pub fn confirm_edit_multitest(testcase_id: usize, io: IoFile, already_valid: bool) -> bool {
    let prompt = if already_valid {
        format!(
            "Multitest {} of testcase {} is already split correctly. Edit anyway?",
            io, testcase_id
        )
    } else {
        format!("Edit the multitest {} of testcase {}?", io, testcase_id)
    };
    util::ask_confirm(&prompt, !already_valid).unwrap_or(false)
}

/// Opens `filepath` in the configured editor and waits until it exits.
pub async fn edit_file(editor: &EditorConfig, shell: &Path, filepath: &Path) -> anyhow::Result<()> {
    let cmd = editor.edit_command(filepath)?;
    log::info!("Editing: {}", cmd);

    let status = Command::new(shell)
        .args(["-c", &cmd])
        .status()
        .await
        .with_context(|| format!("Failed to spawn '{} -c {}'", shell.to_string_lossy(), cmd))?;
    if !status.success() {
        bail!("Editor exited with failure: {}", cmd);
    }
    Ok(())
}

/// Text-editor collaborator backed by the configured editor command and a
/// filesystem store.
pub struct ShellEditor {
    editor: EditorConfig,
    shell: PathBuf,
    store: FsStore,
}

impl ShellEditor {
    pub fn new(editor: EditorConfig, shell: impl Into<PathBuf>, store: FsStore) -> Self {
        Self {
            editor,
            shell: shell.into(),
            store,
        }
    }
}

#[async_trait]
impl MultitestEditor for ShellEditor {
    async fn edit(&self, handle: &ContentHandle) -> anyhow::Result<()> {
        edit_file(&self.editor, &self.shell, &self.store.filepath(handle)).await
    }
}
