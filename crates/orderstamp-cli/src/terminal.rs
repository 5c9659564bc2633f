//! Terminal stand-ins for the desktop dialogs and the overwrite confirmation.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use async_trait::async_trait;
use orderstamp::bridge::{Dialogs, FileFilter};
use orderstamp::OverwritePrompt;

fn ask(question: &str) -> Option<String> {
    let mut stdout = std::io::stdout();
    write!(stdout, "{} ", question).ok()?;
    stdout.flush().ok()?;

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).ok()?;
    let answer = line.trim();
    if answer.is_empty() {
        None
    } else {
        Some(answer.to_string())
    }
}

/// Asks on stdin before replacing a file. `--yes` answers for the operator.
pub struct StdinPrompt {
    pub assume_yes: bool,
}

impl OverwritePrompt for StdinPrompt {
    fn confirm_overwrite(&self, filename: &str, folder: &str) -> bool {
        if self.assume_yes {
            return true;
        }
        let question = format!("File {} already exists in {}. Overwrite? [y/N]", filename, folder);
        matches!(
            ask(&question).as_deref().map(str::to_lowercase).as_deref(),
            Some("y") | Some("yes")
        )
    }
}

/// Reads a path from stdin. An empty line cancels.
pub struct TerminalDialogs;

#[async_trait]
impl Dialogs for TerminalDialogs {
    async fn select_folder(&self) -> Option<PathBuf> {
        tokio::task::spawn_blocking(|| ask("Folder path:").map(PathBuf::from))
            .await
            .ok()
            .flatten()
    }

    async fn select_file(&self, filters: &[FileFilter]) -> Option<PathBuf> {
        let filters = filters.to_vec();
        tokio::task::spawn_blocking(move || {
            let names: Vec<&str> = filters.iter().map(|f| f.name.as_str()).collect();
            let path = PathBuf::from(ask(&format!("File path ({}):", names.join(", ")))?);
            if filters.is_empty() || filters.iter().any(|f| f.matches(&path)) {
                Some(path)
            } else {
                eprintln!("{} does not match {}", path.display(), names.join(", "));
                None
            }
        })
        .await
        .ok()
        .flatten()
    }
}
