use super::orchestrator::{FolderChooser, Notifier};
use crate::error::OutputError;
use console::style;
use dialoguer::Input;
use log::{info, warn};
use std::path::PathBuf;

/// 以終端機提示詢問另一個輸出位置；非互動模式一律放棄
pub struct PromptFolderChooser {
    interactive: bool,
}

impl PromptFolderChooser {
    #[must_use]
    pub const fn new(interactive: bool) -> Self {
        Self { interactive }
    }
}

impl FolderChooser for PromptFolderChooser {
    fn choose_output_base(&self, reason: &OutputError) -> Option<PathBuf> {
        if !self.interactive {
            warn!("Cannot ask for another output folder in non-interactive mode");
            return None;
        }

        eprintln!("{} {reason}", style("Output folder unavailable:").yellow().bold());
        let answer: String = Input::new()
            .with_prompt("Choose another output folder (leave empty to cancel)")
            .allow_empty(true)
            .interact_text()
            .ok()?;

        let answer = answer.trim();
        if answer.is_empty() {
            None
        } else {
            Some(PathBuf::from(answer))
        }
    }
}

/// 完成通知寫到 stderr，stdout 留給 JSON 報告
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, summary: &str) {
        info!("Camcorder import finished: {summary}");
        eprintln!("{} {summary}", style("Camcorder import finished.").green().bold());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_interactive_chooser_declines() {
        let chooser = PromptFolderChooser::new(false);
        assert_eq!(
            chooser.choose_output_base(&OutputError::CannotLocateDefaultBase),
            None
        );
    }
}
