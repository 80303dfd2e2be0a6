//! 攝影機匯入主模組
//!
//! 負責終端機互動：取得輸入路徑、顯示進度、輸出最終結果

use super::import_state::ImportState;
use super::orchestrator::ImportOrchestrator;
use super::prompts::{ConsoleNotifier, PromptFolderChooser};
use super::report::ImportReport;
use super::transcoder::FfmpegTranscoder;
use crate::config::Config;
use anyhow::{Context, Result};
use console::style;
use crossbeam_channel::{Receiver, unbounded};
use dialoguer::Input;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::thread;
use std::time::Duration;

pub const NO_ROOTS_MESSAGE: &str = "No readable folder or volume was supplied.";

/// 進度條以千分比顯示
const PROGRESS_SCALE: u64 = 1000;

pub struct CamcorderImport {
    config: Config,
    cancel_signal: Arc<AtomicBool>,
}

impl CamcorderImport {
    #[must_use]
    pub const fn new(config: Config, cancel_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            cancel_signal,
        }
    }

    pub fn run(&self, roots: Vec<PathBuf>) -> Result<ImportReport> {
        if !self.config.json_report {
            println!("{}", style("=== Camcorder Import ===").cyan().bold());
        }

        let roots = if roots.is_empty() && self.config.interactive {
            self.prompt_roots()?
        } else {
            roots
        };

        let state = if roots.is_empty() {
            warn!("No input roots supplied");
            ImportState::Failed {
                message: NO_ROOTS_MESSAGE.to_string(),
            }
        } else {
            self.import(&roots)
        };

        let report = ImportReport::from_state(&state);
        if self.config.json_report {
            let json = serde_json::to_string_pretty(&report).context("Unable to encode report")?;
            println!("{json}");
        } else {
            print_summary(&state);
        }

        Ok(report)
    }

    fn import(&self, roots: &[PathBuf]) -> ImportState {
        let transcoder = FfmpegTranscoder::new(
            self.config.ffmpeg_path.clone(),
            self.config.ffprobe_path.clone(),
            self.config.progress_interval,
            Arc::clone(&self.cancel_signal),
        );
        let (tx, rx) = unbounded();

        let mut orchestrator = ImportOrchestrator::new(
            Box::new(transcoder),
            Box::new(PromptFolderChooser::new(self.config.interactive)),
            Box::new(ConsoleNotifier),
        )
        .with_output_base(self.config.output_base.clone())
        .with_observer(tx);

        let show_progress = !self.config.json_report;
        let renderer = thread::spawn(move || render_progress(&rx, show_progress));

        let state = match orchestrator.run(roots) {
            Ok(state) => state.clone(),
            Err(e) => ImportState::Failed {
                message: e.to_string(),
            },
        };

        // 關閉觀察通道，讓繪製執行緒結束
        drop(orchestrator);
        if renderer.join().is_err() {
            warn!("Progress renderer stopped unexpectedly");
        }

        state
    }

    fn prompt_roots(&self) -> Result<Vec<PathBuf>> {
        let answer: String = Input::new()
            .with_prompt("SD card or folder to import")
            .allow_empty(true)
            .interact_text()?;

        let answer = answer.trim();
        if answer.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![PathBuf::from(answer)])
    }
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|s| s.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

fn scaled(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * PROGRESS_SCALE as f64) as u64
}

/// 依狀態快照繪製進度；只有開始轉檔後才建立進度條，避免干擾掃描期間的提問
fn render_progress(rx: &Receiver<ImportState>, show_progress: bool) {
    let multi = MultiProgress::new();
    let mut bars: Option<(ProgressBar, ProgressBar)> = None;

    for state in rx {
        if !show_progress {
            continue;
        }

        match &state {
            ImportState::Scanning => {
                println!("{}", style(state.status_detail()).dim());
            }
            ImportState::Converting { clip_progress, .. } => {
                let (overall, clip) = bars.get_or_insert_with(|| {
                    let overall = multi.add(ProgressBar::new(PROGRESS_SCALE));
                    overall.set_style(bar_style(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent:>3}% {msg}",
                    ));
                    overall.enable_steady_tick(Duration::from_millis(120));
                    let clip = multi.add(ProgressBar::new(PROGRESS_SCALE));
                    clip.set_style(bar_style("  [{bar:40.green/white}] {msg}"));
                    (overall, clip)
                });
                overall.set_message(state.status_title());
                overall.set_position(scaled(state.overall_progress()));
                clip.set_message(state.progress_detail());
                clip.set_position(scaled(*clip_progress));
            }
            _ => {}
        }
    }

    if let Some((overall, clip)) = bars {
        clip.finish_and_clear();
        overall.finish_and_clear();
    }
}

fn print_summary(state: &ImportState) {
    println!();
    match state {
        ImportState::Completed { .. } => {
            println!("{}", style(state.status_title()).green().bold());
            println!("  {}", state.status_detail());
            if let Some(summary) = state.error_summary() {
                println!();
                println!("{}", style(summary).yellow());
            }
            info!(
                "Import summary - succeeded: {}, failed: {}",
                state.success_count(),
                state.errors().len()
            );
        }
        _ => {
            println!("{}", style(state.status_title()).red().bold());
            println!("  {}", state.status_detail());
        }
    }
}
