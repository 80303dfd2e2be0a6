use super::import_state::{ConversionError, ImportState};
use super::transcoder::Transcoder;
use crate::error::{ImportError, OutputError};
use crate::tools::{ClipInfo, ClipScanner, OutputPlanner, ScopedAccess, plan_destination};
use chrono::{Local, NaiveDate};
use crossbeam_channel::Sender;
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

pub const NO_CLIPS_MESSAGE: &str =
    "No AVCHD .MTS clips found. Look for AVCHD/BDMV/STREAM folders on the card.";
pub const NO_OUTPUT_SELECTED_MESSAGE: &str = "No output folder selected. Import cancelled.";

/// 預設輸出位置無法使用時，向使用者要另一個位置
pub trait FolderChooser {
    /// 回傳 `None` 表示使用者放棄
    fn choose_output_base(&self, reason: &OutputError) -> Option<PathBuf>;
}

/// 批次完成時送出一次摘要
pub trait Notifier {
    fn notify(&self, summary: &str);
}

/// 匯入流程：掃描 → 建立輸出資料夾 → 逐一轉檔 → 彙整結果
///
/// 狀態只由這裡修改，每次變化都會把快照送給觀察者。
pub struct ImportOrchestrator {
    scanner: ClipScanner,
    planner: OutputPlanner,
    transcoder: Box<dyn Transcoder>,
    folder_chooser: Box<dyn FolderChooser>,
    notifier: Box<dyn Notifier>,
    observer: Option<Sender<ImportState>>,
    output_base: Option<PathBuf>,
    as_of: Option<NaiveDate>,
    state: ImportState,
    processed_count: usize,
}

impl ImportOrchestrator {
    #[must_use]
    pub fn new(
        transcoder: Box<dyn Transcoder>,
        folder_chooser: Box<dyn FolderChooser>,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            scanner: ClipScanner::new(),
            planner: OutputPlanner::new(),
            transcoder,
            folder_chooser,
            notifier,
            observer: None,
            output_base: None,
            as_of: None,
            state: ImportState::Idle,
            processed_count: 0,
        }
    }

    #[must_use]
    pub fn with_planner(mut self, planner: OutputPlanner) -> Self {
        self.planner = planner;
        self
    }

    #[must_use]
    pub fn with_output_base(mut self, output_base: Option<PathBuf>) -> Self {
        self.output_base = output_base;
        self
    }

    #[must_use]
    pub fn with_observer(mut self, observer: Sender<ImportState>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// 固定輸出資料夾使用的日期，未指定時使用今天
    #[must_use]
    pub const fn with_date(mut self, as_of: NaiveDate) -> Self {
        self.as_of = Some(as_of);
        self
    }

    #[must_use]
    pub const fn state(&self) -> &ImportState {
        &self.state
    }

    #[must_use]
    pub const fn processed_count(&self) -> usize {
        self.processed_count
    }

    /// 回到 Idle 並清除這一批的所有資料
    pub fn reset(&mut self) {
        self.processed_count = 0;
        self.set_state(ImportState::Idle);
    }

    /// 執行一批匯入；已有批次進行中時拒絕
    pub fn run(&mut self, roots: &[PathBuf]) -> Result<&ImportState, ImportError> {
        if self.state.is_busy() {
            warn!("Import already in progress, rejecting new batch");
            return Err(ImportError::AlreadyRunning);
        }

        self.reset();
        self.set_state(ImportState::Scanning);
        info!("Starting import from {} root(s)", roots.len());

        let _root_access: Vec<ScopedAccess> =
            roots.iter().map(|root| ScopedAccess::acquire(root)).collect();

        let clips = match self.scan_in_background(roots) {
            Ok(clips) if clips.is_empty() => return Ok(self.fail(NO_CLIPS_MESSAGE.to_string())),
            Ok(clips) => clips,
            Err(message) => return Ok(self.fail(message)),
        };

        let (output_folder, _output_access) = match self.resolve_output_folder() {
            Ok(resolved) => resolved,
            Err(message) => return Ok(self.fail(message)),
        };

        let errors = self.convert_all(&clips, &output_folder);

        info!(
            "Import finished - succeeded: {}, failed: {}",
            clips.len().saturating_sub(errors.len()),
            errors.len()
        );
        self.set_state(ImportState::Completed {
            output_folder,
            total_count: clips.len(),
            errors,
        });

        if let Some(message) = self.state.completion_message() {
            self.notifier.notify(&message);
        }

        Ok(&self.state)
    }

    /// 掃描在背景執行緒進行，這裡等待結果
    fn scan_in_background(&self, roots: &[PathBuf]) -> Result<Vec<ClipInfo>, String> {
        let scanner = &self.scanner;
        let joined = thread::scope(|scope| scope.spawn(move || scanner.scan(roots)).join());

        match joined {
            Ok(Ok(clips)) => Ok(clips),
            Ok(Err(e)) => Err(format!("Import failed: {e}")),
            Err(_) => Err("Import failed: the scanner stopped unexpectedly.".to_string()),
        }
    }

    /// 建立輸出資料夾；預設位置不可用時只給一次改選位置的機會
    fn resolve_output_folder(&self) -> Result<(PathBuf, Option<ScopedAccess>), String> {
        let as_of = self.as_of.unwrap_or_else(|| Local::now().date_naive());
        let base_access = self.output_base.as_deref().map(ScopedAccess::acquire);

        match self
            .planner
            .ensure_output_directory(self.output_base.as_deref(), as_of)
        {
            Ok(folder) => Ok((folder, base_access)),
            Err(e) if e.is_recoverable() => {
                warn!("Output folder unavailable: {e}");
                let base = self
                    .folder_chooser
                    .choose_output_base(&e)
                    .filter(|base| !base.as_os_str().is_empty())
                    .ok_or_else(|| NO_OUTPUT_SELECTED_MESSAGE.to_string())?;

                let access = ScopedAccess::acquire(&base);
                self.planner
                    .ensure_output_directory(Some(&base), as_of)
                    .map(|folder| (folder, Some(access)))
                    .map_err(|e| format!("Unable to create output folder: {e}"))
            }
            Err(e) => Err(format!("Unable to create output folder: {e}")),
        }
    }

    /// 依掃描順序逐一轉檔；單一片段失敗只記錄，不中斷批次
    fn convert_all(&mut self, clips: &[ClipInfo], output_folder: &Path) -> Vec<ConversionError> {
        let total_count = clips.len();
        let mut errors = Vec::new();
        let mut issued = HashSet::new();

        for clip in clips {
            let current_clip = clip.display_name();
            self.set_state(ImportState::Converting {
                processed_count: self.processed_count,
                total_count,
                current_clip: current_clip.clone(),
                clip_progress: 0.0,
            });

            let destination = plan_destination(&clip.path, output_folder, &mut issued);
            let processed_count = self.processed_count;
            let observer = self.observer.as_ref();
            let state = &mut self.state;
            let mut clip_progress: f64 = 0.0;

            let result = self
                .transcoder
                .convert(&clip.path, &destination, &mut |fraction| {
                    clip_progress = clip_progress.max(fraction.clamp(0.0, 1.0));
                    *state = ImportState::Converting {
                        processed_count,
                        total_count,
                        current_clip: current_clip.clone(),
                        clip_progress,
                    };
                    publish(observer, state);
                });

            match result {
                Ok(()) => info!("Converted {current_clip} -> {}", destination.display()),
                Err(e) => {
                    warn!("Failed to convert {current_clip}: {e}");
                    errors.push(ConversionError {
                        clip: current_clip.clone(),
                        reason: e.to_string(),
                    });
                }
            }

            self.processed_count += 1;
            self.set_state(ImportState::Converting {
                processed_count: self.processed_count,
                total_count,
                current_clip,
                clip_progress: 0.0,
            });
        }

        errors
    }

    fn fail(&mut self, message: String) -> &ImportState {
        error!("Import failed: {message}");
        self.set_state(ImportState::Failed { message });
        &self.state
    }

    fn set_state(&mut self, state: ImportState) {
        self.state = state;
        publish(self.observer.as_ref(), &self.state);
    }
}

fn publish(observer: Option<&Sender<ImportState>>, state: &ImportState) {
    if let Some(tx) = observer {
        // 觀察者已離開時不影響匯入
        let _ = tx.send(state.clone());
    }
}
