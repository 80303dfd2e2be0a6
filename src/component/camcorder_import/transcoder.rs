use super::ffmpeg_command::FfmpegCommand;
use crate::error::TranscodeError;
use crate::tools::get_clip_info;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// 外部轉檔引擎的抽象介面
///
/// `on_progress` 收到的比例介於 0.0 到 1.0，同一個片段內不會倒退。
/// 失敗或取消時不得在目的地留下看似完整的檔案。
pub trait Transcoder {
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<(), TranscodeError>;
}

const STDERR_TAIL_LINES: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressUpdate {
    OutTime(u64),
    End,
}

/// 將 ffmpeg 的輸出時間換算為單調不減的完成比例
#[derive(Debug)]
struct ProgressTracker {
    total_ms: Option<u64>,
    fraction: f64,
}

impl ProgressTracker {
    const fn new(total_ms: Option<u64>) -> Self {
        Self {
            total_ms,
            fraction: 0.0,
        }
    }

    fn apply(&mut self, update: ProgressUpdate) {
        let next = match (update, self.total_ms) {
            (ProgressUpdate::End, _) => 1.0,
            (ProgressUpdate::OutTime(current_ms), Some(total)) if total > 0 => {
                current_ms as f64 / total as f64
            }
            (ProgressUpdate::OutTime(_), _) => return,
        };
        self.fraction = self.fraction.max(next.clamp(0.0, 1.0));
    }

    const fn fraction(&self) -> f64 {
        self.fraction
    }
}

/// 透過 ffmpeg 子程序轉檔
pub struct FfmpegTranscoder {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    progress_interval: Duration,
    cancel_signal: Arc<AtomicBool>,
    mp4_supported: OnceLock<bool>,
}

impl FfmpegTranscoder {
    #[must_use]
    pub fn new(
        ffmpeg_path: PathBuf,
        ffprobe_path: PathBuf,
        progress_interval: Duration,
        cancel_signal: Arc<AtomicBool>,
    ) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            progress_interval,
            cancel_signal,
            mp4_supported: OnceLock::new(),
        }
    }

    fn supports_mp4(&self) -> bool {
        *self.mp4_supported.get_or_init(|| {
            match Command::new(&self.ffmpeg_path)
                .args(["-hide_banner", "-muxers"])
                .stdin(Stdio::null())
                .output()
            {
                Ok(output) if output.status.success() => {
                    has_mp4_muxer(&String::from_utf8_lossy(&output.stdout))
                }
                // 無法查詢時交給實際轉檔回報錯誤
                _ => true,
            }
        })
    }

    fn wait_for_exit(
        &self,
        child: &mut Child,
        progress_rx: &Receiver<ProgressUpdate>,
        tracker: &mut ProgressTracker,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<ExitStatus, TranscodeError> {
        let mut stdout_open = true;
        let mut last_emitted = 0.0;
        let mut last_emit_at = Instant::now();

        loop {
            if stdout_open {
                match progress_rx.recv_timeout(self.progress_interval) {
                    Ok(update) => {
                        tracker.apply(update);
                        progress_rx.try_iter().for_each(|u| tracker.apply(u));
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => stdout_open = false,
                }
            } else {
                thread::sleep(self.progress_interval);
            }

            if tracker.fraction() > last_emitted && last_emit_at.elapsed() >= self.progress_interval
            {
                last_emitted = tracker.fraction();
                last_emit_at = Instant::now();
                on_progress(last_emitted);
            }

            if self.cancel_signal.load(Ordering::SeqCst) {
                warn!("Cancelling ffmpeg [{}]", child.id());
                let _ = child.kill();
                let _ = child.wait();
                return Err(TranscodeError::Cancelled);
            }

            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(TranscodeError::failed(format!(
                        "Unable to check ffmpeg status: {e}"
                    )));
                }
            }
        }
    }
}

impl Transcoder for FfmpegTranscoder {
    fn convert(
        &self,
        source: &Path,
        destination: &Path,
        on_progress: &mut dyn FnMut(f64),
    ) -> Result<(), TranscodeError> {
        // 取消只針對目前這個片段
        self.cancel_signal.store(false, Ordering::SeqCst);

        if !self.supports_mp4() {
            return Err(TranscodeError::UnsupportedOutput);
        }

        let total_ms = match get_clip_info(&self.ffprobe_path, source) {
            Ok(info) if !info.has_video => {
                return Err(TranscodeError::failed("No video stream found in clip."));
            }
            Ok(info) => Some(info.duration_ms()),
            Err(e) => {
                warn!("Progress will be coarse for {}: {e:#}", source.display());
                None
            }
        };

        let ffmpeg_cmd = FfmpegCommand::new(source, destination);
        let mut command = ffmpeg_cmd.build_command(&self.ffmpeg_path);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        debug!("Running {command:?}");

        let mut child = command
            .spawn()
            .map_err(|e| TranscodeError::failed(format!("Unable to start ffmpeg: {e}")))?;
        info!(
            "Encoding [{}]: {} -> {}",
            child.id(),
            source.display(),
            destination.display()
        );

        let (progress_tx, progress_rx) = unbounded();
        let progress_reader = spawn_progress_reader(child.stdout.take(), progress_tx);
        let stderr_reader = spawn_stderr_collector(child.stderr.take());

        let mut tracker = ProgressTracker::new(total_ms);
        on_progress(0.0);

        let waited = self.wait_for_exit(&mut child, &progress_rx, &mut tracker, on_progress);

        if let Some(handle) = progress_reader {
            let _ = handle.join();
        }
        let stderr_tail = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        let status = match waited {
            Ok(status) => status,
            Err(e) => {
                remove_partial(ffmpeg_cmd.partial_path());
                return Err(e);
            }
        };

        if !status.success() {
            remove_partial(ffmpeg_cmd.partial_path());
            // Ctrl-C 也會直接送到 ffmpeg，可能比旗標檢查先結束
            if self.cancel_signal.load(Ordering::SeqCst) {
                return Err(TranscodeError::Cancelled);
            }
            return Err(classify_failure(status, &stderr_tail));
        }

        if let Err(e) = fs::rename(ffmpeg_cmd.partial_path(), destination) {
            remove_partial(ffmpeg_cmd.partial_path());
            return Err(TranscodeError::failed(format!(
                "Unable to finalize {}: {e}",
                destination.display()
            )));
        }

        on_progress(1.0);
        info!("Encoded: {}", destination.display());
        Ok(())
    }
}

/// 從 ffmpeg 標準輸出讀取 -progress 資訊
fn spawn_progress_reader(
    stdout: Option<impl Read + Send + 'static>,
    progress_tx: Sender<ProgressUpdate>,
) -> Option<JoinHandle<()>> {
    let stdout = stdout?;
    Some(thread::spawn(move || {
        let reader = BufReader::new(stdout);
        for line in reader.lines().map_while(Result::ok) {
            if let Some(update) = parse_progress_line(&line) {
                if progress_tx.send(update).is_err() {
                    break;
                }
            }
        }
    }))
}

/// 持續讀取 stderr 避免管線塞滿，只保留最後幾行作為錯誤原因
fn spawn_stderr_collector(
    stderr: Option<impl Read + Send + 'static>,
) -> Option<JoinHandle<Vec<String>>> {
    let stderr = stderr?;
    Some(thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(stderr).lines().map_while(Result::ok) {
            let line = line.trim().to_string();
            if line.is_empty() {
                continue;
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        tail.into_iter().collect()
    }))
}

fn parse_progress_line(line: &str) -> Option<ProgressUpdate> {
    let (key, value) = line.trim().split_once('=')?;
    match key {
        // out_time_ms 實際上也是微秒
        "out_time_us" | "out_time_ms" => value
            .parse::<u64>()
            .ok()
            .map(|us| ProgressUpdate::OutTime(us / 1000)),
        "out_time" => parse_clock_ms(value).map(ProgressUpdate::OutTime),
        "progress" if value == "end" => Some(ProgressUpdate::End),
        _ => None,
    }
}

/// 解析 HH:MM:SS.micro
fn parse_clock_ms(raw: &str) -> Option<u64> {
    let parts: Vec<&str> = raw.split(':').collect();
    if parts.len() != 3 {
        return None;
    }
    let h = parts[0].parse::<u64>().ok()?;
    let m = parts[1].parse::<u64>().ok()?;
    let (s, micro) = match parts[2].split_once('.') {
        Some((sec, micro)) => (sec.parse::<u64>().ok()?, micro.parse::<u64>().unwrap_or(0)),
        None => (parts[2].parse::<u64>().ok()?, 0),
    };
    Some((h * 3600 + m * 60 + s) * 1000 + micro / 1000)
}

fn has_mp4_muxer(muxers: &str) -> bool {
    muxers.lines().any(|line| {
        let mut tokens = line.split_whitespace();
        matches!(tokens.next(), Some(flags) if flags.contains('E'))
            && tokens.next().is_some_and(|names| names.split(',').any(|n| n == "mp4"))
    })
}

fn classify_failure(status: ExitStatus, stderr_tail: &[String]) -> TranscodeError {
    let unsupported = stderr_tail.iter().any(|line| {
        line.contains("Unable to find a suitable output format")
            || line.contains("Requested output format 'mp4'")
    });
    if unsupported {
        return TranscodeError::UnsupportedOutput;
    }

    match stderr_tail.last() {
        Some(reason) => TranscodeError::failed(reason.clone()),
        None => TranscodeError::failed(format!("ffmpeg exited with {status}")),
    }
}

fn remove_partial(partial_path: &Path) {
    if partial_path.exists() {
        match fs::remove_file(partial_path) {
            Ok(()) => info!("Removed partial output: {}", partial_path.display()),
            Err(e) => warn!(
                "Unable to remove partial output {}: {e}",
                partial_path.display()
            ),
        }
    }
}
