use anyhow::{Context, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Ctrl-C 只取消目前片段的轉檔，批次會繼續處理其餘片段
pub fn setup_cancel_signal() -> Result<Arc<AtomicBool>> {
    let cancel_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&cancel_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\nInterrupt received, cancelling the current clip...");
    })
    .context("Unable to install the Ctrl-C handler")?;

    Ok(cancel_signal)
}
