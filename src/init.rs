use env_logger::Env;
use log::LevelFilter;

/// 初始化日誌；預設只顯示警告，`RUST_LOG` 可覆寫，`--verbose` 強制 debug
pub fn init(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    // 測試中可能重複初始化
    let _ = builder.try_init();
}
