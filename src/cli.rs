use clap::Parser;
use std::path::PathBuf;

/// Import AVCHD camcorder clips from SD cards or folders and convert them to MP4.
#[derive(Debug, Parser)]
#[command(name = "camcorder-import", version, about)]
pub struct Cli {
    /// SD card, AVCHD folder or individual .MTS file. Several may be given.
    pub roots: Vec<PathBuf>,

    /// Folder that receives "Camcorder Imports/<date>" instead of Pictures.
    #[arg(short, long, env = "CAMCORDER_IMPORT_OUTPUT")]
    pub output: Option<PathBuf>,

    /// ffmpeg executable used for conversion.
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// ffprobe executable; defaults to the one next to ffmpeg.
    #[arg(long, env = "FFPROBE_PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Print the final report as JSON on stdout.
    #[arg(long)]
    pub json: bool,

    /// Never prompt; a missing folder or output location ends the import.
    #[arg(long)]
    pub non_interactive: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}
