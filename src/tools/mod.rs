mod clip_scanner;
mod ffprobe_info;
mod output_planner;
mod scoped_access;

pub use clip_scanner::{
    CLIP_EXTENSION, ClipInfo, ClipScanner, MIN_CLIP_SIZE, STREAM_MARKERS, has_clip_extension,
    is_in_stream_folder, sort_clips,
};
pub use ffprobe_info::{ClipMediaInfo, get_clip_info};
pub use output_planner::{OUTPUT_EXTENSION, OUTPUT_FOLDER_NAME, OutputPlanner, plan_destination};
pub use scoped_access::ScopedAccess;
