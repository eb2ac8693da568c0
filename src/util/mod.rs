mod format;
mod path;

pub use format::{format_interval, format_size, milestone};
pub use path::{ARCHIVE_EXTENSION, is_archive_name, series_name, title_name};
