//! Reads `/proc/self/mountinfo` to find out which container this process lives in.
mod detect;
mod error;
mod parser;

pub use detect::{detect_container_id, detect_container_id_from_reader};
pub use error::{Error, Result};
pub use parser::{MountInfo, ParseError, parse_mount_info_line};
