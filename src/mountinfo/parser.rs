//! Mountinfo line parser for Linux systems.
//!
//! Parses lines in `/proc/[pid]/mountinfo` format. See
//! [`proc_pid_mountinfo(5)`](https://man7.org/linux/man-pages/man5/proc_pid_mountinfo.5.html)
//! for details on the structure.
use std::borrow::Cow;

/// Represents a parsed mountinfo line.
///
/// Path fields are unescaped: the kernel encodes space, tab, newline and backslash as
/// three-digit octal sequences (`\040` etc.).
#[derive(Debug, PartialEq, Eq)]
pub struct MountInfo<'a> {
    pub mount_id: &'a str,
    pub parent_id: &'a str,
    pub major_minor: &'a str,
    /// Root of the mount within the source filesystem.
    pub root: Cow<'a, str>,
    /// Mount point relative to the process's root.
    pub mount_point: Cow<'a, str>,
    pub optional_fields: Vec<&'a str>,
    pub fs_type: &'a str,
    pub source: &'a str,
}

/// Named fields in a mountinfo line.
#[derive(Debug)]
pub enum MountInfoField {
    MountId,
    ParentId,
    MajorMinor,
    Root,
    MountPoint,
    FsType,
    Source,
}

impl std::fmt::Display for MountInfoField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MountInfoField::MountId => "mount_id",
            MountInfoField::ParentId => "parent_id",
            MountInfoField::MajorMinor => "major:minor",
            MountInfoField::Root => "root",
            MountInfoField::MountPoint => "mount_point",
            MountInfoField::FsType => "fs_type",
            MountInfoField::Source => "source",
        };
        write!(f, "{name}")
    }
}

/// Errors that may occur when parsing a mountinfo line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("missing separator ` - ` in line: `{0}`")]
    MissingSeparator(String),

    #[error("missing `{field}` in line: `{line}`")]
    MissingField { field: MountInfoField, line: String },
}

/// Parses a single line of mountinfo data.
///
/// # Errors
///
/// Returns [`ParseError`] variants for a missing separator or missing required fields.
pub fn parse_mount_info_line(line: &str) -> Result<MountInfo<'_>, ParseError> {
    let (pre, post) = line
        .split_once(" - ")
        .ok_or_else(|| ParseError::MissingSeparator(line.to_owned()))?;

    let missing = |field| ParseError::MissingField {
        field,
        line: line.to_owned(),
    };

    let mut pre_fields = pre.split_whitespace();
    let mount_id = pre_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::MountId))?;
    let parent_id = pre_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::ParentId))?;
    let major_minor = pre_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::MajorMinor))?;
    let root = pre_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::Root))?;
    let mount_point = pre_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::MountPoint))?;
    let optional_fields: Vec<&str> = pre_fields.collect();

    let mut post_fields = post.split_whitespace();
    let fs_type = post_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::FsType))?;
    let source = post_fields
        .next()
        .ok_or_else(|| missing(MountInfoField::Source))?;

    Ok(MountInfo {
        mount_id,
        parent_id,
        major_minor,
        root: unescape_octal(root),
        mount_point: unescape_octal(mount_point),
        optional_fields,
        fs_type,
        source,
    })
}

/// Decodes `\NNN` octal escapes, borrowing when there is nothing to decode.
fn unescape_octal(field: &str) -> Cow<'_, str> {
    if !field.contains('\\') {
        return Cow::Borrowed(field);
    }

    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
                let value = digits
                    .iter()
                    .fold(0u16, |acc, b| acc * 8 + u16::from(b - b'0'));
                if let Ok(value) = u8::try_from(value) {
                    out.push(value);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}
