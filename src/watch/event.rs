use std::fmt;
use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Deleted,
    Moved,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Created => "created",
            ChangeKind::Modified => "modified",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Moved => "moved",
        }
    }
}

/// A single filesystem change below a watch root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    /// New location of a moved entry, when known.
    pub dest: Option<PathBuf>,
    pub kind: ChangeKind,
    pub is_directory: bool,
}

impl ChangeEvent {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind, is_directory: bool) -> Self {
        Self {
            path: path.into(),
            dest: None,
            kind,
            is_directory,
        }
    }

    pub fn moved(from: impl Into<PathBuf>, to: impl Into<PathBuf>, is_directory: bool) -> Self {
        Self {
            path: from.into(),
            dest: Some(to.into()),
            kind: ChangeKind::Moved,
            is_directory,
        }
    }

    /// The source path followed by the destination, if any.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.path.as_path()).chain(self.dest.as_deref())
    }

    /// Splits a raw `notify` event into change events, one per affected path.
    ///
    /// Access and `Other` events yield nothing. Events of unknown kind (`Any`) count as
    /// modifications. A rename reported with both paths becomes a single moved event.
    pub fn from_notify(event: Event) -> Vec<ChangeEvent> {
        let Event { kind, mut paths, .. } = event;
        match kind {
            EventKind::Create(create) => paths
                .into_iter()
                .map(|path| {
                    let is_directory = match create {
                        CreateKind::Folder => true,
                        CreateKind::File => false,
                        _ => path.is_dir(),
                    };
                    ChangeEvent::new(path, ChangeKind::Created, is_directory)
                })
                .collect(),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                let to = paths.pop();
                let from = paths.pop();
                match (from, to) {
                    (Some(from), Some(to)) => {
                        let is_directory = to.is_dir();
                        vec![ChangeEvent::moved(from, to, is_directory)]
                    }
                    _ => Vec::new(),
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => paths
                .into_iter()
                .map(|path| {
                    let is_directory = path.is_dir();
                    ChangeEvent::new(path, ChangeKind::Moved, is_directory)
                })
                .collect(),
            EventKind::Modify(_) | EventKind::Any => paths
                .into_iter()
                .map(|path| {
                    let is_directory = path.is_dir();
                    ChangeEvent::new(path, ChangeKind::Modified, is_directory)
                })
                .collect(),
            EventKind::Remove(remove) => paths
                .into_iter()
                .map(|path| {
                    ChangeEvent::new(path, ChangeKind::Deleted, remove == RemoveKind::Folder)
                })
                .collect(),
            EventKind::Access(_) | EventKind::Other => Vec::new(),
        }
    }
}

impl fmt::Display for ChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = if self.is_directory { "directory" } else { "file" };
        write!(f, "{} {}: {}", what, self.kind.as_str(), self.path.display())?;
        if let Some(dest) = &self.dest {
            write!(f, " -> {}", dest.display())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use notify::event::{AccessKind, DataChange};

    use super::*;

    #[test]
    fn test_create_kinds() {
        let file = Event::new(EventKind::Create(CreateKind::File)).add_path("/app/a.py".into());
        assert_eq!(
            ChangeEvent::from_notify(file),
            vec![ChangeEvent::new("/app/a.py", ChangeKind::Created, false)]
        );

        let folder = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/app/pkg".into());
        assert_eq!(
            ChangeEvent::from_notify(folder),
            vec![ChangeEvent::new("/app/pkg", ChangeKind::Created, true)]
        );
    }

    #[test]
    fn test_modify_and_remove() {
        let modify = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("/app/a.py".into())
            .add_path("/app/b.py".into());
        let changes = ChangeEvent::from_notify(modify);
        assert_eq!(changes.len(), 2);
        assert!(changes.iter().all(|c| c.kind == ChangeKind::Modified));

        let remove = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path("/app/pkg".into());
        assert_eq!(
            ChangeEvent::from_notify(remove),
            vec![ChangeEvent::new("/app/pkg", ChangeKind::Deleted, true)]
        );
    }

    #[test]
    fn test_rename_both_is_single_move() {
        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/app/a.py".into())
            .add_path("/app/b.py".into());
        let changes = ChangeEvent::from_notify(rename);
        assert_eq!(changes, vec![ChangeEvent::moved("/app/a.py", "/app/b.py", false)]);
        assert_eq!(
            changes[0].paths().collect::<Vec<_>>(),
            vec![Path::new("/app/a.py"), Path::new("/app/b.py")]
        );
        assert_eq!(changes[0].to_string(), "file moved: /app/a.py -> /app/b.py");
    }

    #[test]
    fn test_rename_half_without_dest() {
        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("/app/a.py".into());
        let changes = ChangeEvent::from_notify(rename);
        assert_eq!(changes[0].kind, ChangeKind::Moved);
        assert_eq!(changes[0].dest, None);
    }

    #[test]
    fn test_access_is_dropped() {
        let access = Event::new(EventKind::Access(AccessKind::Read)).add_path("/app/a.py".into());
        assert!(ChangeEvent::from_notify(access).is_empty());

        let other = Event::new(EventKind::Other).add_path("/app/a.py".into());
        assert!(ChangeEvent::from_notify(other).is_empty());
    }

    #[test]
    fn test_unknown_kind_is_modification() {
        let any = Event::new(EventKind::Any).add_path("/app/a.py".into());
        assert_eq!(
            ChangeEvent::from_notify(any),
            vec![ChangeEvent::new("/app/a.py", ChangeKind::Modified, false)]
        );
    }
}
