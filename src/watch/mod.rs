//! Filesystem watching: raw `notify` events in, reload signals out.
mod dispatcher;
mod event;
mod filter;
mod source;

pub use dispatcher::{Dispatcher, DispatcherTask};
pub use event::{ChangeEvent, ChangeKind};
pub use filter::PathFilter;
pub use source::WatchSource;
