//! Debounced restart of target containers.
//!
//! [`DebounceScheduler`] turns a burst of reload signals into a single
//! [`RestartExecutor::execute`] call once the burst has been quiet for the configured
//! delay.
mod executor;
mod scheduler;

pub use executor::{RestartExecutor, RestartReport};
pub use scheduler::DebounceScheduler;
