//! Build facts the notifier reasons about.

pub mod build;
pub mod cause;
pub mod event;
pub mod result;

pub use build::{Author, BuildRecord, BuildRef, ChangeEntry, ChangeSet, TestSummary, UserId};
pub use cause::Cause;
pub use event::{LifecycleEvent, Notification};
pub use result::{BuildResult, Color};
