//! Herald Core - build lifecycle notifications
//!
//! Decides whether a build event deserves a chat message, works out who to
//! blame for a failure inherited from upstream builds, and composes the
//! status line:
//! - `filter`: smart suppression of repeated successes
//! - `culprits`: bounded walk over upstream cause chains
//! - `message`: ordered, optional message segments
//! - `dispatcher`: per-event entry point driving a [`ChatService`]

pub mod chat;
pub mod config;
pub mod culprits;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod fakes;
pub mod filter;
pub mod message;
pub mod registry;
pub mod telemetry;

pub use chat::{ChatError, ChatResult, ChatService};
pub use config::{DeliveryConfig, GlobalConfig, HeraldConfig, JobConfig, NotifierConfig};
pub use culprits::{flatten_upstream, ResolverLimits, UpstreamCulpritResolver, UpstreamLink};
pub use dispatcher::Dispatcher;
pub use domain::{
    Author, BuildRecord, BuildRef, BuildResult, Cause, ChangeEntry, ChangeSet, Color,
    LifecycleEvent, Notification, TestSummary, UserId,
};
pub use error::{ConfigError, NotifyError, Result};
pub use filter::{previous_was_not_successful, smart_notify, ResultFilter};
pub use message::{MessageBuilder, MessageComposer, Segment};
pub use registry::{
    BuildRegistry, ProjectInfo, ProjectKind, RecordedBuild, RegistrySnapshot, SnapshotRegistry,
};
pub use telemetry::init_tracing;

/// Herald version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
