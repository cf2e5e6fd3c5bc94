//! Triggering causes attached to a build.

use serde::{Deserialize, Serialize};

/// Why a build was started.
///
/// Upstream causes nest: a build triggered by project B, which was itself
/// triggered by project C, carries `Upstream { B, nested: [Upstream { C }] }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Cause {
    /// Manual trigger, timer, SCM poll and anything else without a chain.
    Direct { short_description: String },

    /// Triggered by the completion of another project's build.
    Upstream {
        project: String,
        build_number: u64,
        #[serde(default)]
        nested: Vec<Cause>,
    },
}

impl Cause {
    /// Shorthand for a direct cause.
    pub fn direct(short_description: impl Into<String>) -> Self {
        Cause::Direct {
            short_description: short_description.into(),
        }
    }

    /// Shorthand for an upstream cause with nested causes.
    pub fn upstream(project: impl Into<String>, build_number: u64, nested: Vec<Cause>) -> Self {
        Cause::Upstream {
            project: project.into(),
            build_number,
            nested,
        }
    }

    /// One-line description suitable for a start notification.
    pub fn short_description(&self) -> String {
        match self {
            Cause::Direct { short_description } => short_description.clone(),
            Cause::Upstream {
                project,
                build_number,
                ..
            } => format!(
                "Started by upstream project \"{}\" build number {}",
                project, build_number
            ),
        }
    }

    pub fn is_upstream(&self) -> bool {
        matches!(self, Cause::Upstream { .. })
    }
}
