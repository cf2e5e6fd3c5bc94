//! Decide whether a completed build is worth announcing.

use serde::{Deserialize, Serialize};

use crate::domain::BuildResult;

/// True unless the previous build exists and succeeded.
pub fn previous_was_not_successful(previous: Option<BuildResult>) -> bool {
    previous != Some(BuildResult::Success)
}

/// Smart mode: announce every non-success, and the success that ends a
/// non-successful streak. Consecutive successes stay quiet.
pub fn smart_notify(current: BuildResult, previous: Option<BuildResult>) -> bool {
    current != BuildResult::Success || previous_was_not_successful(previous)
}

/// Per-result opt-outs for completion notifications.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResultFilter {
    pub success: bool,
    pub failure: bool,
    pub aborted: bool,
    pub not_built: bool,
    pub unstable: bool,
}

impl Default for ResultFilter {
    fn default() -> Self {
        Self {
            success: true,
            failure: true,
            aborted: true,
            not_built: true,
            unstable: true,
        }
    }
}

impl ResultFilter {
    /// Results without a switch (`Building`, `Unknown`) are always allowed.
    pub fn allows(&self, result: BuildResult) -> bool {
        match result {
            BuildResult::Success => self.success,
            BuildResult::Failure => self.failure,
            BuildResult::Aborted => self.aborted,
            BuildResult::NotBuilt => self.not_built,
            BuildResult::Unstable => self.unstable,
            BuildResult::Building | BuildResult::Unknown => true,
        }
    }
}
