//! Read-only snapshot of a build as handed over by the orchestrator.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::cause::Cause;
use super::result::BuildResult;

/// Identifier of a user known to the orchestrator.
pub type UserId = String;

/// Committer of a change set entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub display_name: String,
}

/// One commit (or equivalent) in a build's change set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeEntry {
    pub author: Author,
    #[serde(default)]
    pub affected_files: Vec<String>,
}

/// The SCM changes that went into a build.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSet {
    #[serde(default)]
    pub entries: Vec<ChangeEntry>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct author display names, sorted.
    pub fn author_names(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .map(|e| e.author.display_name.as_str())
            .collect()
    }

    /// Distinct affected paths across all entries.
    pub fn affected_files(&self) -> BTreeSet<&str> {
        self.entries
            .iter()
            .flat_map(|e| e.affected_files.iter().map(String::as_str))
            .collect()
    }
}

/// Aggregated test results of a build.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestSummary {
    pub fail_count: u32,
    /// Change in failures relative to the previous build, e.g. `"+2"`.
    #[serde(default)]
    pub diff_text: String,
}

/// Lightweight reference to another build of the same project.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRef {
    pub number: u64,
    pub result: BuildResult,
}

/// Everything the notifier may ask about a build.
///
/// Owned by the orchestrator; the notifier only reads it and keeps no
/// reference after an event has been handled.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BuildRecord {
    /// Full project name, including any folder prefix.
    pub project: String,

    /// Display name of the build, usually `#<number>`.
    pub display_name: String,

    pub number: u64,

    pub result: BuildResult,

    #[serde(default)]
    pub previous: Option<BuildRef>,

    /// Human readable duration, e.g. `"3 min 12 sec"`.
    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub test_summary: Option<TestSummary>,

    /// `None` when the orchestrator has not computed the change set yet.
    #[serde(default)]
    pub change_set: Option<ChangeSet>,

    /// Root triggering cause.
    #[serde(default)]
    pub cause: Option<Cause>,

    /// Build URL relative to the server root.
    pub url: String,

    /// Users with changes since the project's last stable build.
    #[serde(default)]
    pub culprits: BTreeSet<UserId>,
}

impl BuildRecord {
    /// Create a record with the given identity and result; `display_name`
    /// defaults to `#<number>` and `url` to `job/<project>/<number>/`.
    pub fn new(project: impl Into<String>, number: u64, result: BuildResult) -> Self {
        let project = project.into();
        let url = format!("job/{}/{}/", project, number);
        Self {
            project,
            display_name: format!("#{}", number),
            number,
            result,
            previous: None,
            duration: String::new(),
            test_summary: None,
            change_set: None,
            cause: None,
            url,
            culprits: BTreeSet::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_previous(mut self, number: u64, result: BuildResult) -> Self {
        self.previous = Some(BuildRef { number, result });
        self
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.duration = duration.into();
        self
    }

    pub fn with_test_summary(mut self, fail_count: u32, diff_text: impl Into<String>) -> Self {
        self.test_summary = Some(TestSummary {
            fail_count,
            diff_text: diff_text.into(),
        });
        self
    }

    pub fn with_change_set(mut self, change_set: ChangeSet) -> Self {
        self.change_set = Some(change_set);
        self
    }

    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_culprits<I, S>(mut self, culprits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        self.culprits = culprits.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_change_set_computed(&self) -> bool {
        self.change_set.is_some()
    }

    /// The change set, if computed and non-empty.
    pub fn changes(&self) -> Option<&ChangeSet> {
        self.change_set.as_ref().filter(|cs| !cs.is_empty())
    }

    /// Test failures, if any test failed.
    pub fn failed_tests(&self) -> Option<&TestSummary> {
        self.test_summary.as_ref().filter(|t| t.fail_count > 0)
    }

    /// The root cause when it is an upstream trigger.
    pub fn upstream_cause(&self) -> Option<&Cause> {
        self.cause.as_ref().filter(|c| c.is_upstream())
    }
}
