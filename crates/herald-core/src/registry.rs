//! Read-only view of the orchestrator's project and build registry.
//!
//! The culprit resolver receives a `BuildRegistry` explicitly instead of
//! reaching for a process-wide instance. `SnapshotRegistry` is an in-memory
//! implementation that can be deserialized from a JSON export.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::domain::{BuildResult, UserId};

/// What kind of item a name resolves to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// A job that produces builds.
    Buildable,
    /// A container (folder, view) that has no builds of its own.
    Folder,
}

/// A resolved project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInfo {
    pub full_name: String,
    pub kind: ProjectKind,
}

impl ProjectInfo {
    pub fn is_buildable(&self) -> bool {
        self.kind == ProjectKind::Buildable
    }
}

/// A historical build as the registry records it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordedBuild {
    pub number: u64,
    pub result: BuildResult,
    /// Users with changes since the project's last stable build.
    #[serde(default)]
    pub culprits: BTreeSet<UserId>,
}

/// Lookup of projects and their builds.
///
/// Implementations must be cheap to query; a miss is reported as `None`
/// and never as an error.
pub trait BuildRegistry: Send + Sync {
    /// Resolve an item by its full name.
    fn lookup_project(&self, full_name: &str) -> Option<ProjectInfo>;

    /// Fetch a build of `project` by number.
    fn build_by_number(&self, project: &ProjectInfo, number: u64) -> Option<RecordedBuild>;
}

/// One project entry of a registry snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub full_name: String,
    #[serde(default = "default_kind")]
    pub kind: ProjectKind,
    #[serde(default)]
    pub builds: Vec<RecordedBuild>,
}

fn default_kind() -> ProjectKind {
    ProjectKind::Buildable
}

/// Serialized form of a [`SnapshotRegistry`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub projects: Vec<ProjectSnapshot>,
}

#[derive(Debug, Clone)]
struct ProjectEntry {
    kind: ProjectKind,
    builds: BTreeMap<u64, RecordedBuild>,
}

/// In-memory registry built from a snapshot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRegistry {
    projects: BTreeMap<String, ProjectEntry>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from its serialized form. Later duplicates of a
    /// project name replace earlier ones.
    pub fn from_snapshot(snapshot: RegistrySnapshot) -> Self {
        let mut registry = Self::new();
        for project in snapshot.projects {
            registry.projects.insert(
                project.full_name,
                ProjectEntry {
                    kind: project.kind,
                    builds: project.builds.into_iter().map(|b| (b.number, b)).collect(),
                },
            );
        }
        registry
    }

    /// Parse a JSON snapshot.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let snapshot: RegistrySnapshot = serde_json::from_str(json)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Register a project (or replace its kind), keeping existing builds.
    pub fn add_project(&mut self, full_name: impl Into<String>, kind: ProjectKind) -> &mut Self {
        self.projects
            .entry(full_name.into())
            .and_modify(|e| e.kind = kind)
            .or_insert_with(|| ProjectEntry {
                kind,
                builds: BTreeMap::new(),
            });
        self
    }

    /// Record a build, creating the project as buildable if unknown.
    pub fn add_build<I, S>(
        &mut self,
        project: &str,
        number: u64,
        result: BuildResult,
        culprits: I,
    ) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<UserId>,
    {
        let entry = self
            .projects
            .entry(project.to_string())
            .or_insert_with(|| ProjectEntry {
                kind: ProjectKind::Buildable,
                builds: BTreeMap::new(),
            });
        entry.builds.insert(
            number,
            RecordedBuild {
                number,
                result,
                culprits: culprits.into_iter().map(Into::into).collect(),
            },
        );
        self
    }

    pub fn project_count(&self) -> usize {
        self.projects.len()
    }
}

impl BuildRegistry for SnapshotRegistry {
    fn lookup_project(&self, full_name: &str) -> Option<ProjectInfo> {
        self.projects.get(full_name).map(|e| ProjectInfo {
            full_name: full_name.to_string(),
            kind: e.kind,
        })
    }

    fn build_by_number(&self, project: &ProjectInfo, number: u64) -> Option<RecordedBuild> {
        self.projects
            .get(&project.full_name)
            .and_then(|e| e.builds.get(&number))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_miss_is_none() {
        let registry = SnapshotRegistry::new();
        assert!(registry.lookup_project("nope").is_none());
    }

    #[test]
    fn test_add_build_creates_buildable_project() {
        let mut registry = SnapshotRegistry::new();
        registry.add_build("lib", 4, BuildResult::Failure, ["alice", "bob"]);

        let project = registry.lookup_project("lib").expect("project");
        assert!(project.is_buildable());

        let build = registry.build_by_number(&project, 4).expect("build");
        assert_eq!(build.culprits.len(), 2);
        assert!(registry.build_by_number(&project, 5).is_none());
    }

    #[test]
    fn test_add_project_keeps_builds() {
        let mut registry = SnapshotRegistry::new();
        registry.add_build("lib", 1, BuildResult::Success, Vec::<String>::new());
        registry.add_project("lib", ProjectKind::Folder);

        let project = registry.lookup_project("lib").expect("project");
        assert!(!project.is_buildable());
        assert!(registry.build_by_number(&project, 1).is_some());
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "projects": [
                {"full_name": "team", "kind": "folder"},
                {"full_name": "team/lib", "builds": [
                    {"number": 12, "result": "failure", "culprits": ["carol"]}
                ]}
            ]
        }"#;
        let registry = SnapshotRegistry::from_json(json).expect("parse");
        assert_eq!(registry.project_count(), 2);

        let folder = registry.lookup_project("team").expect("folder");
        assert_eq!(folder.kind, ProjectKind::Folder);

        let lib = registry.lookup_project("team/lib").expect("lib");
        let build = registry.build_by_number(&lib, 12).expect("build");
        assert!(build.culprits.contains("carol"));
    }
}
