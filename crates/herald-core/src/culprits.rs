//! Blame attribution across chains of upstream-triggered builds.
//!
//! When a build fails because something upstream broke it, the people to
//! mention are the culprits of the upstream builds, not of the build itself.
//! The resolver walks the cause tree rooted at the build's upstream trigger
//! and unions the culprit sets recorded for every upstream build it finds.
//!
//! Every lookup miss is treated as "contributes nothing". The walk is
//! iterative and bounded so that a malformed or self-referencing cause tree
//! cannot run away.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{BuildRecord, BuildResult, Cause, UserId};
use crate::registry::BuildRegistry;

/// Bounds for the upstream walk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ResolverLimits {
    /// Deepest nesting level still visited; the root is level 0.
    pub max_depth: usize,
    /// Maximum number of upstream links collected.
    pub max_nodes: usize,
}

impl Default for ResolverLimits {
    fn default() -> Self {
        Self {
            max_depth: 32,
            max_nodes: 256,
        }
    }
}

/// One upstream trigger found in a cause tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamLink<'a> {
    pub project: &'a str,
    pub build_number: u64,
    pub depth: usize,
}

/// Flatten the upstream links reachable from `root`.
///
/// Depth-first, left to right, root first. Direct causes are dropped and
/// their children are not inspected. Each `(project, build_number)` pair is
/// collected once. A pair first met deep in the tree and later met closer to
/// the root has its children expanded again from the shallower depth.
pub fn flatten_upstream(root: &Cause, limits: ResolverLimits) -> Vec<UpstreamLink<'_>> {
    let mut links = Vec::new();
    let mut visited: HashMap<(&str, u64), usize> = HashMap::new();
    let mut stack: Vec<(&Cause, usize)> = vec![(root, 0)];

    while let Some((cause, depth)) = stack.pop() {
        let Cause::Upstream {
            project,
            build_number,
            nested,
        } = cause
        else {
            continue;
        };

        if depth > limits.max_depth {
            warn!(
                project = %project,
                build = build_number,
                max_depth = limits.max_depth,
                "Upstream chain exceeds depth limit, truncating"
            );
            continue;
        }

        let key = (project.as_str(), *build_number);
        let seen_at = visited.get(&key).copied();
        if seen_at.is_some_and(|seen| seen <= depth) {
            debug!(project = %project, build = build_number, "Upstream cause already visited");
            continue;
        }

        if seen_at.is_none() {
            if links.len() >= limits.max_nodes {
                warn!(
                    max_nodes = limits.max_nodes,
                    "Upstream chain exceeds node limit, truncating"
                );
                break;
            }
            links.push(UpstreamLink {
                project,
                build_number: *build_number,
                depth,
            });
        }
        visited.insert(key, depth);

        for child in nested.iter().rev() {
            stack.push((child, depth + 1));
        }
    }

    links
}

/// Resolves the users to blame for a build.
pub struct UpstreamCulpritResolver<'r> {
    registry: &'r dyn BuildRegistry,
    limits: ResolverLimits,
}

impl<'r> UpstreamCulpritResolver<'r> {
    pub fn new(registry: &'r dyn BuildRegistry) -> Self {
        Self {
            registry,
            limits: ResolverLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResolverLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Users whose upstream changes may have caused this build's outcome.
    ///
    /// Empty for successful builds and for builds not triggered upstream.
    pub fn resolve(&self, build: &BuildRecord) -> BTreeSet<UserId> {
        if build.result == BuildResult::Success {
            return BTreeSet::new();
        }
        let Some(root) = build.upstream_cause() else {
            return BTreeSet::new();
        };

        let mut culprits = BTreeSet::new();
        for link in flatten_upstream(root, self.limits) {
            culprits.extend(self.culprits_of(&link));
        }

        debug!(
            project = %build.project,
            build = build.number,
            culprits = culprits.len(),
            "Resolved upstream culprits"
        );
        culprits
    }

    fn culprits_of(&self, link: &UpstreamLink<'_>) -> BTreeSet<UserId> {
        let Some(project) = self.registry.lookup_project(link.project) else {
            debug!(project = %link.project, "Upstream project not found");
            return BTreeSet::new();
        };
        if !project.is_buildable() {
            debug!(project = %link.project, "Upstream item is not buildable");
            return BTreeSet::new();
        }
        match self.registry.build_by_number(&project, link.build_number) {
            Some(build) => build.culprits,
            None => {
                debug!(
                    project = %link.project,
                    build = link.build_number,
                    "Upstream build not found"
                );
                BTreeSet::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ProjectKind, SnapshotRegistry};

    fn names(links: &[UpstreamLink<'_>]) -> Vec<String> {
        links
            .iter()
            .map(|l| format!("{}#{}", l.project, l.build_number))
            .collect()
    }

    #[test]
    fn test_flatten_is_depth_first_left_to_right() {
        let root = Cause::upstream(
            "a",
            1,
            vec![
                Cause::upstream("b", 2, vec![Cause::upstream("c", 3, vec![])]),
                Cause::direct("Started by timer"),
                Cause::upstream("d", 4, vec![]),
            ],
        );
        let links = flatten_upstream(&root, ResolverLimits::default());
        assert_eq!(names(&links), vec!["a#1", "b#2", "c#3", "d#4"]);
        assert_eq!(links[2].depth, 2);
    }

    #[test]
    fn test_flatten_direct_root_is_empty() {
        let root = Cause::direct("Started by user");
        assert!(flatten_upstream(&root, ResolverLimits::default()).is_empty());
    }

    #[test]
    fn test_flatten_skips_repeated_links() {
        let root = Cause::upstream(
            "a",
            1,
            vec![Cause::upstream("a", 1, vec![Cause::upstream("b", 2, vec![])])],
        );
        let links = flatten_upstream(&root, ResolverLimits::default());
        assert_eq!(names(&links), vec!["a#1"]);
    }

    #[test]
    fn test_flatten_respects_depth_limit() {
        let mut cause = Cause::upstream("p", 100, vec![]);
        for n in (0..100).rev() {
            cause = Cause::upstream("p", n, vec![cause]);
        }
        let limits = ResolverLimits {
            max_depth: 5,
            max_nodes: 1000,
        };
        let links = flatten_upstream(&cause, limits);
        assert_eq!(links.len(), 6);
        assert!(links.iter().all(|l| l.depth <= 5));
    }

    #[test]
    fn test_flatten_respects_node_limit() {
        let nested = (0..50).map(|n| Cause::upstream("p", n, vec![])).collect();
        let root = Cause::upstream("root", 1, nested);
        let limits = ResolverLimits {
            max_depth: 10,
            max_nodes: 8,
        };
        assert_eq!(flatten_upstream(&root, limits).len(), 8);
    }

    #[test]
    fn test_link_past_depth_limit_is_kept_when_reached_shallower() {
        let root = Cause::upstream(
            "root",
            0,
            vec![
                Cause::upstream(
                    "p",
                    1,
                    vec![Cause::upstream("q", 2, vec![Cause::upstream("x", 1, vec![])])],
                ),
                Cause::upstream("x", 1, vec![]),
            ],
        );
        let limits = ResolverLimits {
            max_depth: 2,
            max_nodes: 100,
        };
        let links = flatten_upstream(&root, limits);
        assert_eq!(names(&links), vec!["root#0", "p#1", "q#2", "x#1"]);
        assert_eq!(links[3].depth, 1);

        let mut registry = SnapshotRegistry::new();
        registry.add_build("x", 1, BuildResult::Failure, ["xena"]);
        let build = BuildRecord::new("app", 7, BuildResult::Failure).with_cause(root);
        let culprits: Vec<String> = UpstreamCulpritResolver::new(&registry)
            .with_limits(limits)
            .resolve(&build)
            .into_iter()
            .collect();
        assert_eq!(culprits, vec!["xena"]);
    }

    #[test]
    fn test_link_met_deep_first_is_expanded_again_from_shallower_depth() {
        let root = Cause::upstream(
            "root",
            0,
            vec![
                Cause::upstream(
                    "p",
                    1,
                    vec![Cause::upstream("x", 1, vec![Cause::upstream("y", 2, vec![])])],
                ),
                Cause::upstream("x", 1, vec![Cause::upstream("y", 2, vec![])]),
            ],
        );
        let limits = ResolverLimits {
            max_depth: 2,
            max_nodes: 100,
        };
        let links = flatten_upstream(&root, limits);
        assert_eq!(names(&links), vec!["root#0", "p#1", "x#1", "y#2"]);
        assert_eq!(links[3].depth, 2);
    }

    #[test]
    fn test_resolve_success_is_empty_even_with_upstream() {
        let mut registry = SnapshotRegistry::new();
        registry.add_build("lib", 3, BuildResult::Failure, ["alice"]);
        let build = BuildRecord::new("app", 10, BuildResult::Success)
            .with_cause(Cause::upstream("lib", 3, vec![]));

        let resolver = UpstreamCulpritResolver::new(&registry);
        assert!(resolver.resolve(&build).is_empty());
    }

    #[test]
    fn test_resolve_without_upstream_is_empty() {
        let registry = SnapshotRegistry::new();
        let build = BuildRecord::new("app", 10, BuildResult::Failure)
            .with_cause(Cause::direct("Started by user bob"))
            .with_culprits(["bob"]);

        let resolver = UpstreamCulpritResolver::new(&registry);
        assert!(resolver.resolve(&build).is_empty());
    }

    #[test]
    fn test_resolve_skips_lookup_misses() {
        let mut registry = SnapshotRegistry::new();
        registry.add_project("folder", ProjectKind::Folder);
        registry.add_build("folder", 1, BuildResult::Failure, ["hidden"]);
        registry.add_build("lib", 2, BuildResult::Failure, ["alice"]);

        let build = BuildRecord::new("app", 5, BuildResult::Failure).with_cause(Cause::upstream(
            "missing",
            1,
            vec![
                Cause::upstream("folder", 1, vec![]),
                Cause::upstream("lib", 99, vec![]),
                Cause::upstream("lib", 2, vec![]),
            ],
        ));

        let resolver = UpstreamCulpritResolver::new(&registry);
        let culprits: Vec<String> = resolver.resolve(&build).into_iter().collect();
        assert_eq!(culprits, vec!["alice"]);
    }
}
