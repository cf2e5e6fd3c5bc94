//! Message composition.
//!
//! A message is an ordered list of typed segments rendered to a single
//! string at the end. Absent facts simply contribute no segment, so there
//! are never stray separators.

use std::collections::BTreeSet;

use crate::culprits::{ResolverLimits, UpstreamCulpritResolver};
use crate::domain::{BuildRecord, BuildResult, Cause, ChangeSet, UserId};
use crate::registry::BuildRegistry;

/// One piece of a notification message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `"{project} - {display name} "`
    Header {
        project: String,
        display_name: String,
    },
    /// Human readable status of the build.
    Status(BuildResult),
    /// `"**{n} failed [{diff}]**"`
    TestFailures { fail_count: u32, diff_text: String },
    /// `" changes by: @a,@b"`
    Blame(BTreeSet<UserId>),
    /// `" after {duration}"`
    Duration(String),
    /// Free text, rendered verbatim.
    Text(String),
    /// `" (Open: {url})"`
    OpenLink(String),
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Segment::Header {
                project,
                display_name,
            } => write!(f, "{} - {} ", project, display_name),
            Segment::Status(result) => f.write_str(result.status_text()),
            Segment::TestFailures {
                fail_count,
                diff_text,
            } => write!(f, "**{} failed [{}]**", fail_count, diff_text),
            Segment::Blame(users) => {
                f.write_str(" changes by: ")?;
                for (i, user) in users.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "@{}", user)?;
                }
                Ok(())
            }
            Segment::Duration(duration) => write!(f, " after {}", duration),
            Segment::Text(text) => f.write_str(text),
            Segment::OpenLink(url) => write!(f, " (Open: {})", url),
        }
    }
}

/// Builder collecting segments for one build.
///
/// Every message starts with the header; conditional segments are only
/// pushed when their fact is present.
#[derive(Debug, Clone)]
pub struct MessageBuilder<'b> {
    build: &'b BuildRecord,
    segments: Vec<Segment>,
}

impl<'b> MessageBuilder<'b> {
    pub fn new(build: &'b BuildRecord) -> Self {
        Self {
            build,
            segments: vec![Segment::Header {
                project: build.project.clone(),
                display_name: build.display_name.clone(),
            }],
        }
    }

    pub fn status(mut self) -> Self {
        self.segments.push(Segment::Status(self.build.result));
        self
    }

    /// Pushed only when at least one test failed.
    pub fn test_results(mut self) -> Self {
        if let Some(summary) = self.build.failed_tests() {
            self.segments.push(Segment::TestFailures {
                fail_count: summary.fail_count,
                diff_text: summary.diff_text.clone(),
            });
        }
        self
    }

    /// Pushed only when `culprits` is non-empty.
    pub fn blame(mut self, culprits: BTreeSet<UserId>) -> Self {
        if !culprits.is_empty() {
            self.segments.push(Segment::Blame(culprits));
        }
        self
    }

    pub fn duration(mut self) -> Self {
        self.segments.push(Segment::Duration(self.build.duration.clone()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.segments.push(Segment::Text(text.into()));
        self
    }

    /// Link to the build; `server_url` is prefixed verbatim to the build url.
    pub fn open_link(mut self, server_url: &str) -> Self {
        self.segments
            .push(Segment::OpenLink(format!("{}{}", server_url, self.build.url)));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for MessageBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Text describing the changes that started a build.
pub fn describe_changes(changes: &ChangeSet) -> String {
    let authors: Vec<&str> = changes.author_names().into_iter().collect();
    format!(
        "Started by changes from {} ({} file(s) changed)",
        authors.join(", "),
        changes.affected_files().len()
    )
}

/// Composes the three message variants for a build.
pub struct MessageComposer<'r> {
    server_url: &'r str,
    registry: &'r dyn BuildRegistry,
    limits: ResolverLimits,
}

impl<'r> MessageComposer<'r> {
    pub fn new(server_url: &'r str, registry: &'r dyn BuildRegistry) -> Self {
        Self {
            server_url,
            registry,
            limits: ResolverLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResolverLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Header, status, test failures, blame, duration and link.
    pub fn full_status(&self, build: &BuildRecord) -> String {
        let culprits = UpstreamCulpritResolver::new(self.registry)
            .with_limits(self.limits)
            .resolve(build);
        MessageBuilder::new(build)
            .status()
            .test_results()
            .blame(culprits)
            .duration()
            .open_link(self.server_url)
            .render()
    }

    /// Header, change summary and link.
    pub fn started_by_changes(&self, build: &BuildRecord, changes: &ChangeSet) -> String {
        MessageBuilder::new(build)
            .text(describe_changes(changes))
            .open_link(self.server_url)
            .render()
    }

    /// Header, cause description and link.
    pub fn started_by_cause(&self, build: &BuildRecord, cause: &Cause) -> String {
        MessageBuilder::new(build)
            .text(cause.short_description())
            .open_link(self.server_url)
            .render()
    }
}
