//! Lifecycle events received from the orchestrator and the notifications
//! produced for them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::build::BuildRecord;
use super::result::Color;

/// A build lifecycle callback.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "build", rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// The build has started running.
    Started(BuildRecord),

    /// The build has finished and its result is final.
    Completed(BuildRecord),

    /// Post-completion bookkeeping is done.
    Finalized(BuildRecord),

    /// The build record was deleted.
    Deleted(BuildRecord),
}

impl LifecycleEvent {
    pub fn build(&self) -> &BuildRecord {
        match self {
            LifecycleEvent::Started(b)
            | LifecycleEvent::Completed(b)
            | LifecycleEvent::Finalized(b)
            | LifecycleEvent::Deleted(b) => b,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::Started(_) => "started",
            LifecycleEvent::Completed(_) => "completed",
            LifecycleEvent::Finalized(_) => "finalized",
            LifecycleEvent::Deleted(_) => "deleted",
        }
    }
}

/// A message that was handed to the chat service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: Uuid,
    pub project: String,
    pub build_number: u64,
    pub message: String,
    pub color: Color,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(build: &BuildRecord, message: String, color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            project: build.project.clone(),
            build_number: build.number,
            message,
            color,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BuildResult;

    #[test]
    fn test_event_wire_format() {
        let json = r##"{
            "event": "completed",
            "build": {
                "project": "app",
                "display_name": "#9",
                "number": 9,
                "result": "unstable",
                "url": "job/app/9/"
            }
        }"##;
        let event: LifecycleEvent = serde_json::from_str(json).expect("deserialize");
        assert_eq!(event.name(), "completed");
        assert_eq!(event.build().result, BuildResult::Unstable);
    }

    #[test]
    fn test_notification_carries_build_identity() {
        let build = BuildRecord::new("app", 3, BuildResult::Failure);
        let n = Notification::new(&build, "boom".to_string(), Color::Red);
        assert_eq!(n.project, "app");
        assert_eq!(n.build_number, 3);
        assert_eq!(n.color, Color::Red);
    }
}
