//! Per-event notification dispatch.
//!
//! The dispatcher is invoked once per lifecycle event. It decides whether
//! the event is worth a message, composes it, and hands it to the chat
//! service, all within the call. It holds no state between events.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::chat::ChatService;
use crate::config::NotifierConfig;
use crate::domain::{BuildRecord, Color, LifecycleEvent, Notification};
use crate::error::{NotifyError, Result};
use crate::filter::smart_notify;
use crate::message::MessageComposer;
use crate::registry::BuildRegistry;

/// Routes lifecycle events to the chat service.
pub struct Dispatcher {
    config: NotifierConfig,
    registry: Arc<dyn BuildRegistry>,
    chat: Arc<dyn ChatService>,
}

impl Dispatcher {
    pub fn new(
        config: NotifierConfig,
        registry: Arc<dyn BuildRegistry>,
        chat: Arc<dyn ChatService>,
    ) -> Self {
        Self {
            config,
            registry,
            chat,
        }
    }

    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Handle one lifecycle event.
    ///
    /// Returns the notification that was sent, or `None` when the event was
    /// not announced. Start events are ignored unless start notifications
    /// are enabled for the job.
    pub async fn handle(&self, event: &LifecycleEvent) -> Result<Option<Notification>> {
        match event {
            LifecycleEvent::Started(build) => {
                if self.config.start_notification {
                    self.on_started(build).await.map(Some)
                } else {
                    debug!(project = %build.project, build = build.number, "Start notifications disabled");
                    Ok(None)
                }
            }
            LifecycleEvent::Completed(build) => self.on_completed(build).await,
            LifecycleEvent::Finalized(build) => {
                self.on_finalized(build);
                Ok(None)
            }
            LifecycleEvent::Deleted(build) => {
                self.on_deleted(build);
                Ok(None)
            }
        }
    }

    /// Announce a build start.
    ///
    /// Prefers the change set, then the triggering cause, and falls back to
    /// the full status message.
    pub async fn on_started(&self, build: &BuildRecord) -> Result<Notification> {
        let (message, color) = self.start_message(build);
        self.dispatch(build, message, color).await
    }

    /// Announce a completed build unless smart mode or the result filter
    /// suppresses it.
    pub async fn on_completed(&self, build: &BuildRecord) -> Result<Option<Notification>> {
        if !self.should_notify_completed(build) {
            debug!(
                project = %build.project,
                build = build.number,
                result = %build.result,
                "Completion notification suppressed"
            );
            return Ok(None);
        }
        let (message, color) = self.status_message(build);
        self.dispatch(build, message, color).await.map(Some)
    }

    pub fn on_finalized(&self, build: &BuildRecord) {
        debug!(project = %build.project, build = build.number, "Ignoring finalized event");
    }

    pub fn on_deleted(&self, build: &BuildRecord) {
        debug!(project = %build.project, build = build.number, "Ignoring deleted event");
    }

    pub fn should_notify_completed(&self, build: &BuildRecord) -> bool {
        let previous = build.previous.map(|p| p.result);
        if self.config.smart_notifications && !smart_notify(build.result, previous) {
            return false;
        }
        self.config.notify.allows(build.result)
    }

    /// Full status message and its color, without any gating.
    pub fn status_message(&self, build: &BuildRecord) -> (String, Color) {
        (
            self.composer().full_status(build),
            Color::for_result(build.result),
        )
    }

    /// Message and color used for a start notification.
    pub fn start_message(&self, build: &BuildRecord) -> (String, Color) {
        let composer = self.composer();

        if let Some(changes) = build.changes() {
            return (composer.started_by_changes(build, changes), Color::Green);
        }
        if !build.has_change_set_computed() {
            debug!(project = %build.project, build = build.number, "No change set computed");
        }

        let cause = build
            .cause
            .as_ref()
            .filter(|c| !c.short_description().trim().is_empty());
        match cause {
            Some(cause) => (composer.started_by_cause(build, cause), Color::Green),
            None => self.status_message(build),
        }
    }

    fn composer(&self) -> MessageComposer<'_> {
        MessageComposer::new(&self.config.server_url, self.registry.as_ref())
            .with_limits(self.config.limits)
    }

    async fn dispatch(
        &self,
        build: &BuildRecord,
        message: String,
        color: Color,
    ) -> Result<Notification> {
        match self.chat.publish(&message, color).await {
            Ok(()) => {
                info!(
                    project = %build.project,
                    build = build.number,
                    room = %self.config.room,
                    color = %color,
                    "Notification sent"
                );
                Ok(Notification::new(build, message, color))
            }
            Err(err) => {
                error!(
                    project = %build.project,
                    build = build.number,
                    room = %self.config.room,
                    error = %err,
                    "Failed to publish notification"
                );
                Err(NotifyError::Publish {
                    project: build.project.clone(),
                    build: build.number,
                    source: err,
                })
            }
        }
    }
}
