//! Workflow notifications.
//!
//! Events are emitted after a mutation has been committed and are strictly
//! fire-and-forget: a failing or slow publisher never rolls back or delays
//! the workflow operation that produced the event.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::submission::SubmissionId;
use crate::domain::template::TemplateId;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    SubmissionCreated,
    ApprovalDecided,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubmissionCreated => "submission_created",
            Self::ApprovalDecided => "approval_decided",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub event_id: String,
    pub event_type: EventType,
    pub submission_id: SubmissionId,
    pub template_id: TemplateId,
    /// Who triggered the transition: the submitter or the approver.
    pub actor: String,
    pub metadata: BTreeMap<String, String>,
    pub occurred_at: DateTime<Utc>,
}

impl WorkflowEvent {
    pub fn new(
        event_type: EventType,
        submission_id: SubmissionId,
        template_id: TemplateId,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            event_type,
            submission_id,
            template_id,
            actor: actor.into(),
            metadata: BTreeMap::new(),
            occurred_at: Utc::now(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: WorkflowEvent);
}

/// Test double that records every published event.
#[derive(Clone, Default)]
pub struct InMemoryPublisher {
    events: Arc<Mutex<Vec<WorkflowEvent>>>,
}

impl InMemoryPublisher {
    pub fn events(&self) -> Vec<WorkflowEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl EventPublisher for InMemoryPublisher {
    fn publish(&self, event: WorkflowEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

/// Production publisher: structured log lines, one per event.
#[derive(Clone, Debug, Default)]
pub struct TracingPublisher;

impl EventPublisher for TracingPublisher {
    fn publish(&self, event: WorkflowEvent) {
        tracing::info!(
            event_id = %event.event_id,
            event_type = event.event_type.as_str(),
            submission_id = %event.submission_id,
            template_id = %event.template_id,
            actor = %event.actor,
            metadata = ?event.metadata,
            "workflow event published"
        );
    }
}
