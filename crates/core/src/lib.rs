pub mod config;
pub mod decision;
pub mod domain;
pub mod errors;
pub mod lifecycle;
pub mod notify;
pub mod reporting;
pub mod tracker;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use decision::{DecisionEngine, DecisionOutcome};
pub use domain::assignment::{Assignment, AssignmentId, AssignmentStatus};
pub use domain::submission::{
    ApprovalEvent, Decision, Submission, SubmissionData, SubmissionId, SubmissionStatus,
};
pub use domain::template::{
    ApprovalChain, ApproverLevel, ChainError, FormTemplate, TemplateId,
};
pub use errors::WorkflowError;
pub use lifecycle::LifecycleEngine;
pub use notify::{EventPublisher, EventType, InMemoryPublisher, TracingPublisher, WorkflowEvent};
pub use reporting::{approver_breakdown, compute_stats, ApproverLevelStats, TemplateStats};
pub use tracker::AssignmentTracker;
