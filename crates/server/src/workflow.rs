//! Service layer tying the pure workflow engines to persistence and
//! notifications. Every mutation follows the same shape: load, run the
//! domain engine, persist, then publish. Events go out only after the
//! write has succeeded.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;

use formflow_core::decision::DecisionEngine;
use formflow_core::domain::assignment::{Assignment, AssignmentId};
use formflow_core::domain::submission::{Decision, Submission, SubmissionData, SubmissionId};
use formflow_core::domain::template::{FormTemplate, TemplateId};
use formflow_core::lifecycle::LifecycleEngine;
use formflow_core::notify::{EventPublisher, EventType, WorkflowEvent};
use formflow_core::reporting::{
    approver_breakdown, compute_stats, ApproverLevelStats, TemplateStats,
};
use formflow_core::tracker::AssignmentTracker;
use formflow_core::WorkflowError;
use formflow_db::repositories::{
    AssignmentRepository, RepositoryError, SubmissionRepository, TemplateStore,
};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("storage failure: {0}")]
    Storage(RepositoryError),
}

impl ServiceError {
    /// Stable machine-readable identifier, mirrored into API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Workflow(error) => error.kind(),
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::VersionConflict { id, expected_version, .. } => {
                Self::Workflow(WorkflowError::ConcurrentModification { id, expected_version })
            }
            other => Self::Storage(other),
        }
    }
}

#[derive(Debug)]
pub struct BulkDecisionFailure {
    pub submission_id: SubmissionId,
    pub kind: &'static str,
    pub reason: String,
}

/// Per-item outcome of a bulk decision. One bad item never blocks the rest.
#[derive(Debug, Default)]
pub struct BulkDecisionReport {
    pub succeeded: Vec<SubmissionId>,
    pub failed: Vec<BulkDecisionFailure>,
}

pub struct WorkflowService {
    templates: Arc<dyn TemplateStore>,
    submissions: Arc<dyn SubmissionRepository>,
    assignments: Arc<dyn AssignmentRepository>,
    publisher: Arc<dyn EventPublisher>,
    lifecycle: LifecycleEngine,
    decisions: DecisionEngine,
    tracker: AssignmentTracker,
}

impl WorkflowService {
    pub fn new(
        templates: Arc<dyn TemplateStore>,
        submissions: Arc<dyn SubmissionRepository>,
        assignments: Arc<dyn AssignmentRepository>,
        publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            templates,
            submissions,
            assignments,
            publisher,
            lifecycle: LifecycleEngine::new(),
            decisions: DecisionEngine::new(),
            tracker: AssignmentTracker::new(),
        }
    }

    /// Finalize a submission against a template and, when one is given,
    /// fill the employee's assignment in the same operation.
    pub async fn create_submission(
        &self,
        template_id: &TemplateId,
        data: SubmissionData,
        submitted_by: &str,
        assignment_id: Option<&AssignmentId>,
    ) -> Result<Submission, ServiceError> {
        let template = self.require_template(template_id).await?;
        let assignment = match assignment_id {
            Some(id) => Some(self.require_assignment(id).await?),
            None => None,
        };

        let submission = self.lifecycle.create_submission(&template, data, submitted_by)?;
        // The assignment update carries the version check, so it runs before
        // the insert; a lost race then leaves no submission row behind.
        if let Some(assignment) = assignment {
            let filled = self.tracker.mark_filled(assignment, &submission)?;
            self.assignments.update(filled).await?;
        }
        self.submissions.insert(submission.clone()).await?;

        info!(
            event_name = "workflow.submission.created",
            submission_id = %submission.id,
            template_id = %submission.template_id,
            status = submission.status.as_str(),
            "submission created"
        );
        self.publisher.publish(
            WorkflowEvent::new(
                EventType::SubmissionCreated,
                submission.id.clone(),
                submission.template_id.clone(),
                submitted_by,
            )
            .with_metadata("status", submission.status.as_str()),
        );

        Ok(submission)
    }

    /// Store work-in-progress data. Drafts skip required-field checks and
    /// emit no event; nothing downstream cares until finalization. An
    /// assignment is filled when the form is finalized, never by a draft.
    pub async fn save_draft(
        &self,
        template_id: &TemplateId,
        data: SubmissionData,
        submitted_by: &str,
        assignment_id: Option<&AssignmentId>,
    ) -> Result<Submission, ServiceError> {
        if assignment_id.is_some() {
            return Err(WorkflowError::Validation(
                "a draft cannot fill an assignment; pass assignment_id when finalizing"
                    .to_string(),
            )
            .into());
        }
        let template = self.require_template(template_id).await?;
        let draft = self.lifecycle.save_draft(&template, data, submitted_by)?;
        self.submissions.insert(draft.clone()).await?;

        info!(
            event_name = "workflow.submission.draft_saved",
            submission_id = %draft.id,
            template_id = %draft.template_id,
            "draft saved"
        );
        Ok(draft)
    }

    pub async fn get_submission(&self, id: &SubmissionId) -> Result<Submission, ServiceError> {
        self.require_submission(id).await
    }

    /// Re-enter the approval chain after an edit. Allowed from drafts and
    /// rejected submissions only; prior decisions are discarded. A draft
    /// written against an assignment fills it here, at finalization.
    pub async fn resubmit(
        &self,
        id: &SubmissionId,
        data: SubmissionData,
        assignment_id: Option<&AssignmentId>,
    ) -> Result<Submission, ServiceError> {
        let submission = self.require_submission(id).await?;
        let template = self.require_template(&submission.template_id).await?;
        let assignment = match assignment_id {
            Some(id) => Some(self.require_assignment(id).await?),
            None => None,
        };
        let actor = submission.submitted_by.clone();

        let updated = self.lifecycle.edit_and_resubmit(&template, submission, data)?;
        if let Some(assignment) = assignment {
            let filled = self.tracker.mark_filled(assignment, &updated)?;
            self.assignments.update(filled).await?;
        }
        self.submissions.update(updated.clone()).await?;

        info!(
            event_name = "workflow.submission.resubmitted",
            submission_id = %updated.id,
            template_id = %updated.template_id,
            status = updated.status.as_str(),
            "submission resubmitted"
        );
        self.publisher.publish(
            WorkflowEvent::new(
                EventType::SubmissionCreated,
                updated.id.clone(),
                updated.template_id.clone(),
                actor,
            )
            .with_metadata("status", updated.status.as_str())
            .with_metadata("resubmitted", "true"),
        );

        Ok(updated)
    }

    pub async fn decide(
        &self,
        id: &SubmissionId,
        level: u32,
        approver_id: &str,
        decision: Decision,
        comments: Option<String>,
    ) -> Result<Submission, ServiceError> {
        let submission = self.require_submission(id).await?;
        let template = self.require_template(&submission.template_id).await?;

        let outcome =
            self.decisions.apply_decision(&template, submission, level, approver_id, decision, comments)?;
        self.submissions.update(outcome.submission.clone()).await?;

        info!(
            event_name = "workflow.decision.applied",
            submission_id = %outcome.submission.id,
            level = outcome.event.level,
            decision = outcome.event.decision.as_str(),
            status = outcome.submission.status.as_str(),
            "approval decision applied"
        );
        self.publisher.publish(
            WorkflowEvent::new(
                EventType::ApprovalDecided,
                outcome.submission.id.clone(),
                outcome.submission.template_id.clone(),
                approver_id,
            )
            .with_metadata("decision", outcome.event.decision.as_str())
            .with_metadata("level", outcome.event.level.to_string())
            .with_metadata("status", outcome.submission.status.as_str()),
        );

        Ok(outcome.submission)
    }

    /// Apply one approver's decision across many submissions, each at its
    /// own current level. Items are independent: a failed item is reported
    /// and the rest proceed.
    pub async fn bulk_decide(
        &self,
        submission_ids: Vec<SubmissionId>,
        approver_id: &str,
        decision: Decision,
        comments: Option<String>,
    ) -> BulkDecisionReport {
        let mut report = BulkDecisionReport::default();

        for id in submission_ids {
            let outcome = match self.require_submission(&id).await {
                Ok(submission) => {
                    self.decide(&id, submission.current_level, approver_id, decision, comments.clone())
                        .await
                }
                Err(error) => Err(error),
            };
            match outcome {
                Ok(submission) => report.succeeded.push(submission.id),
                Err(error) => report.failed.push(BulkDecisionFailure {
                    submission_id: id,
                    kind: error.kind(),
                    reason: error.to_string(),
                }),
            }
        }

        info!(
            event_name = "workflow.decision.bulk_applied",
            approver_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "bulk decision processed"
        );
        report
    }

    pub async fn create_assignments(
        &self,
        template_ids: &[TemplateId],
        employee_id: &str,
        due_date: Option<DateTime<Utc>>,
    ) -> Result<Vec<Assignment>, ServiceError> {
        let mut templates = Vec::with_capacity(template_ids.len());
        for template_id in template_ids {
            templates.push(self.require_template(template_id).await?);
        }
        let batch = self.tracker.create_assignments(&templates, employee_id, due_date)?;
        self.assignments.insert_many(batch.clone()).await?;

        info!(
            event_name = "workflow.assignment.created",
            employee_id,
            count = batch.len(),
            "assignments created"
        );
        Ok(batch)
    }

    pub async fn assignments_for_employee(
        &self,
        employee_id: &str,
    ) -> Result<Vec<Assignment>, ServiceError> {
        Ok(self.assignments.list_by_employee(employee_id).await?)
    }

    /// Remove an assignment. Filled and submitted assignments are part of
    /// the audit trail and stay.
    pub async fn delete_assignment(&self, id: &AssignmentId) -> Result<(), ServiceError> {
        let assignment = self.require_assignment(id).await?;
        self.tracker.ensure_deletable(&assignment)?;
        self.assignments.delete(id).await?;

        info!(
            event_name = "workflow.assignment.deleted",
            assignment_id = %id,
            "assignment deleted"
        );
        Ok(())
    }

    pub async fn template_stats(
        &self,
        template_id: &TemplateId,
    ) -> Result<TemplateStats, ServiceError> {
        self.require_template(template_id).await?;
        let submissions = self.submissions.list_by_template(template_id).await?;
        Ok(compute_stats(&submissions))
    }

    pub async fn template_approver_breakdown(
        &self,
        template_id: &TemplateId,
    ) -> Result<Vec<ApproverLevelStats>, ServiceError> {
        let template = self.require_template(template_id).await?;
        let submissions = self.submissions.list_by_template(template_id).await?;
        Ok(approver_breakdown(&template, &submissions))
    }

    async fn require_template(&self, id: &TemplateId) -> Result<FormTemplate, ServiceError> {
        self.templates
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::TemplateNotFound(id.clone()).into())
    }

    async fn require_submission(&self, id: &SubmissionId) -> Result<Submission, ServiceError> {
        self.submissions
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::SubmissionNotFound(id.clone()).into())
    }

    async fn require_assignment(&self, id: &AssignmentId) -> Result<Assignment, ServiceError> {
        self.assignments
            .find_by_id(id)
            .await?
            .ok_or_else(|| WorkflowError::AssignmentNotFound(id.clone()).into())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use formflow_core::domain::assignment::{Assignment, AssignmentId, AssignmentStatus};
    use formflow_core::domain::submission::{Decision, SubmissionData, SubmissionId, SubmissionStatus};
    use formflow_core::domain::template::{ApprovalChain, ApproverLevel, FormTemplate, TemplateId};
    use formflow_core::notify::{EventType, InMemoryPublisher};
    use formflow_core::WorkflowError;
    use formflow_db::repositories::{
        AssignmentRepository, InMemoryAssignmentRepository, InMemorySubmissionRepository,
        InMemoryTemplateStore, RepositoryError, SubmissionRepository, TemplateStore,
    };

    use super::{ServiceError, WorkflowService};

    struct Harness {
        service: WorkflowService,
        publisher: InMemoryPublisher,
    }

    async fn harness(templates: Vec<FormTemplate>) -> Harness {
        let store = Arc::new(InMemoryTemplateStore::default());
        for template in templates {
            store.save(template).await.expect("save template");
        }
        let publisher = InMemoryPublisher::default();

        let service = WorkflowService::new(
            store,
            Arc::new(InMemorySubmissionRepository::default()),
            Arc::new(InMemoryAssignmentRepository::default()),
            Arc::new(publisher.clone()),
        );
        Harness { service, publisher }
    }

    fn expense_template() -> FormTemplate {
        FormTemplate {
            id: TemplateId("tpl-expense".into()),
            name: "Expense Report".into(),
            required_fields: vec!["amount".into(), "reason".into()],
            chain: ApprovalChain(vec![
                ApproverLevel {
                    level: 1,
                    approver_id: "alice".into(),
                    approver_name: "Alice".into(),
                },
                ApproverLevel {
                    level: 2,
                    approver_id: "bob".into(),
                    approver_name: "Bob".into(),
                },
            ]),
            is_reusable: true,
            archived: false,
        }
    }

    fn survey_template() -> FormTemplate {
        FormTemplate {
            id: TemplateId("tpl-survey".into()),
            name: "Pulse Survey".into(),
            required_fields: vec!["answer".into()],
            chain: ApprovalChain(vec![]),
            is_reusable: true,
            archived: false,
        }
    }

    fn expense_data() -> SubmissionData {
        let mut data = SubmissionData::new();
        data.insert("amount".into(), json!(120.5));
        data.insert("reason".into(), json!("team offsite"));
        data
    }

    #[tokio::test]
    async fn creating_a_chained_submission_enters_approval_and_publishes() {
        let h = harness(vec![expense_template()]).await;

        let submission = h
            .service
            .create_submission(&TemplateId("tpl-expense".into()), expense_data(), "carol", None)
            .await
            .expect("create");

        assert_eq!(submission.status, SubmissionStatus::InApproval);
        assert_eq!(submission.current_level, 1);

        let events = h.publisher.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::SubmissionCreated);
        assert_eq!(events[0].submission_id, submission.id);
        assert_eq!(events[0].actor, "carol");
    }

    #[tokio::test]
    async fn chainless_submission_fills_its_assignment_as_submitted() {
        let h = harness(vec![survey_template()]).await;
        let template_id = TemplateId("tpl-survey".into());

        let assignment = h
            .service
            .create_assignments(std::slice::from_ref(&template_id), "dave", None)
            .await
            .expect("assign")
            .remove(0);

        let mut data = SubmissionData::new();
        data.insert("answer".into(), json!("all good"));
        let submission = h
            .service
            .create_submission(&template_id, data, "dave", Some(&assignment.id))
            .await
            .expect("create");
        assert_eq!(submission.status, SubmissionStatus::Submitted);

        let stored = h
            .service
            .assignments_for_employee("dave")
            .await
            .expect("list")
            .remove(0);
        assert_eq!(stored.status, AssignmentStatus::Submitted);
        assert_eq!(stored.linked_submission_id, Some(submission.id));
    }

    #[tokio::test]
    async fn full_two_level_approval_reaches_approved() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let submission = h
            .service
            .create_submission(&template_id, expense_data(), "carol", None)
            .await
            .expect("create");

        let after_alice = h
            .service
            .decide(&submission.id, 1, "alice", Decision::Approved, Some("ok".into()))
            .await
            .expect("level 1");
        assert_eq!(after_alice.status, SubmissionStatus::InApproval);
        assert_eq!(after_alice.current_level, 2);

        let after_bob = h
            .service
            .decide(&submission.id, 2, "bob", Decision::Approved, None)
            .await
            .expect("level 2");
        assert_eq!(after_bob.status, SubmissionStatus::Approved);
        assert_eq!(after_bob.approval_history.len(), 2);

        let events = h.publisher.events();
        let decided: Vec<_> =
            events.iter().filter(|e| e.event_type == EventType::ApprovalDecided).collect();
        assert_eq!(decided.len(), 2);
        assert_eq!(decided[1].metadata.get("status").map(String::as_str), Some("approved"));
    }

    #[tokio::test]
    async fn rejection_then_resubmit_re_enters_the_chain() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let submission = h
            .service
            .create_submission(&template_id, expense_data(), "carol", None)
            .await
            .expect("create");
        let rejected = h
            .service
            .decide(&submission.id, 1, "alice", Decision::Rejected, Some("missing receipt".into()))
            .await
            .expect("reject");
        assert_eq!(rejected.status, SubmissionStatus::Rejected);

        let mut fixed = expense_data();
        fixed.insert("receipt".into(), json!("receipt.pdf"));
        let resubmitted =
            h.service.resubmit(&submission.id, fixed, None).await.expect("resubmit");

        assert_eq!(resubmitted.status, SubmissionStatus::InApproval);
        assert_eq!(resubmitted.current_level, 1);
        assert!(resubmitted.approval_history.is_empty());
        assert_eq!(resubmitted.version, 3);

        let resubmit_event = h
            .publisher
            .events()
            .into_iter()
            .find(|e| e.metadata.get("resubmitted").is_some())
            .expect("resubmit event");
        assert_eq!(resubmit_event.event_type, EventType::SubmissionCreated);
    }

    /// Assignment store whose version check always fails, as if another
    /// writer got there first every time.
    struct ContendedAssignments {
        inner: InMemoryAssignmentRepository,
    }

    #[async_trait::async_trait]
    impl AssignmentRepository for ContendedAssignments {
        async fn find_by_id(
            &self,
            id: &AssignmentId,
        ) -> Result<Option<Assignment>, RepositoryError> {
            self.inner.find_by_id(id).await
        }

        async fn insert_many(&self, assignments: Vec<Assignment>) -> Result<(), RepositoryError> {
            self.inner.insert_many(assignments).await
        }

        async fn update(&self, assignment: Assignment) -> Result<(), RepositoryError> {
            Err(RepositoryError::VersionConflict {
                entity: "assignment",
                id: assignment.id.0.clone(),
                expected_version: assignment.version.saturating_sub(1),
            })
        }

        async fn list_by_employee(
            &self,
            employee_id: &str,
        ) -> Result<Vec<Assignment>, RepositoryError> {
            self.inner.list_by_employee(employee_id).await
        }

        async fn list_by_template(
            &self,
            template_id: &TemplateId,
        ) -> Result<Vec<Assignment>, RepositoryError> {
            self.inner.list_by_template(template_id).await
        }

        async fn delete(&self, id: &AssignmentId) -> Result<(), RepositoryError> {
            self.inner.delete(id).await
        }
    }

    #[tokio::test]
    async fn lost_assignment_race_leaves_no_submission_behind() {
        let store = Arc::new(InMemoryTemplateStore::default());
        store.save(survey_template()).await.expect("save template");
        let submissions = Arc::new(InMemorySubmissionRepository::default());
        let service = WorkflowService::new(
            store,
            submissions.clone(),
            Arc::new(ContendedAssignments { inner: InMemoryAssignmentRepository::default() }),
            Arc::new(InMemoryPublisher::default()),
        );

        let template_id = TemplateId("tpl-survey".into());
        let assignment = service
            .create_assignments(std::slice::from_ref(&template_id), "dave", None)
            .await
            .expect("assign")
            .remove(0);

        let mut data = SubmissionData::new();
        data.insert("answer".into(), json!("fine"));
        let error = service
            .create_submission(&template_id, data, "dave", Some(&assignment.id))
            .await
            .expect_err("assignment race");
        assert_eq!(error.kind(), "concurrent_modification");

        let stored = submissions.list_by_template(&template_id).await.expect("list");
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn draft_then_finalize_fills_the_assignment() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let assignment = h
            .service
            .create_assignments(std::slice::from_ref(&template_id), "carol", None)
            .await
            .expect("assign")
            .remove(0);

        let draft = h
            .service
            .save_draft(&template_id, SubmissionData::new(), "carol", None)
            .await
            .expect("draft");
        assert_eq!(draft.status, SubmissionStatus::Draft);

        let finalized = h
            .service
            .resubmit(&draft.id, expense_data(), Some(&assignment.id))
            .await
            .expect("finalize");
        assert_eq!(finalized.status, SubmissionStatus::InApproval);

        let stored = h
            .service
            .assignments_for_employee("carol")
            .await
            .expect("list")
            .remove(0);
        assert_eq!(stored.status, AssignmentStatus::Filled);
        assert_eq!(stored.linked_submission_id, Some(finalized.id));
    }

    #[tokio::test]
    async fn drafts_never_fill_an_assignment() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let assignment = h
            .service
            .create_assignments(std::slice::from_ref(&template_id), "carol", None)
            .await
            .expect("assign")
            .remove(0);

        let error = h
            .service
            .save_draft(&template_id, SubmissionData::new(), "carol", Some(&assignment.id))
            .await
            .expect_err("draft with assignment");
        assert_eq!(error.kind(), "validation_error");

        let stored = h
            .service
            .assignments_for_employee("carol")
            .await
            .expect("list")
            .remove(0);
        assert_eq!(stored.status, AssignmentStatus::Pending);
    }

    #[tokio::test]
    async fn bulk_decide_reports_per_item_failures() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let first = h
            .service
            .create_submission(&template_id, expense_data(), "carol", None)
            .await
            .expect("create");
        let second = h
            .service
            .create_submission(&template_id, expense_data(), "dave", None)
            .await
            .expect("create");

        // The second submission is already terminal when the bulk call runs.
        h.service
            .decide(&second.id, 1, "alice", Decision::Rejected, None)
            .await
            .expect("reject");

        let report = h
            .service
            .bulk_decide(
                vec![first.id.clone(), SubmissionId("missing".into()), second.id.clone()],
                "alice",
                Decision::Approved,
                None,
            )
            .await;

        assert_eq!(report.succeeded, vec![first.id]);
        assert_eq!(report.failed.len(), 2);
        assert_eq!(report.failed[0].kind, "submission_not_found");
        assert_eq!(report.failed[1].kind, "not_pending");
        assert_eq!(report.failed[1].submission_id, second.id);
    }

    #[test]
    fn version_conflicts_surface_as_concurrent_modification() {
        let error: ServiceError = RepositoryError::VersionConflict {
            entity: "submission",
            id: "sub-1".into(),
            expected_version: 1,
        }
        .into();

        assert_eq!(error.kind(), "concurrent_modification");
        assert!(matches!(
            error,
            ServiceError::Workflow(WorkflowError::ConcurrentModification {
                expected_version: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn assignments_delete_only_while_pending() {
        let h = harness(vec![survey_template()]).await;
        let template_id = TemplateId("tpl-survey".into());

        let assignment = h
            .service
            .create_assignments(std::slice::from_ref(&template_id), "erin", None)
            .await
            .expect("assign")
            .remove(0);

        let mut data = SubmissionData::new();
        data.insert("answer".into(), json!("fine"));
        h.service
            .create_submission(&template_id, data, "erin", Some(&assignment.id))
            .await
            .expect("create");

        let error =
            h.service.delete_assignment(&assignment.id).await.expect_err("filled assignment");
        assert_eq!(error.kind(), "invalid_state");
    }

    #[tokio::test]
    async fn stats_and_breakdown_read_through_the_service() {
        let h = harness(vec![expense_template()]).await;
        let template_id = TemplateId("tpl-expense".into());

        let first = h
            .service
            .create_submission(&template_id, expense_data(), "carol", None)
            .await
            .expect("create");
        h.service
            .decide(&first.id, 1, "alice", Decision::Approved, None)
            .await
            .expect("level 1");
        h.service
            .decide(&first.id, 2, "bob", Decision::Approved, None)
            .await
            .expect("level 2");

        let second = h
            .service
            .create_submission(&template_id, expense_data(), "dave", None)
            .await
            .expect("create");
        h.service
            .decide(&second.id, 1, "alice", Decision::Rejected, None)
            .await
            .expect("reject");

        let stats = h.service.template_stats(&template_id).await.expect("stats");
        assert_eq!(stats.total, 2);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.rejected, 1);
        assert!((stats.approval_rate - 0.5).abs() < f64::EPSILON);

        let breakdown =
            h.service.template_approver_breakdown(&template_id).await.expect("breakdown");
        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].approver_id, "alice");
        assert_eq!(breakdown[0].approved, 1);
        assert_eq!(breakdown[0].rejected, 1);
        assert_eq!(breakdown[1].approver_id, "bob");
        assert_eq!(breakdown[1].approved, 1);
    }

    #[tokio::test]
    async fn unknown_template_is_reported_as_not_found() {
        let h = harness(vec![]).await;

        let error = h
            .service
            .create_submission(&TemplateId("missing".into()), expense_data(), "carol", None)
            .await
            .expect_err("missing template");
        assert_eq!(error.kind(), "template_not_found");

        let error =
            h.service.template_stats(&TemplateId("missing".into())).await.expect_err("stats");
        assert_eq!(error.kind(), "template_not_found");
    }
}
