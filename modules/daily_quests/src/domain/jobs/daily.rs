use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{DailyJobSummary, JobFailure, NotifiableUser};
use crate::domain::assignments::AssignmentService;
use crate::domain::clock::Clock;
use crate::domain::error::DomainError;
use crate::domain::jobs::SendPacer;
use crate::domain::notification::NotificationComposer;
use crate::domain::repo::{AssignmentRepository, QuestRepository, UserDirectory};
use crate::domain::sender::NotificationSender;

/// Assigns today's quest to every notifiable user and mails it once.
pub struct DailyAssignmentJob {
    users: Arc<dyn UserDirectory>,
    assignments: Arc<AssignmentService>,
    assignment_repo: Arc<dyn AssignmentRepository>,
    quests: Arc<dyn QuestRepository>,
    composer: Arc<NotificationComposer>,
    sender: Arc<NotificationSender>,
    clock: Arc<dyn Clock>,
    send_interval: Duration,
}

impl DailyAssignmentJob {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserDirectory>,
        assignments: Arc<AssignmentService>,
        assignment_repo: Arc<dyn AssignmentRepository>,
        quests: Arc<dyn QuestRepository>,
        composer: Arc<NotificationComposer>,
        sender: Arc<NotificationSender>,
        clock: Arc<dyn Clock>,
        send_interval: Duration,
    ) -> Self {
        Self {
            users,
            assignments,
            assignment_repo,
            quests,
            composer,
            sender,
            clock,
            send_interval,
        }
    }

    /// One pass over all users. Per-user failures are collected into the
    /// summary; only configuration problems abort the run.
    #[instrument(name = "daily_quests.job.daily", skip(self))]
    pub async fn run(&self) -> Result<DailyJobSummary, DomainError> {
        let today = self.clock.today();
        let mut summary = DailyJobSummary::new(today);
        let mut pacer = SendPacer::new(self.send_interval);

        let users = self
            .users
            .list_notifiable()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(%today, users = users.len(), "Daily assignment job started");

        for user in &users {
            summary.processed += 1;
            if let Err(e) = self.process_user(user, &mut summary, &mut pacer).await {
                if e.is_fatal() {
                    error!(user_id = %user.id, error = %e, "Daily job aborted");
                    return Err(e);
                }
                warn!(user_id = %user.id, error = %e, "Daily job failed for user");
                summary.errors.push(JobFailure {
                    user_id: user.id,
                    assignment_id: None,
                    email: Some(user.email.clone()),
                    error: e.to_string(),
                });
            }
        }

        info!(
            processed = summary.processed,
            newly_assigned = summary.newly_assigned,
            emailed = summary.emailed,
            already_emailed = summary.already_emailed,
            errors = summary.errors.len(),
            "Daily assignment job finished"
        );
        Ok(summary)
    }

    async fn process_user(
        &self,
        user: &NotifiableUser,
        summary: &mut DailyJobSummary,
        pacer: &mut SendPacer,
    ) -> Result<(), DomainError> {
        let today = summary.date;
        self.assignments.expire_before(user.id, today).await?;

        let ensured = self.assignments.ensure(user.id, today).await?;
        if ensured.created {
            summary.newly_assigned += 1;
        }
        let assignment = ensured.assignment;

        if assignment.emailed_at.is_some() {
            debug!(user_id = %user.id, "Already emailed today");
            summary.already_emailed += 1;
            return Ok(());
        }

        let quest = self
            .quests
            .find_by_id(assignment.quest_id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::quest_not_found(assignment.quest_id))?;

        let content = self
            .composer
            .compose(&quest, &user.display_name, &assignment)?;

        pacer.wait_turn().await;
        self.sender.send(&user.email, &content).await?;

        let marked = self
            .assignment_repo
            .mark_emailed(assignment.id, self.clock.now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !marked {
            warn!(assignment_id = %assignment.id, "Assignment was stamped by a concurrent run");
        }
        summary.emailed += 1;
        Ok(())
    }
}
