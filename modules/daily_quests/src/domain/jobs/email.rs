use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, instrument, warn};

use crate::contract::model::{EmailJobSummary, JobFailure};
use crate::domain::clock::Clock;
use crate::domain::error::DomainError;
use crate::domain::jobs::SendPacer;
use crate::domain::notification::NotificationComposer;
use crate::domain::repo::{AssignmentRepository, PendingNotification};
use crate::domain::sender::NotificationSender;

/// Mails today's assignments that were created but never emailed.
/// Never creates assignments.
pub struct EmailOnlyJob {
    assignments: Arc<dyn AssignmentRepository>,
    composer: Arc<NotificationComposer>,
    sender: Arc<NotificationSender>,
    clock: Arc<dyn Clock>,
    send_interval: Duration,
}

enum RowOutcome {
    Sent,
    AlreadyEmailed,
    MissingEmail,
    MissingQuest,
}

impl EmailOnlyJob {
    pub fn new(
        assignments: Arc<dyn AssignmentRepository>,
        composer: Arc<NotificationComposer>,
        sender: Arc<NotificationSender>,
        clock: Arc<dyn Clock>,
        send_interval: Duration,
    ) -> Self {
        Self {
            assignments,
            composer,
            sender,
            clock,
            send_interval,
        }
    }

    #[instrument(name = "daily_quests.job.emails", skip(self))]
    pub async fn run(&self) -> Result<EmailJobSummary, DomainError> {
        let today = self.clock.today();
        let mut summary = EmailJobSummary::new(today);
        let mut pacer = SendPacer::new(self.send_interval);

        let pending = self
            .assignments
            .get_needing_email(today)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        info!(%today, pending = pending.len(), "Email-only job started");

        for row in &pending {
            summary.attempted += 1;
            match self.process(row, &mut pacer).await {
                Ok(RowOutcome::Sent) => summary.sent += 1,
                Ok(RowOutcome::AlreadyEmailed) => summary.skipped_already_emailed += 1,
                Ok(RowOutcome::MissingEmail) => summary.skipped_missing_email += 1,
                Ok(RowOutcome::MissingQuest) => summary.skipped_missing_quest += 1,
                Err(e) if e.is_fatal() => {
                    error!(assignment_id = %row.assignment.id, error = %e, "Email-only job aborted");
                    return Err(e);
                }
                Err(e) => {
                    warn!(assignment_id = %row.assignment.id, error = %e, "Notification failed");
                    summary.failures.push(JobFailure {
                        user_id: row.assignment.user_id,
                        assignment_id: Some(row.assignment.id),
                        email: row
                            .user
                            .as_ref()
                            .and_then(|u| u.deliverable_email())
                            .map(str::to_string),
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            attempted = summary.attempted,
            sent = summary.sent,
            skipped_already_emailed = summary.skipped_already_emailed,
            skipped_missing_email = summary.skipped_missing_email,
            skipped_missing_quest = summary.skipped_missing_quest,
            failures = summary.failures.len(),
            "Email-only job finished"
        );
        Ok(summary)
    }

    async fn process(
        &self,
        row: &PendingNotification,
        pacer: &mut SendPacer,
    ) -> Result<RowOutcome, DomainError> {
        let Some(user) = row.user.as_ref() else {
            return Ok(RowOutcome::MissingEmail);
        };
        let Some(to) = user.deliverable_email() else {
            return Ok(RowOutcome::MissingEmail);
        };
        let Some(quest) = row.quest.as_ref() else {
            return Ok(RowOutcome::MissingQuest);
        };

        // Another job may have mailed it since the pending list was read.
        let fresh = self
            .assignments
            .find_by_id(row.assignment.id)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?
            .ok_or_else(|| DomainError::assignment_not_found(row.assignment.id))?;
        if fresh.emailed_at.is_some() {
            debug!(assignment_id = %fresh.id, "Already emailed, skipping");
            return Ok(RowOutcome::AlreadyEmailed);
        }

        let content = self.composer.compose(quest, &user.display_name, &fresh)?;
        pacer.wait_turn().await;
        self.sender.send(to, &content).await?;

        let marked = self
            .assignments
            .mark_emailed(fresh.id, self.clock.now())
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if !marked {
            warn!(assignment_id = %fresh.id, "Assignment was stamped by a concurrent run");
        }
        Ok(RowOutcome::Sent)
    }
}
