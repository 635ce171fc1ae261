use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::contract::model::{Assignment, Quest};
use crate::domain::catalog::QuestCatalog;
use crate::domain::error::DomainError;
use crate::domain::repo::{AssignmentRepository, CreateOutcome};

/// Look-back windows (in days) used to avoid repeating recent quests.
#[derive(Debug, Clone, Copy)]
pub struct ExclusionWindows {
    pub recent_days: u32,
    pub fallback_days: u32,
}

impl Default for ExclusionWindows {
    fn default() -> Self {
        Self {
            recent_days: 14,
            fallback_days: 7,
        }
    }
}

/// The user's assignment for a date and whether this call created it.
#[derive(Debug, Clone, PartialEq)]
pub struct EnsuredAssignment {
    pub assignment: Assignment,
    pub created: bool,
}

/// Get-or-create of the one assignment per (user, date).
pub struct AssignmentService {
    repo: Arc<dyn AssignmentRepository>,
    catalog: Arc<QuestCatalog>,
    windows: ExclusionWindows,
}

impl AssignmentService {
    pub fn new(
        repo: Arc<dyn AssignmentRepository>,
        catalog: Arc<QuestCatalog>,
        windows: ExclusionWindows,
    ) -> Self {
        Self {
            repo,
            catalog,
            windows,
        }
    }

    #[instrument(name = "daily_quests.assignments.ensure", skip(self), fields(user_id = %user_id, date = %date))]
    pub async fn ensure(&self, user_id: Uuid, date: NaiveDate) -> Result<EnsuredAssignment, DomainError> {
        if let Some(existing) = self.existing(user_id, date).await? {
            debug!(assignment_id = %existing.id, "Assignment already exists");
            return Ok(EnsuredAssignment {
                assignment: existing,
                created: false,
            });
        }

        let quest = self.choose_quest(user_id, date).await?;
        let outcome = self
            .repo
            .create(user_id, quest.id, date)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        match outcome {
            CreateOutcome::Created(assignment) => {
                info!(assignment_id = %assignment.id, quest_id = %quest.id, "Assigned daily quest");
                Ok(EnsuredAssignment {
                    assignment,
                    created: true,
                })
            }
            CreateOutcome::AlreadyExists => {
                warn!("Concurrent assignment detected, re-reading");
                let assignment = self.existing(user_id, date).await?.ok_or_else(|| {
                    DomainError::database("assignment vanished after uniqueness conflict")
                })?;
                Ok(EnsuredAssignment {
                    assignment,
                    created: false,
                })
            }
        }
    }

    /// Expire the user's open assignments from earlier days.
    pub async fn expire_before(&self, user_id: Uuid, date: NaiveDate) -> Result<u64, DomainError> {
        let expired = self
            .repo
            .expire_past(user_id, date)
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;
        if expired > 0 {
            debug!(%user_id, expired, "Expired stale assignments");
        }
        Ok(expired)
    }

    async fn existing(&self, user_id: Uuid, date: NaiveDate) -> Result<Option<Assignment>, DomainError> {
        self.repo
            .get_for_user_on_date(user_id, date)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }

    /// Try the long window, then the short one, then the whole pool.
    async fn choose_quest(&self, user_id: Uuid, date: NaiveDate) -> Result<Quest, DomainError> {
        for days in [self.windows.recent_days, self.windows.fallback_days] {
            let exclude = self.recent_quest_ids(user_id, date, days).await?;
            if let Some(quest) = self.catalog.pick_daily_quest(&exclude).await? {
                return Ok(quest);
            }
            debug!(window_days = days, "No quest left after exclusion, widening");
        }

        self.catalog
            .pick_daily_quest(&HashSet::new())
            .await?
            .ok_or(DomainError::NoActiveQuests)
    }

    async fn recent_quest_ids(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        days: u32,
    ) -> Result<HashSet<Uuid>, DomainError> {
        if days == 0 {
            return Ok(HashSet::new());
        }
        let since = date
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN);
        self.repo
            .quest_ids_assigned_since(user_id, since)
            .await
            .map_err(|e| DomainError::database(e.to_string()))
    }
}
