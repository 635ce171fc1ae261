use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::contract::model::{
    Assignment, AssignmentStatus, CompletionFailure, CompletionOutcome, CompletionSnapshot,
    SkipOutcome, UserStats,
};
use crate::domain::clock::Clock;
use crate::domain::error::DomainError;
use crate::domain::repo::{CompletionStore, CompletionTx};

pub const XP_PER_LEVEL: i64 = 500;

pub fn level_for(xp_total: i64) -> i32 {
    let level = xp_total.max(0) / XP_PER_LEVEL + 1;
    i32::try_from(level).unwrap_or(i32::MAX)
}

/// Stats after one more completion on `today`.
///
/// The streak grows when the previous completion was yesterday, holds when
/// it was today already, and restarts at 1 otherwise.
pub fn apply_completion(prev: &UserStats, xp_reward: i32, today: NaiveDate) -> UserStats {
    let xp_total = prev.xp_total + i64::from(xp_reward.max(0));
    let yesterday = today.checked_sub_days(Days::new(1));

    let streak_current = match prev.last_quest_completed_at {
        Some(last) if last == today => prev.streak_current.max(1),
        Some(last) if Some(last) == yesterday => prev.streak_current + 1,
        _ => 1,
    };

    UserStats {
        user_id: prev.user_id,
        xp_total,
        level: level_for(xp_total),
        streak_current,
        streak_best: prev.streak_best.max(streak_current),
        quests_completed_total: prev.quests_completed_total + 1,
        last_quest_completed_at: Some(today),
    }
}

fn db(e: anyhow::Error) -> DomainError {
    DomainError::database(e.to_string())
}

/// Atomic completion and skip of assignments.
pub struct CompletionEngine {
    store: Arc<dyn CompletionStore>,
    clock: Arc<dyn Clock>,
}

impl CompletionEngine {
    pub fn new(store: Arc<dyn CompletionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Why a guarded transition touched no row, read after the fact.
    async fn classify(
        tx: &mut Box<dyn CompletionTx>,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<CompletionFailure, DomainError> {
        let current = tx.find_assignment(id).await.map_err(db)?;
        Ok(Self::failure_for(current.as_ref(), user_id))
    }

    fn failure_for(assignment: Option<&Assignment>, user_id: Uuid) -> CompletionFailure {
        match assignment {
            None => CompletionFailure::NotFound,
            Some(a) if a.user_id != user_id => CompletionFailure::NotOwner,
            Some(a) => CompletionFailure::for_terminal(a.status).unwrap_or(CompletionFailure::NotFound),
        }
    }

    #[instrument(
        name = "daily_quests.completion.complete",
        skip(self, proof),
        fields(user_id = %user_id, assignment_id = %assignment_id)
    )]
    pub async fn complete(
        &self,
        user_id: Uuid,
        assignment_id: Uuid,
        proof: Option<serde_json::Value>,
    ) -> Result<CompletionOutcome, DomainError> {
        let now = self.clock.now();
        let today = self.clock.today();
        let mut tx = self.store.begin().await.map_err(db)?;

        let moved = tx
            .transition(assignment_id, user_id, AssignmentStatus::Completed, Some(now), proof)
            .await
            .map_err(db)?;
        if !moved {
            let failure = Self::classify(&mut tx, assignment_id, user_id).await?;
            info!(reason = failure.code(), "Completion rejected");
            return Ok(CompletionOutcome::Rejected(failure));
        }

        let assignment = tx
            .find_assignment(assignment_id)
            .await
            .map_err(db)?
            .ok_or_else(|| DomainError::database(format!("assignment {assignment_id} vanished")))?;
        let quest = tx
            .find_quest(assignment.quest_id)
            .await
            .map_err(db)?
            .ok_or_else(|| DomainError::quest_not_found(assignment.quest_id))?;

        let prev = tx.lock_stats(user_id).await.map_err(db)?;
        let next = apply_completion(&prev, quest.xp_reward, today);
        tx.save_stats(&next).await.map_err(db)?;
        tx.commit().await.map_err(db)?;

        info!(
            xp_awarded = quest.xp_reward,
            xp_total = next.xp_total,
            level = next.level,
            streak = next.streak_current,
            "Quest completed"
        );

        Ok(CompletionOutcome::Completed(CompletionSnapshot {
            assignment_id,
            quest_title: quest.title,
            xp_awarded: quest.xp_reward,
            xp_total: next.xp_total,
            level: next.level,
            streak_current: next.streak_current,
            streak_best: next.streak_best,
        }))
    }

    /// Skip today's quest. Stats stay untouched.
    #[instrument(
        name = "daily_quests.completion.skip",
        skip(self),
        fields(user_id = %user_id, assignment_id = %assignment_id)
    )]
    pub async fn skip(&self, user_id: Uuid, assignment_id: Uuid) -> Result<SkipOutcome, DomainError> {
        let mut tx = self.store.begin().await.map_err(db)?;

        let moved = tx
            .transition(assignment_id, user_id, AssignmentStatus::Skipped, None, None)
            .await
            .map_err(db)?;
        if !moved {
            let failure = Self::classify(&mut tx, assignment_id, user_id).await?;
            info!(reason = failure.code(), "Skip rejected");
            return Ok(SkipOutcome::Rejected(failure));
        }
        tx.commit().await.map_err(db)?;

        info!("Quest skipped");
        Ok(SkipOutcome::Skipped)
    }
}
