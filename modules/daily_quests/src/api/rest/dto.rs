use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::contract::model::{
    Assignment, CompletionFailure, CompletionSnapshot, DailyJobSummary, EmailJobSummary,
    JobFailure, Quest, TodayQuest, UserStats,
};
use crate::domain::notification::category_glyph;

/// Query of the one-click completion link. Every field is optional so a
/// mangled link still reaches the handler and gets redirected.
#[derive(Debug, Default, Deserialize)]
pub struct ConfirmQuery {
    #[serde(rename = "assignmentId")]
    pub assignment_id: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TodayQuery {
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct CompleteReq {
    pub user_id: Uuid,
    #[serde(default)]
    pub proof: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct SkipReq {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDto {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub glyph: String,
    pub xp_reward: i32,
    pub estimated_minutes: i32,
    pub proof_type: String,
}

impl From<Quest> for QuestDto {
    fn from(q: Quest) -> Self {
        Self {
            glyph: category_glyph(&q.category).to_string(),
            id: q.id,
            title: q.title,
            description: q.description,
            category: q.category,
            xp_reward: q.xp_reward,
            estimated_minutes: q.estimated_minutes,
            proof_type: q.proof_type.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quest_id: Uuid,
    pub assigned_date: NaiveDate,
    pub status: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub emailed_at: Option<DateTime<Utc>>,
}

impl From<Assignment> for AssignmentDto {
    fn from(a: Assignment) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            quest_id: a.quest_id,
            assigned_date: a.assigned_date,
            status: a.status.as_str().to_string(),
            completed_at: a.completed_at,
            emailed_at: a.emailed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TodayQuestDto {
    pub assignment: AssignmentDto,
    pub quest: QuestDto,
}

impl From<TodayQuest> for TodayQuestDto {
    fn from(t: TodayQuest) -> Self {
        Self {
            assignment: t.assignment.into(),
            quest: t.quest.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TransitionDto {
    Completed {
        assignment_id: Uuid,
        quest_title: String,
        xp_awarded: i32,
        xp_total: i64,
        level: i32,
        streak_current: i32,
        streak_best: i32,
    },
    Skipped,
    Rejected {
        reason: String,
    },
}

impl From<CompletionSnapshot> for TransitionDto {
    fn from(s: CompletionSnapshot) -> Self {
        Self::Completed {
            assignment_id: s.assignment_id,
            quest_title: s.quest_title,
            xp_awarded: s.xp_awarded,
            xp_total: s.xp_total,
            level: s.level,
            streak_current: s.streak_current,
            streak_best: s.streak_best,
        }
    }
}

impl From<CompletionFailure> for TransitionDto {
    fn from(f: CompletionFailure) -> Self {
        Self::Rejected {
            reason: f.code().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsDto {
    pub user_id: Uuid,
    pub xp_total: i64,
    pub level: i32,
    pub streak_current: i32,
    pub streak_best: i32,
    pub quests_completed_total: i32,
    pub last_quest_completed_at: Option<NaiveDate>,
}

impl From<UserStats> for UserStatsDto {
    fn from(s: UserStats) -> Self {
        Self {
            user_id: s.user_id,
            xp_total: s.xp_total,
            level: s.level,
            streak_current: s.streak_current,
            streak_best: s.streak_best,
            quests_completed_total: s.quests_completed_total,
            last_quest_completed_at: s.last_quest_completed_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobFailureDto {
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignment_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub error: String,
}

impl From<JobFailure> for JobFailureDto {
    fn from(f: JobFailure) -> Self {
        Self {
            user_id: f.user_id,
            assignment_id: f.assignment_id,
            email: f.email,
            error: f.error,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyJobSummaryDto {
    pub date: NaiveDate,
    pub processed: u32,
    pub newly_assigned: u32,
    pub emailed: u32,
    pub already_emailed: u32,
    pub errors: Vec<JobFailureDto>,
}

impl From<DailyJobSummary> for DailyJobSummaryDto {
    fn from(s: DailyJobSummary) -> Self {
        Self {
            date: s.date,
            processed: s.processed,
            newly_assigned: s.newly_assigned,
            emailed: s.emailed,
            already_emailed: s.already_emailed,
            errors: s.errors.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailJobSummaryDto {
    pub date: NaiveDate,
    pub attempted: u32,
    pub sent: u32,
    pub skipped_already_emailed: u32,
    pub skipped_missing_email: u32,
    pub skipped_missing_quest: u32,
    pub failures: Vec<JobFailureDto>,
}

impl From<EmailJobSummary> for EmailJobSummaryDto {
    fn from(s: EmailJobSummary) -> Self {
        Self {
            date: s.date,
            attempted: s.attempted,
            sent: s.sent,
            skipped_already_emailed: s.skipped_already_emailed,
            skipped_missing_email: s.skipped_missing_email,
            skipped_missing_quest: s.skipped_missing_quest,
            failures: s.failures.into_iter().map(Into::into).collect(),
        }
    }
}
