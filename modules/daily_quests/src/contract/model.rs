use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// How a quest is proven done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProofType {
    None,
    Photo,
    CheckIn,
    SelfReport,
}

impl ProofType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProofType::None => "none",
            ProofType::Photo => "photo",
            ProofType::CheckIn => "check_in",
            ProofType::SelfReport => "self_report",
        }
    }

    /// Quests that can be finished from a link without uploading anything.
    pub fn allows_one_click(&self) -> bool {
        matches!(self, ProofType::None | ProofType::SelfReport)
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(ProofType::None),
            "photo" => Ok(ProofType::Photo),
            "check_in" | "check-in" | "checkin" => Ok(ProofType::CheckIn),
            "self_report" | "self-report" => Ok(ProofType::SelfReport),
            other => Err(format!("unknown proof type '{other}'")),
        }
    }
}

/// Lifecycle of an assignment. Every state other than `Assigned` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignmentStatus {
    Assigned,
    Completed,
    Skipped,
    Expired,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::Completed => "completed",
            AssignmentStatus::Skipped => "skipped",
            AssignmentStatus::Expired => "expired",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, AssignmentStatus::Assigned)
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(AssignmentStatus::Assigned),
            "completed" => Ok(AssignmentStatus::Completed),
            "skipped" => Ok(AssignmentStatus::Skipped),
            "expired" => Ok(AssignmentStatus::Expired),
            other => Err(format!("unknown assignment status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub xp_reward: i32,
    pub estimated_minutes: i32,
    pub proof_type: ProofType,
    pub is_daily: bool,
    /// Relative likelihood of being picked; values <= 0 count as 1.
    pub weight: i32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Catalog entry as loaded from a seed file; ids are optional so the
/// same file can be re-applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuest {
    pub id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub xp_reward: i32,
    pub estimated_minutes: i32,
    pub proof_type: ProofType,
    pub is_daily: bool,
    pub weight: i32,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quest_id: Uuid,
    pub assigned_date: NaiveDate,
    pub status: AssignmentStatus,
    pub proof_payload: Option<serde_json::Value>,
    pub completed_at: Option<DateTime<Utc>>,
    pub emailed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A user that the daily job sends mail to. Always has an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifiableUser {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
}

/// A user as the directory knows them; the address may be missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub display_name: String,
}

impl UserProfile {
    /// Address usable for delivery, if any.
    pub fn deliverable_email(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStats {
    pub user_id: Uuid,
    pub xp_total: i64,
    pub level: i32,
    pub streak_current: i32,
    pub streak_best: i32,
    pub quests_completed_total: i32,
    pub last_quest_completed_at: Option<NaiveDate>,
}

impl UserStats {
    pub fn empty(user_id: Uuid) -> Self {
        Self {
            user_id,
            xp_total: 0,
            level: 1,
            streak_current: 0,
            streak_best: 0,
            quests_completed_total: 0,
            last_quest_completed_at: None,
        }
    }
}

/// Today's quest for a user together with its assignment row.
#[derive(Debug, Clone, PartialEq)]
pub struct TodayQuest {
    pub assignment: Assignment,
    pub quest: Quest,
}

/// What a successful completion changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSnapshot {
    pub assignment_id: Uuid,
    pub quest_title: String,
    pub xp_awarded: i32,
    pub xp_total: i64,
    pub level: i32,
    pub streak_current: i32,
    pub streak_best: i32,
}

/// Why a completion or skip was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionFailure {
    NotFound,
    NotOwner,
    AlreadyCompleted,
    AlreadyExpired,
    AlreadySkipped,
}

impl CompletionFailure {
    /// Stable machine-readable reason.
    pub fn code(&self) -> &'static str {
        match self {
            CompletionFailure::NotFound => "not_found",
            CompletionFailure::NotOwner => "not_owner",
            CompletionFailure::AlreadyCompleted => "already_completed",
            CompletionFailure::AlreadyExpired => "already_expired",
            CompletionFailure::AlreadySkipped => "already_skipped",
        }
    }

    /// Failure describing an assignment that already left `Assigned`.
    pub fn for_terminal(status: AssignmentStatus) -> Option<Self> {
        match status {
            AssignmentStatus::Assigned => None,
            AssignmentStatus::Completed => Some(CompletionFailure::AlreadyCompleted),
            AssignmentStatus::Skipped => Some(CompletionFailure::AlreadySkipped),
            AssignmentStatus::Expired => Some(CompletionFailure::AlreadyExpired),
        }
    }
}

impl fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed(CompletionSnapshot),
    Rejected(CompletionFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipOutcome {
    Skipped,
    Rejected(CompletionFailure),
}

/// A per-user (or per-assignment) failure recorded by a job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub user_id: Uuid,
    pub assignment_id: Option<Uuid>,
    pub email: Option<String>,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyJobSummary {
    pub date: NaiveDate,
    pub processed: u32,
    pub newly_assigned: u32,
    pub emailed: u32,
    pub already_emailed: u32,
    pub errors: Vec<JobFailure>,
}

impl DailyJobSummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            processed: 0,
            newly_assigned: 0,
            emailed: 0,
            already_emailed: 0,
            errors: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJobSummary {
    pub date: NaiveDate,
    pub attempted: u32,
    pub sent: u32,
    pub skipped_already_emailed: u32,
    pub skipped_missing_email: u32,
    pub skipped_missing_quest: u32,
    pub failures: Vec<JobFailure>,
}

impl EmailJobSummary {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            attempted: 0,
            sent: 0,
            skipped_already_emailed: 0,
            skipped_missing_email: 0,
            skipped_missing_quest: 0,
            failures: Vec::new(),
        }
    }
}
