use anyhow::anyhow;

use crate::contract::model::{Assignment, NotifiableUser, Quest, UserProfile, UserStats};
use crate::infra::storage::entity::{assignment, profile, quest, user_stats};

impl TryFrom<quest::Model> for Quest {
    type Error = anyhow::Error;

    fn try_from(m: quest::Model) -> Result<Self, Self::Error> {
        let proof_type = m
            .proof_type
            .parse()
            .map_err(|e: String| anyhow!("quest {}: {}", m.id, e))?;
        Ok(Quest {
            id: m.id,
            title: m.title,
            description: m.description,
            category: m.category,
            xp_reward: m.xp_reward,
            estimated_minutes: m.estimated_minutes,
            proof_type,
            is_daily: m.is_daily,
            weight: m.weight,
            active: m.active,
            created_at: m.created_at,
        })
    }
}

impl TryFrom<assignment::Model> for Assignment {
    type Error = anyhow::Error;

    fn try_from(m: assignment::Model) -> Result<Self, Self::Error> {
        let status = m
            .status
            .parse()
            .map_err(|e: String| anyhow!("assignment {}: {}", m.id, e))?;
        Ok(Assignment {
            id: m.id,
            user_id: m.user_id,
            quest_id: m.quest_id,
            assigned_date: m.assigned_date,
            status,
            proof_payload: m.proof_payload,
            completed_at: m.completed_at,
            emailed_at: m.emailed_at,
            created_at: m.created_at,
        })
    }
}

impl From<profile::Model> for UserProfile {
    fn from(m: profile::Model) -> Self {
        UserProfile {
            id: m.id,
            email: m.email,
            display_name: m.display_name,
        }
    }
}

/// Profiles without a usable address are not notifiable.
pub fn notifiable(p: UserProfile) -> Option<NotifiableUser> {
    let email = p.deliverable_email()?.to_string();
    Some(NotifiableUser {
        id: p.id,
        email,
        display_name: p.display_name,
    })
}

impl From<user_stats::Model> for UserStats {
    fn from(m: user_stats::Model) -> Self {
        UserStats {
            user_id: m.user_id,
            xp_total: m.xp_total,
            level: m.level,
            streak_current: m.streak_current,
            streak_best: m.streak_best,
            quests_completed_total: m.quests_completed_total,
            last_quest_completed_at: m.last_quest_completed_at,
        }
    }
}

/// Map a batch of rows, failing on the first bad one.
pub fn try_map_all<M, T>(rows: Vec<M>) -> anyhow::Result<Vec<T>>
where
    T: TryFrom<M, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
