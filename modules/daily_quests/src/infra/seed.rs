//! YAML catalog seed files.
//!
//! ```yaml
//! quests:
//!   - id: 6f1c...            # optional, makes re-seeding idempotent
//!     title: Pick up litter on your block
//!     category: cleanup
//!     xp_reward: 50
//!     estimated_minutes: 15
//!     proof_type: photo
//!     weight: 3
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use uuid::Uuid;

use crate::contract::model::{NewQuest, ProofType};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SeedFile {
    #[serde(default)]
    quests: Vec<QuestSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct QuestSeed {
    id: Option<Uuid>,
    title: String,
    #[serde(default)]
    description: String,
    category: String,
    xp_reward: i32,
    #[serde(default)]
    estimated_minutes: i32,
    #[serde(default = "default_proof_type")]
    proof_type: String,
    #[serde(default = "default_true")]
    is_daily: bool,
    #[serde(default = "default_weight")]
    weight: i32,
    #[serde(default = "default_true")]
    active: bool,
}

fn default_proof_type() -> String {
    ProofType::SelfReport.as_str().to_string()
}

fn default_true() -> bool {
    true
}

fn default_weight() -> i32 {
    1
}

pub fn parse_quest_seeds(yaml: &str) -> Result<Vec<NewQuest>> {
    let file: SeedFile = serde_yaml::from_str(yaml).context("invalid quest seed YAML")?;
    file.quests
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let proof_type = q
                .proof_type
                .parse::<ProofType>()
                .map_err(|e| anyhow::anyhow!("quest #{} ('{}'): {}", i + 1, q.title, e))?;
            Ok(NewQuest {
                id: q.id,
                title: q.title,
                description: q.description,
                category: q.category,
                xp_reward: q.xp_reward,
                estimated_minutes: q.estimated_minutes,
                proof_type,
                is_daily: q.is_daily,
                weight: q.weight,
                active: q.active,
            })
        })
        .collect()
}

pub fn load_quest_seeds(path: &Path) -> Result<Vec<NewQuest>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read seed file {}", path.display()))?;
    parse_quest_seeds(&raw).with_context(|| format!("in {}", path.display()))
}
