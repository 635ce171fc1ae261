use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::contract::model::Quest;
use crate::domain::error::DomainError;
use crate::domain::repo::QuestRepository;
use crate::domain::selection::weighted_pick;

/// Daily-quest catalog with weighted random selection.
pub struct QuestCatalog {
    repo: Arc<dyn QuestRepository>,
    rng: Mutex<StdRng>,
}

impl QuestCatalog {
    pub fn new(repo: Arc<dyn QuestRepository>) -> Self {
        Self::with_rng(repo, StdRng::from_os_rng())
    }

    /// Deterministic selection, for tests.
    pub fn with_rng(repo: Arc<dyn QuestRepository>, rng: StdRng) -> Self {
        Self {
            repo,
            rng: Mutex::new(rng),
        }
    }

    /// Pick among active daily quests not in `exclude`.
    ///
    /// Returns `None` when nothing is left after filtering; widening the
    /// exclusion is up to the caller.
    #[instrument(name = "daily_quests.catalog.pick", skip(self, exclude), fields(excluded = exclude.len()))]
    pub async fn pick_daily_quest(
        &self,
        exclude: &HashSet<Uuid>,
    ) -> Result<Option<Quest>, DomainError> {
        let pool = self
            .repo
            .list_daily_active()
            .await
            .map_err(|e| DomainError::database(e.to_string()))?;

        let candidates: Vec<Quest> = pool
            .into_iter()
            .filter(|q| !exclude.contains(&q.id))
            .collect();
        debug!(candidates = candidates.len(), "Picking daily quest");

        let mut rng = self.rng.lock();
        Ok(weighted_pick(&candidates, &mut *rng).cloned())
    }
}
