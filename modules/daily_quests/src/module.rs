use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context};
use axum::Router;
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, info, warn};
use url::Url;

use crate::api::rest::handlers::CronSecret;
use crate::api::rest::routes;
use crate::config::DailyQuestsConfig;
use crate::contract::client::DailyQuestsApi;
use crate::domain::assignments::ExclusionWindows;
use crate::domain::clock::{Clock, ZonedClock};
use crate::domain::service::{Service, ServiceConfig, ServiceDeps};
use crate::gateways::local::DailyQuestsLocalClient;
use crate::infra::mail::ResendTransport;
use crate::infra::storage::migrations::Migrator;
use crate::infra::storage::{
    SeaOrmAssignmentRepository, SeaOrmCompletionStore, SeaOrmQuestRepository,
    SeaOrmStatsRepository, SeaOrmUserDirectory,
};

/// The daily quest pipeline, wired and ready to serve.
#[derive(Clone)]
pub struct DailyQuests {
    service: Arc<Service>,
    cron_secret: CronSecret,
}

impl DailyQuests {
    /// Wire SeaORM repositories, the Resend transport and the product clock.
    pub fn init(cfg: &DailyQuestsConfig, db: DatabaseConnection) -> anyhow::Result<Self> {
        info!("Initializing daily_quests module");

        let clock = ZonedClock::from_name(&cfg.timezone).map_err(|e| anyhow!(e))?;
        let resend_base = Url::parse(&cfg.email.resend_base_url)
            .with_context(|| format!("invalid email.resend_base_url '{}'", cfg.email.resend_base_url))?;
        let transport = ResendTransport::new(resend_base, cfg.email.resend_api_key.clone())
            .context("failed to build Resend client")?;

        if cfg.email.resend_api_key.as_deref().unwrap_or("").is_empty() {
            warn!("email.resend_api_key is not set; quest emails cannot be sent");
        }

        let deps = ServiceDeps {
            quests: Arc::new(SeaOrmQuestRepository::new(db.clone())),
            assignments: Arc::new(SeaOrmAssignmentRepository::new(db.clone())),
            users: Arc::new(SeaOrmUserDirectory::new(db.clone())),
            stats: Arc::new(SeaOrmStatsRepository::new(db.clone())),
            completions: Arc::new(SeaOrmCompletionStore::new(db)),
            transport: Arc::new(transport),
            clock: Arc::new(clock),
        };
        Self::with_deps(cfg, deps)
    }

    /// Wire the service over caller-provided ports.
    pub fn with_deps(cfg: &DailyQuestsConfig, deps: ServiceDeps) -> anyhow::Result<Self> {
        let service = Service::new(deps, service_config(cfg)?);
        Ok(Self::from_service(Arc::new(service), cfg))
    }

    pub fn from_service(service: Arc<Service>, cfg: &DailyQuestsConfig) -> Self {
        if cfg.confirm_secret.as_deref().unwrap_or("").is_empty() {
            warn!("confirm_secret is not set; one-click completion links are disabled");
        }
        if cfg.cron_secret.as_deref().unwrap_or("").is_empty() {
            warn!("cron_secret is not set; cron endpoints accept unauthenticated calls");
        }
        debug!(
            "daily_quests today is {} ({})",
            service.clock().today(),
            service.clock().timezone()
        );

        Self {
            service,
            cron_secret: CronSecret(cfg.cron_secret.clone().filter(|s| !s.is_empty())),
        }
    }

    pub async fn migrate(db: &DatabaseConnection) -> anyhow::Result<()> {
        info!("Running daily_quests database migrations");
        Migrator::up(db, None)
            .await
            .context("daily_quests migrations failed")?;
        info!("daily_quests database migrations completed");
        Ok(())
    }

    pub fn register_rest(&self, router: Router) -> Router {
        routes::register_routes(router, self.service.clone(), self.cron_secret.clone())
    }

    pub fn client(&self) -> Arc<dyn DailyQuestsApi> {
        Arc::new(DailyQuestsLocalClient::new(self.service.clone()))
    }
}

/// Validate the module config and turn it into the domain service's view.
pub fn service_config(cfg: &DailyQuestsConfig) -> anyhow::Result<ServiceConfig> {
    let app_base_url = Url::parse(&cfg.app_base_url)
        .with_context(|| format!("invalid app_base_url '{}'", cfg.app_base_url))?;
    for (name, path) in [
        ("completion_path", &cfg.completion_path),
        ("result_path", &cfg.result_path),
    ] {
        if !path.starts_with('/') {
            return Err(anyhow!("{name} must start with '/': '{path}'"));
        }
        app_base_url
            .join(path)
            .with_context(|| format!("invalid {name} '{path}'"))?;
    }

    Ok(ServiceConfig {
        app_base_url,
        confirm_secret: cfg.confirm_secret.clone().filter(|s| !s.is_empty()),
        completion_path: cfg.completion_path.clone(),
        result_path: cfg.result_path.clone(),
        email_from: cfg.email.from.clone(),
        send_interval: Duration::from_millis(cfg.send_interval_ms),
        windows: ExclusionWindows {
            recent_days: cfg.recent_exclusion_days,
            fallback_days: cfg.fallback_exclusion_days,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let sc = service_config(&DailyQuestsConfig::default()).unwrap();
        assert_eq!(sc.send_interval, Duration::from_millis(600));
        assert_eq!(sc.windows.recent_days, 14);
        assert!(sc.confirm_secret.is_none());
    }

    #[test]
    fn relative_paths_are_rejected() {
        let cfg = DailyQuestsConfig {
            result_path: "quest-complete".into(),
            ..Default::default()
        };
        assert!(service_config(&cfg).is_err());
    }

    #[test]
    fn empty_secret_counts_as_unset() {
        let cfg = DailyQuestsConfig {
            confirm_secret: Some(String::new()),
            ..Default::default()
        };
        assert!(service_config(&cfg).unwrap().confirm_secret.is_none());
    }
}
