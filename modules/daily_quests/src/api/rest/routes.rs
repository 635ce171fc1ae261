use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};

use crate::api::rest::handlers::{self, CronSecret};
use crate::domain::service::Service;

/// Routes of the daily quest pipeline, ready to be merged into the host router.
pub fn register_routes(router: Router, service: Arc<Service>, cron_secret: CronSecret) -> Router {
    let routes = Router::new()
        .route(service.completion_path(), get(handlers::confirm_completion))
        .route("/api/quests/today", get(handlers::today_quest))
        .route(
            "/api/cron/daily-quests",
            get(handlers::run_daily_job).post(handlers::run_daily_job),
        )
        .route(
            "/api/cron/send-emails",
            get(handlers::run_email_job).post(handlers::run_email_job),
        )
        .route(
            "/api/assignments/{id}/complete",
            post(handlers::complete_assignment),
        )
        .route("/api/assignments/{id}/skip", post(handlers::skip_assignment))
        .route("/api/users/{id}/stats", get(handlers::user_stats))
        .layer(Extension(service))
        .layer(Extension(cron_secret));

    router.merge(routes)
}
