use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Json, Redirect, Response},
    Extension,
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::rest::dto::{
    CompleteReq, ConfirmQuery, DailyJobSummaryDto, EmailJobSummaryDto, SkipReq, TodayQuery,
    TodayQuestDto, TransitionDto, UserStatsDto,
};
use crate::api::rest::error::{from_parts, map_domain_error};
use crate::api::rest::problem::ProblemResponse;
use crate::contract::model::{CompletionFailure, CompletionOutcome, SkipOutcome};
use crate::domain::service::Service;

/// Shared secret expected in `Authorization: Bearer ...` on cron routes.
#[derive(Clone, Default)]
pub struct CronSecret(pub Option<String>);

/// Constant-time equality: both values are folded through HMAC under the
/// same label and the digests compared with `verify_slice`.
fn secrets_match(expected: &str, provided: &str) -> bool {
    let digest = |key: &str| {
        Hmac::<Sha256>::new_from_slice(key.as_bytes()).map(|mut mac| {
            mac.update(b"questline-cron");
            mac
        })
    };
    match (digest(expected), digest(provided)) {
        (Ok(expected), Ok(provided)) => expected
            .verify_slice(&provided.finalize().into_bytes())
            .is_ok(),
        _ => false,
    }
}

fn authorize_cron(headers: &HeaderMap, secret: &CronSecret, instance: &str) -> Result<(), ProblemResponse> {
    let Some(expected) = secret.0.as_deref() else {
        return Ok(());
    };
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim);
    if provided.is_some_and(|p| secrets_match(expected, p)) {
        Ok(())
    } else {
        warn!(path = instance, "Rejected cron call with bad credentials");
        Err(from_parts(
            StatusCode::UNAUTHORIZED,
            "QUESTS_CRON_UNAUTHORIZED",
            "Unauthorized",
            "Missing or invalid cron bearer token",
            instance,
        ))
    }
}

/// Run the daily assignment job
pub async fn run_daily_job(
    Extension(svc): Extension<Arc<Service>>,
    Extension(secret): Extension<CronSecret>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<DailyJobSummaryDto>, ProblemResponse> {
    authorize_cron(&headers, &secret, uri.path())?;
    info!("Cron: daily quest job triggered");

    match svc.run_daily_job().await {
        Ok(summary) => Ok(Json(summary.into())),
        Err(e) => {
            error!("Daily quest job failed: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

/// Run the email-only job
pub async fn run_email_job(
    Extension(svc): Extension<Arc<Service>>,
    Extension(secret): Extension<CronSecret>,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Json<EmailJobSummaryDto>, ProblemResponse> {
    authorize_cron(&headers, &secret, uri.path())?;
    info!("Cron: email-only job triggered");

    match svc.run_email_job().await {
        Ok(summary) => Ok(Json(summary.into())),
        Err(e) => {
            error!("Email-only job failed: {}", e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

fn redirect_with(svc: &Service, params: &[(&str, String)]) -> Response {
    match svc.result_url(params) {
        Ok(url) => Redirect::to(url.as_str()).into_response(),
        Err(e) => {
            error!("Cannot build completion result URL: {}", e);
            map_domain_error(&e, svc.completion_path()).into_response()
        }
    }
}

fn redirect_error(svc: &Service, code: &str) -> Response {
    redirect_with(svc, &[("error", code.to_string())])
}

fn non_empty(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// One-click completion from an email link. Always answers with a redirect
/// to the result page.
pub async fn confirm_completion(
    Extension(svc): Extension<Arc<Service>>,
    query: Result<Query<ConfirmQuery>, QueryRejection>,
) -> Response {
    let Ok(Query(query)) = query else {
        return redirect_error(&svc, "invalid_params");
    };

    let (Some(assignment_raw), Some(user_raw), Some(token)) = (
        non_empty(query.assignment_id),
        non_empty(query.user_id),
        non_empty(query.token),
    ) else {
        return redirect_error(&svc, "missing_params");
    };

    if !svc.verify_link(&assignment_raw, &user_raw, &token) {
        warn!(assignment_id = %assignment_raw, "Completion link with invalid token");
        return redirect_error(&svc, "invalid_token");
    }

    let (Ok(assignment_id), Ok(user_id)) = (
        Uuid::parse_str(&assignment_raw),
        Uuid::parse_str(&user_raw),
    ) else {
        return redirect_error(&svc, "invalid_params");
    };

    match svc.complete(user_id, assignment_id, None).await {
        Ok(CompletionOutcome::Completed(s)) => redirect_with(
            &svc,
            &[
                ("success", "true".to_string()),
                ("quest", s.quest_title),
                ("xp", s.xp_awarded.to_string()),
                ("total", s.xp_total.to_string()),
                ("level", s.level.to_string()),
                ("streak", s.streak_current.to_string()),
            ],
        ),
        Ok(CompletionOutcome::Rejected(failure)) => redirect_error(&svc, failure.code()),
        Err(e) => {
            error!(%assignment_id, "One-click completion failed: {}", e);
            redirect_error(&svc, "server_error")
        }
    }
}

/// Today's quest for a user, assigning one on first visit
pub async fn today_quest(
    Extension(svc): Extension<Arc<Service>>,
    Query(query): Query<TodayQuery>,
    uri: Uri,
) -> Result<Json<TodayQuestDto>, ProblemResponse> {
    match svc.today_quest(query.user_id).await {
        Ok(today) => Ok(Json(today.into())),
        Err(e) => {
            error!("Failed to load today's quest for {}: {}", query.user_id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

fn rejection_status(failure: CompletionFailure) -> StatusCode {
    match failure {
        CompletionFailure::NotFound => StatusCode::NOT_FOUND,
        CompletionFailure::NotOwner => StatusCode::FORBIDDEN,
        CompletionFailure::AlreadyCompleted
        | CompletionFailure::AlreadyExpired
        | CompletionFailure::AlreadySkipped => StatusCode::CONFLICT,
    }
}

pub async fn complete_assignment(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req): Json<CompleteReq>,
) -> Result<(StatusCode, Json<TransitionDto>), ProblemResponse> {
    match svc.complete(req.user_id, id, req.proof).await {
        Ok(CompletionOutcome::Completed(s)) => Ok((StatusCode::OK, Json(s.into()))),
        Ok(CompletionOutcome::Rejected(f)) => Ok((rejection_status(f), Json(f.into()))),
        Err(e) => {
            error!("Failed to complete assignment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn skip_assignment(
    uri: Uri,
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    Json(req): Json<SkipReq>,
) -> Result<(StatusCode, Json<TransitionDto>), ProblemResponse> {
    match svc.skip(req.user_id, id).await {
        Ok(SkipOutcome::Skipped) => Ok((StatusCode::OK, Json(TransitionDto::Skipped))),
        Ok(SkipOutcome::Rejected(f)) => Ok((rejection_status(f), Json(f.into()))),
        Err(e) => {
            error!("Failed to skip assignment {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

pub async fn user_stats(
    Extension(svc): Extension<Arc<Service>>,
    Path(id): Path<Uuid>,
    uri: Uri,
) -> Result<Json<UserStatsDto>, ProblemResponse> {
    match svc.user_stats(id).await {
        Ok(stats) => Ok(Json(stats.into())),
        Err(e) => {
            error!("Failed to load stats for {}: {}", id, e);
            Err(map_domain_error(&e, uri.path()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn cron_secret_must_match_exactly() {
        let secret = CronSecret(Some("cron-s3cret".into()));
        assert!(authorize_cron(&bearer("Bearer cron-s3cret"), &secret, "/c").is_ok());
        assert!(authorize_cron(&bearer("Bearer cron-s3cret "), &secret, "/c").is_ok());
        assert!(authorize_cron(&bearer("Bearer cron-s3cre"), &secret, "/c").is_err());
        assert!(authorize_cron(&bearer("Bearer cron-s3cretx"), &secret, "/c").is_err());
        assert!(authorize_cron(&bearer("cron-s3cret"), &secret, "/c").is_err());
        assert!(authorize_cron(&HeaderMap::new(), &secret, "/c").is_err());
    }

    #[test]
    fn empty_bearer_never_matches() {
        assert!(!secrets_match("cron-s3cret", ""));
    }

    #[test]
    fn unset_cron_secret_leaves_routes_open() {
        assert!(authorize_cron(&HeaderMap::new(), &CronSecret(None), "/c").is_ok());
    }
}
