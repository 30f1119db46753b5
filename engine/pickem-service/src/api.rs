//! REST API endpoints
//!
//! Pick submission plus the read-side league, schedule and user lookups.
//! Submissions always answer 200 with the `{pick, errors}` envelope; read
//! routes answer with an [`ErrorResponse`] body and a matching status.

use pick_engine::queries;
use pick_engine::{PickRequest, PickService};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::{Filter, Reply};

/// Largest accepted request body
const MAX_BODY_BYTES: u64 = 16 * 1024;

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: String,
}

/// Error detail
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrentPickParams {
    pub league_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct LeaguesParams {
    pub user_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct GamesParams {
    pub season: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserParams {
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SeasonResponse<'a> {
    season: &'a str,
    current_week: u32,
    revealed_week: u32,
}

fn json_reply<T: Serialize>(body: &T) -> Response {
    warp::reply::json(body).into_response()
}

fn error_reply(status: StatusCode, code: &str, message: impl Into<String>) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail { code: code.to_string(), message: message.into() },
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn storage_failure(operation: &str, err: pick_engine::PickEngineError) -> Response {
    tracing::error!("{} failed: {}", operation, err);
    error_reply(
        StatusCode::INTERNAL_SERVER_ERROR,
        err.error_code().as_str(),
        "Lookup failed. Please retry.",
    )
}

/// Validate and register a weekly pick
pub async fn submit_pick(
    request: PickRequest,
    service: PickService,
) -> Result<Response, warp::Rejection> {
    tracing::debug!(
        "submitPick for user {} league {} week {} teams {:?}",
        request.user_id,
        request.league_id,
        request.week,
        request.team_ids
    );
    let response = service.submit_pick(request).await;
    Ok(json_reply(&response))
}

pub async fn get_current_pick(
    params: CurrentPickParams,
    service: PickService,
) -> Result<Response, warp::Rejection> {
    match queries::current_pick(
        service.store().as_ref(),
        params.league_id,
        params.user_id,
        service.config(),
    )
    .await
    {
        Ok(picks) => Ok(json_reply(&picks)),
        Err(e) => Ok(storage_failure("currentPick", e)),
    }
}

pub async fn get_league(league_id: i64, service: PickService) -> Result<Response, warp::Rejection> {
    match queries::league_view(service.store().as_ref(), league_id, service.config()).await {
        Ok(Some(view)) => Ok(json_reply(&view)),
        Ok(None) => Ok(error_reply(
            StatusCode::NOT_FOUND,
            "LEAGUE_NOT_FOUND",
            format!("League with ID '{}' not found", league_id),
        )),
        Err(e) => Ok(storage_failure("league", e)),
    }
}

pub async fn get_leagues(
    params: LeaguesParams,
    service: PickService,
) -> Result<Response, warp::Rejection> {
    match queries::leagues(service.store().as_ref(), params.user_id, service.config()).await {
        Ok(leagues) => Ok(json_reply(&leagues)),
        Err(e) => Ok(storage_failure("leagues", e)),
    }
}

pub async fn get_teams(service: PickService) -> Result<Response, warp::Rejection> {
    match queries::sports_teams(service.store().as_ref()).await {
        Ok(teams) => Ok(json_reply(&teams)),
        Err(e) => Ok(storage_failure("sportsTeams", e)),
    }
}

pub async fn get_games(
    params: GamesParams,
    service: PickService,
) -> Result<Response, warp::Rejection> {
    match queries::sports_games(service.store().as_ref(), params.season.as_deref(), service.config())
        .await
    {
        Ok(games) => Ok(json_reply(&games)),
        Err(e) => Ok(storage_failure("sportsGames", e)),
    }
}

pub async fn get_user(params: UserParams, service: PickService) -> Result<Response, warp::Rejection> {
    match queries::user_by_email(service.store().as_ref(), &params.email).await {
        Ok(Some(user)) => Ok(json_reply(&user)),
        Ok(None) => Ok(error_reply(StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found")),
        Err(e) => Ok(storage_failure("user", e)),
    }
}

pub async fn get_season(service: PickService) -> Result<Response, warp::Rejection> {
    let config = service.config();
    Ok(json_reply(&SeasonResponse {
        season: queries::current_season(config),
        current_week: config.current_week,
        revealed_week: config.revealed_week,
    }))
}

/// Map filter rejections onto the error envelope
async fn handle_rejection(err: warp::Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(error_reply(StatusCode::NOT_FOUND, "NOT_FOUND", "Route not found"));
    }

    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "ERR_INVALID_INPUT", e.to_string()));
    }

    if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        return Ok(error_reply(StatusCode::BAD_REQUEST, "ERR_INVALID_INPUT", e.to_string()));
    }

    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(error_reply(
            StatusCode::PAYLOAD_TOO_LARGE,
            "ERR_INVALID_INPUT",
            "Request body too large",
        ));
    }

    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(error_reply(
            StatusCode::METHOD_NOT_ALLOWED,
            "METHOD_NOT_ALLOWED",
            "Method not allowed",
        ));
    }

    tracing::warn!("Unhandled rejection: {:?}", err);
    Ok(error_reply(StatusCode::INTERNAL_SERVER_ERROR, "ERR_UNKNOWN", "Internal server error"))
}

/// Create REST API routes
pub fn create_routes(
    service: PickService,
) -> impl Filter<Extract = impl warp::Reply, Error = Infallible> + Clone {
    let service_filter = warp::any().map(move || service.clone());

    // Pick submission
    let submit = warp::path("api")
        .and(warp::path("picks"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json::<PickRequest>())
        .and(service_filter.clone())
        .and_then(submit_pick);

    let current_pick = warp::path("api")
        .and(warp::path("picks"))
        .and(warp::path("current"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<CurrentPickParams>())
        .and(service_filter.clone())
        .and_then(get_current_pick);

    let league = warp::path("api")
        .and(warp::path("leagues"))
        .and(warp::path::param::<i64>())
        .and(warp::path::end())
        .and(warp::get())
        .and(service_filter.clone())
        .and_then(get_league);

    let leagues = warp::path("api")
        .and(warp::path("leagues"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<LeaguesParams>())
        .and(service_filter.clone())
        .and_then(get_leagues);

    let teams = warp::path("api")
        .and(warp::path("teams"))
        .and(warp::path::end())
        .and(warp::get())
        .and(service_filter.clone())
        .and_then(get_teams);

    let games = warp::path("api")
        .and(warp::path("games"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<GamesParams>())
        .and(service_filter.clone())
        .and_then(get_games);

    let user = warp::path("api")
        .and(warp::path("users"))
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<UserParams>())
        .and(service_filter.clone())
        .and_then(get_user);

    let season = warp::path("api")
        .and(warp::path("season"))
        .and(warp::path::end())
        .and(warp::get())
        .and(service_filter)
        .and_then(get_season);

    // Health check endpoint
    let health = warp::path("health").and(warp::path::end()).and(warp::get()).map(|| {
        warp::reply::json(&serde_json::json!({
            "status": "healthy",
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    });

    submit
        .or(current_pick)
        .or(league)
        .or(leagues)
        .or(teams)
        .or(games)
        .or(user)
        .or(season)
        .or(health)
        .with(
            warp::cors()
                .allow_any_origin()
                .allow_headers(vec!["content-type"])
                .allow_methods(vec!["GET", "POST", "OPTIONS"]),
        )
        .recover(handle_rejection)
        .with(warp::log::custom(|info| {
            tracing::info!(
                "{} {} {} in {:?}",
                info.method(),
                info.path(),
                info.status().as_u16(),
                info.elapsed()
            );
        }))
}
