//! PickService - submitPick orchestration
//!
//! Decodes a request, serialises it against other submissions for the same
//! (user, league, week), validates it against a fresh snapshot and registers
//! it. Outcomes are mapped onto the response envelope returned to clients.

use crate::clock::{Clock, SystemClock};
use crate::error::ErrorCode;
use crate::lock::SubmissionLocks;
use crate::provider::PickStore;
use crate::registrar::register;
use crate::types::{Pick, PickSubmission, TeamRef};
use crate::validator::{fetch_snapshot, validate};
use crate::{LeagueId, PickEngineError, Result, SeasonConfig, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Message returned when the write fails
pub const STORAGE_FAILURE_MESSAGE: &str = "Storing the pick failed. Please retry.";

/// submitPick request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickRequest {
    #[serde(rename = "userID", deserialize_with = "deserialize_id")]
    pub user_id: UserId,
    #[serde(rename = "leagueID", deserialize_with = "deserialize_id")]
    pub league_id: LeagueId,
    #[serde(rename = "teamIDs")]
    pub team_ids: Vec<String>,
    pub week: u32,
    /// Client-supplied idempotency key for safe retries
    #[serde(rename = "submissionID", default, skip_serializing_if = "Option::is_none")]
    pub submission_id: Option<Uuid>,
}

/// Ids arrive either as JSON numbers or as strings
fn deserialize_id<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Error entry of the response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: ErrorCode,
    pub message: String,
}

/// submitPick response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitPickResponse {
    pub pick: Option<Vec<Pick>>,
    pub errors: Vec<ErrorDetail>,
}

impl SubmitPickResponse {
    fn success(picks: Vec<Pick>) -> Self {
        Self { pick: Some(picks), errors: Vec::new() }
    }

    fn failure(err: &PickEngineError) -> Self {
        let message = match err {
            PickEngineError::Rejected(rejection) => rejection.to_string(),
            _ => STORAGE_FAILURE_MESSAGE.to_string(),
        };
        Self { pick: None, errors: vec![ErrorDetail { code: err.error_code(), message }] }
    }

    pub fn is_success(&self) -> bool {
        self.pick.is_some()
    }
}

/// Validates and registers weekly picks
#[derive(Clone)]
pub struct PickService {
    store: Arc<dyn PickStore>,
    config: SeasonConfig,
    locks: SubmissionLocks,
    clock: Arc<dyn Clock>,
}

impl PickService {
    /// Create a service using the wall clock
    pub fn new(store: Arc<dyn PickStore>, config: SeasonConfig) -> Self {
        Self::with_clock(store, config, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn PickStore>, config: SeasonConfig, clock: Arc<dyn Clock>) -> Self {
        Self { store, config, locks: SubmissionLocks::new(), clock }
    }

    pub fn config(&self) -> &SeasonConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PickStore> {
        &self.store
    }

    pub fn locks(&self) -> &SubmissionLocks {
        &self.locks
    }

    /// Validate and register a weekly pick
    pub async fn submit_pick(&self, request: PickRequest) -> SubmitPickResponse {
        let (user_id, league_id, week) = (request.user_id, request.league_id, request.week);

        match self.try_submit(request).await {
            Ok(picks) => {
                tracing::info!(
                    "Registered {} picks for user {} league {} week {}",
                    picks.len(),
                    user_id,
                    league_id,
                    week
                );
                SubmitPickResponse::success(picks)
            }
            Err(err @ PickEngineError::Rejected(_)) => {
                tracing::warn!(
                    "Rejected pick for user {} league {} week {}: {}",
                    user_id,
                    league_id,
                    week,
                    err
                );
                SubmitPickResponse::failure(&err)
            }
            Err(err) => {
                tracing::error!(
                    "Pick submission failed for user {} league {} week {}: {}",
                    user_id,
                    league_id,
                    week,
                    err
                );
                SubmitPickResponse::failure(&err)
            }
        }
    }

    async fn try_submit(&self, request: PickRequest) -> Result<Vec<Pick>> {
        let teams = request
            .team_ids
            .iter()
            .map(|raw| TeamRef::parse(raw))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let submission = PickSubmission {
            submission_id: request.submission_id.unwrap_or_else(Uuid::new_v4),
            user_id: request.user_id,
            league_id: request.league_id,
            week: request.week,
            teams,
        };

        let _guard =
            self.locks.acquire(submission.user_id, submission.league_id, submission.week).await;

        let snapshot = fetch_snapshot(
            self.store.as_ref(),
            submission.user_id,
            submission.league_id,
            submission.week,
            &self.config,
        )
        .await?;

        validate(&submission, &snapshot, &self.config, self.clock.now())?;

        register(self.store.as_ref(), &submission, &self.config).await
    }
}

impl std::fmt::Debug for PickService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickService")
            .field("config", &self.config)
            .field("locks", &self.locks.len())
            .finish()
    }
}
