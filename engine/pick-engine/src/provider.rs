//! Provider and sink traits
//!
//! The engine never talks to a database directly. Reads go through
//! [`SeasonProvider`] (and [`LeagueDirectory`] for the read-side queries),
//! writes go through [`PickSink`].

use crate::rows::{GameRow, LeagueRow, PickRow, TeamRow, UserRow};
use crate::types::PickSubmission;
use crate::{LeagueId, ProviderError, UserId};

/// Result type for provider operations
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;

/// Read-only season data needed to validate a pick
#[async_trait::async_trait]
pub trait SeasonProvider: Send + Sync {
    /// League by id; `None` when it does not exist
    async fn league(&self, league_id: LeagueId) -> ProviderResult<Option<LeagueRow>>;

    /// Full team catalog
    async fn teams(&self) -> ProviderResult<Vec<TeamRow>>;

    /// Games scheduled for one week of a season
    async fn games_for_week(&self, season: &str, week: u32) -> ProviderResult<Vec<GameRow>>;

    /// Every pick a member has made in a league, invalidated ones included
    async fn picks_for_member(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Vec<PickRow>>;
}

/// Durable pick writes
#[async_trait::async_trait]
pub trait PickSink: Send + Sync {
    /// Write one row per team selection in a single atomic operation.
    ///
    /// Repeating a write with the same `submission_id` returns the rows
    /// already stored for it.
    async fn submit_picks(&self, submission: &PickSubmission) -> ProviderResult<Vec<PickRow>>;
}

/// Read-side lookups behind the league, user and schedule queries
#[async_trait::async_trait]
pub trait LeagueDirectory: SeasonProvider {
    /// User by lower-cased email
    async fn user_by_email(&self, email: &str) -> ProviderResult<Option<UserRow>>;

    async fn all_leagues(&self) -> ProviderResult<Vec<LeagueRow>>;

    /// Leagues a user belongs to (membership join rows)
    async fn leagues_for_user(&self, user_id: UserId) -> ProviderResult<Vec<LeagueRow>>;

    /// Members of a league with their per-league display names
    async fn league_members(&self, league_id: LeagueId) -> ProviderResult<Vec<UserRow>>;

    /// Picks in a league, optionally limited to weeks up to `through_week`
    async fn picks_for_league(
        &self,
        league_id: LeagueId,
        through_week: Option<u32>,
    ) -> ProviderResult<Vec<PickRow>>;

    /// Full schedule of a season
    async fn games_for_season(&self, season: &str) -> ProviderResult<Vec<GameRow>>;

    /// A member's picks for one week
    async fn picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week: u32,
    ) -> ProviderResult<Vec<PickRow>>;

    /// Display name a user chose for a league
    async fn display_name(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Option<String>>;
}

/// Everything a hosting service needs from its backing store
pub trait PickStore: LeagueDirectory + PickSink {}

impl<T> PickStore for T where T: LeagueDirectory + PickSink {}
