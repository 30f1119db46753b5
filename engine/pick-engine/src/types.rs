//! Public entities of a pick'em league

use crate::rows::PickRow;
use crate::{GameId, LeagueId, PickId, Rejection, TeamId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stored team id that marks a BYE pick
pub const BYE_TEAM_ID: TeamId = -1;

/// Wire form of a BYE selection
pub const BYE_WIRE_ID: &str = "-1";

/// Reference to a team selection: a real team or the BYE sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TeamRef {
    Team(TeamId),
    Bye,
}

impl TeamRef {
    /// Parse the wire form (`"-1"` or a decimal team id)
    pub fn parse(raw: &str) -> Result<Self, Rejection> {
        if raw == BYE_WIRE_ID {
            return Ok(TeamRef::Bye);
        }
        raw.parse::<TeamId>()
            .map(TeamRef::Team)
            .map_err(|_| Rejection::MalformedTeamId { raw: raw.to_string() })
    }

    /// Map a stored team id, where `-1` is BYE
    pub fn from_storage(team_id: TeamId) -> Self {
        if team_id == BYE_TEAM_ID {
            TeamRef::Bye
        } else {
            TeamRef::Team(team_id)
        }
    }

    /// Team id as written to storage
    pub fn storage_id(&self) -> TeamId {
        match self {
            TeamRef::Team(id) => *id,
            TeamRef::Bye => BYE_TEAM_ID,
        }
    }

    pub fn is_bye(&self) -> bool {
        matches!(self, TeamRef::Bye)
    }

    pub fn team_id(&self) -> Option<TeamId> {
        match self {
            TeamRef::Team(id) => Some(*id),
            TeamRef::Bye => None,
        }
    }
}

impl fmt::Display for TeamRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamRef::Team(id) => write!(f, "{}", id),
            TeamRef::Bye => f.write_str(BYE_WIRE_ID),
        }
    }
}

impl From<TeamRef> for String {
    fn from(team: TeamRef) -> Self {
        team.to_string()
    }
}

impl TryFrom<String> for TeamRef {
    type Error = Rejection;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        TeamRef::parse(&raw)
    }
}

/// League game mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum GameMode {
    /// Two team selections per week
    PickTwo,
    Other(String),
}

impl GameMode {
    pub fn as_str(&self) -> &str {
        match self {
            GameMode::PickTwo => "PICK_TWO",
            GameMode::Other(mode) => mode,
        }
    }
}

impl From<&str> for GameMode {
    fn from(mode: &str) -> Self {
        match mode {
            "PICK_TWO" => GameMode::PickTwo,
            other => GameMode::Other(other.to_string()),
        }
    }
}

impl From<String> for GameMode {
    fn from(mode: String) -> Self {
        GameMode::from(mode.as_str())
    }
}

impl From<GameMode> for String {
    fn from(mode: GameMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Fantasy league
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub game_mode: GameMode,
    pub season: String,
    pub current_week: u32,
    pub revealed_week: u32,
    #[serde(rename = "ownerID")]
    pub owner_id: Option<UserId>,
}

/// Sports team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub short_name: String,
    pub sports_league: String,
}

impl Team {
    /// Display team standing in for a BYE pick
    pub fn bye() -> Self {
        Self {
            id: BYE_TEAM_ID,
            name: "BYE".to_string(),
            short_name: "BYE".to_string(),
            sports_league: "NFL".to_string(),
        }
    }
}

/// Scheduled game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    pub season: String,
    pub week: u32,
    pub sports_league: String,
    pub starts_at: DateTime<Utc>,
    pub home_team_short_name: String,
    pub away_team_short_name: String,
    pub home_team_score: Option<i32>,
    pub away_team_score: Option<i32>,
}

impl Game {
    /// Whether `short_name` plays in this game
    pub fn involves(&self, short_name: &str) -> bool {
        self.home_team_short_name == short_name || self.away_team_short_name == short_name
    }

    /// Picks lock at kickoff
    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now
    }

    pub fn result(&self) -> GameResult {
        match (self.away_team_score, self.home_team_score) {
            (Some(away), Some(home)) => GameResult {
                complete: true,
                away_team_score: Some(away),
                home_team_score: Some(home),
            },
            _ => GameResult { complete: false, away_team_score: None, home_team_score: None },
        }
    }
}

/// Final score of a game, when known
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_team_score: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_team_score: Option<i32>,
}

/// Game with both teams resolved against the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: GameId,
    pub sports_league: String,
    pub starts_at: DateTime<Utc>,
    pub week: u32,
    pub away_team: Option<Team>,
    pub home_team: Option<Team>,
    pub result: GameResult,
}

/// Stored pick row in public form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pick {
    pub id: PickId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    #[serde(rename = "leagueID")]
    pub league_id: LeagueId,
    pub week: u32,
    pub team: TeamRef,
    pub is_invalidated: bool,
    pub created_at: DateTime<Utc>,
}

/// League member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: Option<String>,
}

/// An accepted candidate, ready to be written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickSubmission {
    /// Idempotency key of the write
    pub submission_id: Uuid,
    pub user_id: UserId,
    pub league_id: LeagueId,
    pub week: u32,
    pub teams: Vec<TeamRef>,
}

impl PickSubmission {
    /// Whether `rows`, in slot order, are exactly what this submission writes.
    ///
    /// A stored submission id is only replayed for the same member, league,
    /// week and teams.
    pub fn is_stored_as(&self, rows: &[PickRow]) -> bool {
        rows.len() == self.teams.len()
            && rows.iter().zip(&self.teams).all(|(row, team)| {
                row.user_id == self.user_id
                    && row.league_id == self.league_id
                    && i64::from(row.week) == i64::from(self.week)
                    && row.team_id == team.storage_id()
            })
    }
}
