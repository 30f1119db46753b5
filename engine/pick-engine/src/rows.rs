//! Raw rows returned by season providers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// League row; `league_id` is set when the row comes from a membership join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueRow {
    pub id: i64,
    pub league_id: Option<i64>,
    pub name: String,
    pub game_mode: String,
    pub season: String,
    pub owner_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRow {
    pub id: i64,
    pub name: String,
    pub short_name: String,
    pub sports_league: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRow {
    pub id: i64,
    pub season: String,
    pub week: i32,
    pub sports_league: String,
    pub start_time: DateTime<Utc>,
    pub home_team_short_name: String,
    pub away_team_short_name: String,
    pub home_team_score: Option<i32>,
    pub away_team_score: Option<i32>,
}

/// Pick row; `team_id` of `-1` is a BYE
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickRow {
    pub id: i64,
    pub user_id: i64,
    pub league_id: i64,
    pub team_id: i64,
    pub week: i32,
    pub invalidated_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// User row, optionally joined with a league membership
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub user_id: i64,
    pub email: String,
    pub display_name: Option<String>,
}
