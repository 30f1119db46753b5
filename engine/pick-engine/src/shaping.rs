//! Row-to-entity shaping
//!
//! Pure projections from provider rows into the public entity shapes.

use crate::rows::{GameRow, LeagueRow, PickRow, TeamRow, UserRow};
use crate::types::{Game, GameMode, GameView, League, Pick, Team, TeamRef, User};
use crate::SeasonConfig;

/// Week columns are signed in storage; a negative week is corrupt and reads as 0
fn week_from_column(week: i32) -> u32 {
    u32::try_from(week).unwrap_or_else(|_| {
        tracing::warn!("Negative week {} in stored row, reading as week 0", week);
        0
    })
}

pub fn league_from_row(row: &LeagueRow, config: &SeasonConfig) -> League {
    League {
        id: row.league_id.unwrap_or(row.id),
        name: row.name.clone(),
        game_mode: GameMode::from(row.game_mode.as_str()),
        season: row.season.clone(),
        current_week: config.current_week,
        revealed_week: config.revealed_week,
        owner_id: row.owner_id,
    }
}

pub fn team_from_row(row: &TeamRow) -> Team {
    Team {
        id: row.id,
        name: row.name.clone(),
        short_name: row.short_name.clone(),
        sports_league: row.sports_league.clone(),
    }
}

pub fn user_from_row(row: &UserRow) -> User {
    User { id: row.user_id, email: row.email.clone(), display_name: row.display_name.clone() }
}

pub fn pick_from_row(row: &PickRow) -> Pick {
    Pick {
        id: row.id,
        user_id: row.user_id,
        league_id: row.league_id,
        week: week_from_column(row.week),
        team: TeamRef::from_storage(row.team_id),
        is_invalidated: row.invalidated_at.is_some(),
        created_at: row.created_at,
    }
}

pub fn game_from_row(row: &GameRow) -> Game {
    Game {
        id: row.id,
        season: row.season.clone(),
        week: week_from_column(row.week),
        sports_league: row.sports_league.clone(),
        starts_at: row.start_time,
        home_team_short_name: row.home_team_short_name.clone(),
        away_team_short_name: row.away_team_short_name.clone(),
        home_team_score: row.home_team_score,
        away_team_score: row.away_team_score,
    }
}

/// Shape a schedule, resolving home and away teams by short name
pub fn games_from_rows(rows: &[GameRow], teams: &[Team]) -> Vec<GameView> {
    let find = |short_name: &str| teams.iter().find(|t| t.short_name == short_name).cloned();

    rows.iter()
        .map(|row| {
            let game = game_from_row(row);
            GameView {
                id: game.id,
                sports_league: game.sports_league.clone(),
                starts_at: game.starts_at,
                week: game.week,
                away_team: find(&game.away_team_short_name),
                home_team: find(&game.home_team_short_name),
                result: game.result(),
            }
        })
        .collect()
}

/// Team a pick refers to; BYE resolves to the sentinel display team
pub fn resolve_pick_team(pick: &Pick, teams: &[Team]) -> Option<Team> {
    match pick.team {
        TeamRef::Bye => Some(Team::bye()),
        TeamRef::Team(id) => teams.iter().find(|t| t.id == id).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn team_row(id: i64, short_name: &str) -> TeamRow {
        TeamRow {
            id,
            name: format!("Team {}", short_name),
            short_name: short_name.to_string(),
            sports_league: "NFL".to_string(),
        }
    }

    #[test]
    fn test_negative_week_column_reads_as_zero() {
        assert_eq!(week_from_column(7), 7);
        assert_eq!(week_from_column(-3), 0);
    }

    #[test]
    fn test_league_from_membership_row_prefers_league_id() {
        let row = LeagueRow {
            id: 90,
            league_id: Some(4),
            name: "Office".to_string(),
            game_mode: "PICK_TWO".to_string(),
            season: "2025".to_string(),
            owner_id: Some(1),
        };
        let mut config = SeasonConfig::new("2025");
        config.current_week = 6;
        config.revealed_week = 5;

        let league = league_from_row(&row, &config);
        assert_eq!(league.id, 4);
        assert_eq!(league.game_mode, GameMode::PickTwo);
        assert_eq!(league.current_week, 6);
        assert_eq!(league.revealed_week, 5);
    }

    #[test]
    fn test_league_week_defaults() {
        let row = LeagueRow {
            id: 4,
            league_id: None,
            name: "Office".to_string(),
            game_mode: "PICK_TWO".to_string(),
            season: "2025".to_string(),
            owner_id: None,
        };
        let league = league_from_row(&row, &SeasonConfig::new("2025"));
        assert_eq!(league.id, 4);
        assert_eq!(league.current_week, 1);
        assert_eq!(league.revealed_week, 0);
    }

    #[test]
    fn test_pick_from_row_maps_bye_and_invalidation() {
        let created = Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap();
        let row = PickRow {
            id: 1,
            user_id: 2,
            league_id: 3,
            team_id: -1,
            week: 4,
            invalidated_at: Some(created),
            created_at: created,
        };
        let pick = pick_from_row(&row);
        assert_eq!(pick.team, TeamRef::Bye);
        assert!(pick.is_invalidated);
        assert_eq!(pick.week, 4);
        assert_eq!(resolve_pick_team(&pick, &[]), Some(Team::bye()));
    }

    #[test]
    fn test_resolve_real_team() {
        let teams = vec![team_from_row(&team_row(5, "DET"))];
        let pick = Pick {
            id: 1,
            user_id: 1,
            league_id: 1,
            week: 2,
            team: TeamRef::Team(5),
            is_invalidated: false,
            created_at: Utc::now(),
        };
        assert_eq!(resolve_pick_team(&pick, &teams).map(|t| t.short_name), Some("DET".into()));
    }

    #[test]
    fn test_games_resolve_teams_by_short_name() {
        let teams: Vec<Team> =
            [team_row(1, "KC"), team_row(2, "BAL")].iter().map(team_from_row).collect();
        let rows = vec![GameRow {
            id: 10,
            season: "2025".to_string(),
            week: 1,
            sports_league: "NFL".to_string(),
            start_time: Utc.with_ymd_and_hms(2025, 9, 5, 0, 20, 0).unwrap(),
            home_team_short_name: "KC".to_string(),
            away_team_short_name: "XYZ".to_string(),
            home_team_score: None,
            away_team_score: None,
        }];

        let games = games_from_rows(&rows, &teams);
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].home_team.as_ref().map(|t| t.id), Some(1));
        assert!(games[0].away_team.is_none());
        assert!(!games[0].result.complete);
    }
}
