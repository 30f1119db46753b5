//! Read-side queries
//!
//! Lookups that back the league pages: users, leagues with their members and
//! revealed picks, the team catalog and season schedules.

use crate::provider::LeagueDirectory;
use crate::shaping::{
    games_from_rows, league_from_row, pick_from_row, resolve_pick_team, team_from_row,
    user_from_row,
};
use crate::types::{GameView, League, Pick, Team, User};
use crate::{LeagueId, PickId, Result, SeasonConfig, UserId};
use serde::{Deserialize, Serialize};

/// Pick with its team resolved for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickView {
    pub id: PickId,
    #[serde(rename = "userID")]
    pub user_id: UserId,
    pub week: u32,
    pub is_invalidated: bool,
    /// `None` when the stored team id no longer exists in the catalog
    pub team: Option<Team>,
}

impl PickView {
    fn new(pick: &Pick, teams: &[Team]) -> Self {
        Self {
            id: pick.id,
            user_id: pick.user_id,
            week: pick.week,
            is_invalidated: pick.is_invalidated,
            team: resolve_pick_team(pick, teams),
        }
    }
}

/// League page: the league, its owner, members and visible picks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueView {
    #[serde(flatten)]
    pub league: League,
    pub owner: Option<User>,
    pub users: Vec<User>,
    pub picks: Vec<PickView>,
}

/// User by email, compared case-insensitively
pub async fn user_by_email<D>(directory: &D, email: &str) -> Result<Option<User>>
where
    D: LeagueDirectory + ?Sized,
{
    let email = email.trim().to_lowercase();
    Ok(directory.user_by_email(&email).await?.as_ref().map(user_from_row))
}

/// Assemble a league page.
///
/// For the current season only weeks up to the revealed week are visible;
/// picks of past seasons are all returned.
pub async fn league_view<D>(
    directory: &D,
    league_id: LeagueId,
    config: &SeasonConfig,
) -> Result<Option<LeagueView>>
where
    D: LeagueDirectory + ?Sized,
{
    let Some(row) = directory.league(league_id).await? else {
        return Ok(None);
    };
    let league = league_from_row(&row, config);

    let through_week =
        if league.season == config.current_season { Some(config.revealed_week) } else { None };

    let (members, picks, teams) = tokio::try_join!(
        directory.league_members(league_id),
        directory.picks_for_league(league_id, through_week),
        directory.teams(),
    )?;

    let users: Vec<User> = members.iter().map(user_from_row).collect();
    let owner = league.owner_id.and_then(|owner_id| users.iter().find(|u| u.id == owner_id).cloned());
    let teams: Vec<Team> = teams.iter().map(team_from_row).collect();
    let picks = picks.iter().map(pick_from_row).map(|pick| PickView::new(&pick, &teams)).collect();

    Ok(Some(LeagueView { league, owner, users, picks }))
}

/// Leagues of one member, or every league when no member is given
pub async fn leagues<D>(
    directory: &D,
    user_id: Option<UserId>,
    config: &SeasonConfig,
) -> Result<Vec<League>>
where
    D: LeagueDirectory + ?Sized,
{
    let rows = match user_id {
        Some(user_id) => directory.leagues_for_user(user_id).await?,
        None => directory.all_leagues().await?,
    };
    Ok(rows.iter().map(|row| league_from_row(row, config)).collect())
}

pub async fn sports_teams<D>(directory: &D) -> Result<Vec<Team>>
where
    D: LeagueDirectory + ?Sized,
{
    Ok(directory.teams().await?.iter().map(team_from_row).collect())
}

/// Schedule of a season, defaulting to the current one
pub async fn sports_games<D>(
    directory: &D,
    season: Option<&str>,
    config: &SeasonConfig,
) -> Result<Vec<GameView>>
where
    D: LeagueDirectory + ?Sized,
{
    let season = season.unwrap_or(&config.current_season);
    let (games, teams) = tokio::try_join!(directory.games_for_season(season), directory.teams())?;
    let teams: Vec<Team> = teams.iter().map(team_from_row).collect();
    Ok(games_from_rows(&games, &teams))
}

/// A member's picks for the current week
pub async fn current_pick<D>(
    directory: &D,
    league_id: LeagueId,
    user_id: UserId,
    config: &SeasonConfig,
) -> Result<Vec<Pick>>
where
    D: LeagueDirectory + ?Sized,
{
    let rows = directory.picks_for_week(league_id, user_id, config.current_week).await?;
    Ok(rows.iter().map(pick_from_row).collect())
}

pub fn current_season(config: &SeasonConfig) -> &str {
    &config.current_season
}

/// Name a user goes by in a league, falling back to their account name
pub async fn display_name<D>(directory: &D, user: &User, league_id: LeagueId) -> Result<Option<String>>
where
    D: LeagueDirectory + ?Sized,
{
    let name = directory.display_name(user.id, league_id).await?;
    Ok(name.or_else(|| user.display_name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPickStore;
    use crate::rows::{GameRow, LeagueRow, PickRow, TeamRow, UserRow};
    use crate::types::TeamRef;
    use crate::ErrorCode;
    use chrono::{TimeZone, Utc};

    fn config() -> SeasonConfig {
        SeasonConfig { current_week: 6, revealed_week: 5, ..SeasonConfig::new("2025") }
    }

    fn pick_row(id: i64, user_id: i64, league_id: i64, team_id: i64, week: i32) -> PickRow {
        PickRow {
            id,
            user_id,
            league_id,
            team_id,
            week,
            invalidated_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap(),
        }
    }

    fn league_row(id: i64, season: &str) -> LeagueRow {
        LeagueRow {
            id,
            league_id: None,
            name: format!("League {}", id),
            game_mode: "PICK_TWO".to_string(),
            season: season.to_string(),
            owner_id: Some(1),
        }
    }

    async fn store() -> InMemoryPickStore {
        let store = InMemoryPickStore::new();
        store.insert_league(league_row(1, "2025")).await;
        store.insert_league(league_row(2, "2024")).await;
        for (id, short_name) in [(1, "KC"), (2, "BAL")] {
            store
                .insert_team(TeamRow {
                    id,
                    name: format!("Team {}", short_name),
                    short_name: short_name.to_string(),
                    sports_league: "NFL".to_string(),
                })
                .await;
        }
        for (user_id, email, name) in [(1, "Owner@Example.com", "Owner"), (2, "pat@example.com", "Pat")]
        {
            store
                .insert_user(UserRow {
                    user_id,
                    email: email.to_string(),
                    display_name: Some(name.to_string()),
                })
                .await;
        }
        store.add_member(1, 1, None).await;
        store.add_member(1, 2, Some("Patrick".to_string())).await;
        store.add_member(2, 2, None).await;

        store.insert_pick(pick_row(1, 2, 1, 1, 5)).await;
        store.insert_pick(pick_row(2, 2, 1, -1, 6)).await;
        store.insert_pick(pick_row(3, 2, 1, -1, 6)).await;
        store.insert_pick(pick_row(4, 2, 2, 2, 17)).await;
        store
    }

    #[tokio::test]
    async fn test_user_lookup_is_case_insensitive() {
        let store = store().await;
        let user = user_by_email(&store, "  OWNER@example.COM").await.unwrap().unwrap();
        assert_eq!(user.id, 1);
        assert!(user_by_email(&store, "nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_season_hides_unrevealed_weeks() {
        let store = store().await;
        let view = league_view(&store, 1, &config()).await.unwrap().unwrap();

        assert_eq!(view.picks.len(), 1);
        assert_eq!(view.picks[0].week, 5);
        assert_eq!(view.picks[0].team.as_ref().map(|t| t.short_name.as_str()), Some("KC"));
        assert_eq!(view.owner.as_ref().map(|u| u.id), Some(1));
        assert_eq!(view.users.len(), 2);
        assert!(view.users.iter().any(|u| u.display_name.as_deref() == Some("Patrick")));
    }

    #[tokio::test]
    async fn test_past_season_shows_every_pick() {
        let store = store().await;
        let view = league_view(&store, 2, &config()).await.unwrap().unwrap();
        assert_eq!(view.picks.len(), 1);
        assert_eq!(view.picks[0].week, 17);
        assert!(view.owner.is_none());
    }

    #[tokio::test]
    async fn test_missing_league_view_is_none() {
        let store = store().await;
        assert!(league_view(&store, 42, &config()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_leagues_for_member_and_all() {
        let store = store().await;
        let mine = leagues(&store, Some(1), &config()).await.unwrap();
        assert_eq!(mine.iter().map(|l| l.id).collect::<Vec<_>>(), vec![1]);

        let all = leagues(&store, None, &config()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|l| l.current_week == 6 && l.revealed_week == 5));
    }

    #[tokio::test]
    async fn test_current_pick_uses_current_week() {
        let store = store().await;
        let picks = current_pick(&store, 1, 2, &config()).await.unwrap();
        assert_eq!(picks.len(), 2);
        assert!(picks.iter().all(|p| p.team == TeamRef::Bye && p.week == 6));
    }

    #[tokio::test]
    async fn test_sports_games_defaults_to_current_season() {
        let store = store().await;
        for (id, season) in [(10, "2025"), (11, "2024")] {
            store
                .insert_game(GameRow {
                    id,
                    season: season.to_string(),
                    week: 1,
                    sports_league: "NFL".to_string(),
                    start_time: Utc.with_ymd_and_hms(2025, 9, 7, 17, 0, 0).unwrap(),
                    home_team_short_name: "KC".to_string(),
                    away_team_short_name: "BAL".to_string(),
                    home_team_score: Some(24),
                    away_team_score: Some(20),
                })
                .await;
        }

        let games = sports_games(&store, None, &config()).await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].id, 10);
        assert_eq!(games[0].home_team.as_ref().map(|t| t.id), Some(1));

        let older = sports_games(&store, Some("2024"), &config()).await.unwrap();
        assert_eq!(older[0].id, 11);
    }

    #[tokio::test]
    async fn test_display_name_override_and_fallback() {
        let store = store().await;
        let pat = user_by_email(&store, "pat@example.com").await.unwrap().unwrap();

        assert_eq!(display_name(&store, &pat, 1).await.unwrap().as_deref(), Some("Patrick"));
        assert_eq!(display_name(&store, &pat, 2).await.unwrap().as_deref(), Some("Pat"));
    }

    #[tokio::test]
    async fn test_catalog_and_season() {
        let store = store().await;
        assert_eq!(sports_teams(&store).await.unwrap().len(), 2);
        assert_eq!(current_season(&config()), "2025");
    }

    #[tokio::test]
    async fn test_read_failure_is_unknown_error() {
        let store = store().await;
        store.fail_reads(true);
        let err = sports_teams(&store).await.unwrap_err();
        assert_eq!(err.error_code(), ErrorCode::Unknown);
    }
}
