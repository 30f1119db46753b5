//! In-memory store (for testing and local development)

use crate::provider::{LeagueDirectory, PickSink, ProviderResult, SeasonProvider};
use crate::rows::{GameRow, LeagueRow, PickRow, TeamRow, UserRow};
use crate::types::PickSubmission;
use crate::{LeagueId, ProviderError, UserId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct StoreState {
    leagues: Vec<LeagueRow>,
    teams: Vec<TeamRow>,
    games: Vec<GameRow>,
    picks: Vec<PickRow>,
    users: Vec<UserRow>,
    /// (league, user, display name)
    memberships: Vec<(LeagueId, UserId, Option<String>)>,
    submissions: HashMap<Uuid, Vec<i64>>,
    next_pick_id: i64,
}

/// Store holding every table in memory behind a single mutex
#[derive(Debug, Clone, Default)]
pub struct InMemoryPickStore {
    state: Arc<Mutex<StoreState>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryPickStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_league(&self, row: LeagueRow) {
        self.state.lock().await.leagues.push(row);
    }

    pub async fn insert_team(&self, row: TeamRow) {
        self.state.lock().await.teams.push(row);
    }

    pub async fn insert_game(&self, row: GameRow) {
        self.state.lock().await.games.push(row);
    }

    /// Seed a historical pick row as-is
    pub async fn insert_pick(&self, row: PickRow) {
        let mut state = self.state.lock().await;
        state.next_pick_id = state.next_pick_id.max(row.id);
        state.picks.push(row);
    }

    pub async fn insert_user(&self, row: UserRow) {
        self.state.lock().await.users.push(row);
    }

    pub async fn add_member(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        display_name: Option<String>,
    ) {
        self.state.lock().await.memberships.push((league_id, user_id, display_name));
    }

    /// Make every subsequent read fail with a lookup error
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail with a storage error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of writes that inserted rows
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every stored pick row
    pub async fn picks(&self) -> Vec<PickRow> {
        self.state.lock().await.picks.clone()
    }

    fn check_reads(&self) -> ProviderResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ProviderError::lookup("in-memory store reads disabled"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl SeasonProvider for InMemoryPickStore {
    async fn league(&self, league_id: LeagueId) -> ProviderResult<Option<LeagueRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state.leagues.iter().find(|l| l.id == league_id).cloned())
    }

    async fn teams(&self) -> ProviderResult<Vec<TeamRow>> {
        self.check_reads()?;
        Ok(self.state.lock().await.teams.clone())
    }

    async fn games_for_week(&self, season: &str, week: u32) -> ProviderResult<Vec<GameRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .games
            .iter()
            .filter(|g| g.season == season && g.week == week as i32)
            .cloned()
            .collect())
    }

    async fn picks_for_member(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Vec<PickRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .picks
            .iter()
            .filter(|p| p.user_id == user_id && p.league_id == league_id)
            .cloned()
            .collect())
    }
}

#[async_trait::async_trait]
impl PickSink for InMemoryPickStore {
    async fn submit_picks(&self, submission: &PickSubmission) -> ProviderResult<Vec<PickRow>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ProviderError::storage("in-memory store writes disabled"));
        }

        let mut state = self.state.lock().await;

        if let Some(ids) = state.submissions.get(&submission.submission_id) {
            let existing = ids
                .iter()
                .filter_map(|id| state.picks.iter().find(|p| p.id == *id))
                .cloned()
                .collect::<Vec<_>>();
            if !submission.is_stored_as(&existing) {
                tracing::warn!(
                    "Submission {} already stored for a different pick",
                    submission.submission_id
                );
                return Err(ProviderError::storage(format!(
                    "submission {} already stored for a different pick",
                    submission.submission_id
                )));
            }
            tracing::debug!(
                "Submission {} already stored, returning {} rows",
                submission.submission_id,
                existing.len()
            );
            return Ok(existing);
        }

        let created_at = chrono::Utc::now();
        let mut rows = Vec::with_capacity(submission.teams.len());
        for team in &submission.teams {
            state.next_pick_id += 1;
            rows.push(PickRow {
                id: state.next_pick_id,
                user_id: submission.user_id,
                league_id: submission.league_id,
                team_id: team.storage_id(),
                week: submission.week as i32,
                invalidated_at: None,
                created_at,
            });
        }

        state.picks.extend(rows.iter().cloned());
        state.submissions.insert(submission.submission_id, rows.iter().map(|r| r.id).collect());
        self.writes.fetch_add(1, Ordering::SeqCst);

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl LeagueDirectory for InMemoryPickStore {
    async fn user_by_email(&self, email: &str) -> ProviderResult<Option<UserRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email.to_lowercase() == email).cloned())
    }

    async fn all_leagues(&self) -> ProviderResult<Vec<LeagueRow>> {
        self.check_reads()?;
        Ok(self.state.lock().await.leagues.clone())
    }

    async fn leagues_for_user(&self, user_id: UserId) -> ProviderResult<Vec<LeagueRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(_, member, _)| *member == user_id)
            .filter_map(|(league_id, _, _)| state.leagues.iter().find(|l| l.id == *league_id))
            .map(|league| LeagueRow { league_id: Some(league.id), ..league.clone() })
            .collect())
    }

    async fn league_members(&self, league_id: LeagueId) -> ProviderResult<Vec<UserRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|(league, _, _)| *league == league_id)
            .filter_map(|(_, user_id, display_name)| {
                state.users.iter().find(|u| u.user_id == *user_id).map(|user| UserRow {
                    display_name: display_name.clone().or_else(|| user.display_name.clone()),
                    ..user.clone()
                })
            })
            .collect())
    }

    async fn picks_for_league(
        &self,
        league_id: LeagueId,
        through_week: Option<u32>,
    ) -> ProviderResult<Vec<PickRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .picks
            .iter()
            .filter(|p| p.league_id == league_id)
            .filter(|p| through_week.map_or(true, |week| p.week <= week as i32))
            .cloned()
            .collect())
    }

    async fn games_for_season(&self, season: &str) -> ProviderResult<Vec<GameRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state.games.iter().filter(|g| g.season == season).cloned().collect())
    }

    async fn picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week: u32,
    ) -> ProviderResult<Vec<PickRow>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .picks
            .iter()
            .filter(|p| p.league_id == league_id && p.user_id == user_id && p.week == week as i32)
            .cloned()
            .collect())
    }

    async fn display_name(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Option<String>> {
        self.check_reads()?;
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|(league, member, _)| *league == league_id && *member == user_id)
            .and_then(|(_, _, name)| name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TeamRef;

    fn submission(teams: Vec<TeamRef>) -> PickSubmission {
        PickSubmission { submission_id: Uuid::new_v4(), user_id: 1, league_id: 2, week: 3, teams }
    }

    #[tokio::test]
    async fn test_submit_writes_one_row_per_team() {
        let store = InMemoryPickStore::new();
        let rows = store.submit_picks(&submission(vec![TeamRef::Bye, TeamRef::Bye])).await.unwrap();

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.team_id == -1 && r.week == 3 && r.invalidated_at.is_none()));
        assert_ne!(rows[0].id, rows[1].id);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_submit_is_idempotent_on_submission_id() {
        let store = InMemoryPickStore::new();
        let sub = submission(vec![TeamRef::Team(1), TeamRef::Team(2)]);

        let first = store.submit_picks(&sub).await.unwrap();
        let again = store.submit_picks(&sub).await.unwrap();

        assert_eq!(first, again);
        assert_eq!(store.picks().await.len(), 2);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_reused_submission_id_for_other_pick_refused() {
        let store = InMemoryPickStore::new();
        let sub = submission(vec![TeamRef::Team(1), TeamRef::Team(2)]);
        store.submit_picks(&sub).await.unwrap();

        let other_user = PickSubmission { user_id: 9, ..sub.clone() };
        let other_week = PickSubmission { week: 4, ..sub.clone() };
        let other_teams = PickSubmission { teams: vec![TeamRef::Team(3), TeamRef::Team(4)], ..sub };

        for reused in [other_user, other_week, other_teams] {
            let err = store.submit_picks(&reused).await.unwrap_err();
            assert!(matches!(err, ProviderError::Storage(_)));
        }
        assert_eq!(store.picks().await.len(), 2);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_resubmission_appends_rows() {
        let store = InMemoryPickStore::new();
        store.submit_picks(&submission(vec![TeamRef::Team(1), TeamRef::Team(2)])).await.unwrap();
        store.submit_picks(&submission(vec![TeamRef::Team(3), TeamRef::Team(4)])).await.unwrap();

        let history = store.picks_for_member(1, 2).await.unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = InMemoryPickStore::new();
        store.fail_writes(true);
        let err = store.submit_picks(&submission(vec![TeamRef::Bye, TeamRef::Bye])).await;
        assert!(matches!(err, Err(ProviderError::Storage(_))));

        store.fail_reads(true);
        assert!(matches!(store.teams().await, Err(ProviderError::Lookup(_))));
    }

    #[tokio::test]
    async fn test_members_use_league_display_name() {
        let store = InMemoryPickStore::new();
        store
            .insert_user(UserRow {
                user_id: 9,
                email: "Sam@Example.com".to_string(),
                display_name: Some("Sam".to_string()),
            })
            .await;
        store.add_member(2, 9, Some("Sammy".to_string())).await;

        let members = store.league_members(2).await.unwrap();
        assert_eq!(members[0].display_name.as_deref(), Some("Sammy"));
        assert_eq!(store.display_name(9, 2).await.unwrap().as_deref(), Some("Sammy"));
        assert!(store.user_by_email("sam@example.com").await.unwrap().is_some());
    }
}
