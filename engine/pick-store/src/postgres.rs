//! PostgreSQL-backed store

use crate::{DatabaseConfig, Result, StoreError};
use pick_engine::provider::{LeagueDirectory, PickSink, ProviderResult, SeasonProvider};
use pick_engine::rows::{GameRow, LeagueRow, PickRow, TeamRow, UserRow};
use pick_engine::{LeagueId, PickSubmission, ProviderError, UserId};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;

const LEAGUE_COLUMNS: &str =
    "l.id, NULL::BIGINT AS league_id, l.name, l.game_mode, l.season, l.owner_id";

const GAME_COLUMNS: &str = "id, season, week, sports_league, start_time, home_team_short_name, \
     away_team_short_name, home_team_score, away_team_score";

const PICK_COLUMNS: &str = "id, user_id, league_id, team_id, week, invalidated_at, created_at";

/// Store over a sqlx Postgres pool
#[derive(Debug, Clone)]
pub struct PgPickStore {
    pool: PgPool,
}

impl PgPickStore {
    /// Connect a pool sized by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_with(config.connect_options()?)
            .await?;

        tracing::info!(
            "Connected to database (max_connections={}, ssl={})",
            config.max_connections,
            config.require_ssl
        );

        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn week_param(week: u32) -> std::result::Result<i32, StoreError> {
    i32::try_from(week).map_err(|_| StoreError::OutOfRange { column: "week", value: week as i64 })
}

/// Either every slot was inserted now or none was, and the stored rows are
/// this submission's pick
fn stored_whole(submission: &PickSubmission, inserted: u64, rows: &[PickRow]) -> bool {
    let all_or_none = inserted == 0 || inserted == submission.teams.len() as u64;
    all_or_none && submission.is_stored_as(rows)
}

fn league_row(row: &PgRow) -> std::result::Result<LeagueRow, sqlx::Error> {
    Ok(LeagueRow {
        id: row.try_get("id")?,
        league_id: row.try_get("league_id")?,
        name: row.try_get("name")?,
        game_mode: row.try_get("game_mode")?,
        season: row.try_get("season")?,
        owner_id: row.try_get("owner_id")?,
    })
}

fn team_row(row: &PgRow) -> std::result::Result<TeamRow, sqlx::Error> {
    Ok(TeamRow {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        short_name: row.try_get("short_name")?,
        sports_league: row.try_get("sports_league")?,
    })
}

fn game_row(row: &PgRow) -> std::result::Result<GameRow, sqlx::Error> {
    Ok(GameRow {
        id: row.try_get("id")?,
        season: row.try_get("season")?,
        week: row.try_get("week")?,
        sports_league: row.try_get("sports_league")?,
        start_time: row.try_get("start_time")?,
        home_team_short_name: row.try_get("home_team_short_name")?,
        away_team_short_name: row.try_get("away_team_short_name")?,
        home_team_score: row.try_get("home_team_score")?,
        away_team_score: row.try_get("away_team_score")?,
    })
}

fn pick_row(row: &PgRow) -> std::result::Result<PickRow, sqlx::Error> {
    Ok(PickRow {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        league_id: row.try_get("league_id")?,
        team_id: row.try_get("team_id")?,
        week: row.try_get("week")?,
        invalidated_at: row.try_get("invalidated_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn user_row(row: &PgRow) -> std::result::Result<UserRow, sqlx::Error> {
    Ok(UserRow {
        user_id: row.try_get("user_id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
    })
}

fn collect<T>(
    rows: &[PgRow],
    map: fn(&PgRow) -> std::result::Result<T, sqlx::Error>,
) -> ProviderResult<Vec<T>> {
    rows.iter().map(|row| map(row).map_err(|e| ProviderError::from(StoreError::from(e)))).collect()
}

#[async_trait::async_trait]
impl SeasonProvider for PgPickStore {
    async fn league(&self, league_id: LeagueId) -> ProviderResult<Option<LeagueRow>> {
        let sql = format!("SELECT {} FROM fantasy_leagues l WHERE l.id = $1", LEAGUE_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(league_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        Ok(row.as_ref().map(league_row).transpose().map_err(StoreError::from)?)
    }

    async fn teams(&self) -> ProviderResult<Vec<TeamRow>> {
        let rows = sqlx::query("SELECT id, name, short_name, sports_league FROM sports_teams ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        collect(&rows, team_row)
    }

    async fn games_for_week(&self, season: &str, week: u32) -> ProviderResult<Vec<GameRow>> {
        let sql = format!(
            "SELECT {} FROM sports_games WHERE season = $1 AND week = $2 ORDER BY start_time, id",
            GAME_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(season)
            .bind(week_param(week)?)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        collect(&rows, game_row)
    }

    async fn picks_for_member(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Vec<PickRow>> {
        let sql = format!(
            "SELECT {} FROM picks WHERE user_id = $1 AND league_id = $2 ORDER BY created_at, id",
            PICK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(league_id)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        collect(&rows, pick_row)
    }
}

#[async_trait::async_trait]
impl PickSink for PgPickStore {
    /// Insert one row per selection inside a transaction.
    ///
    /// Rows are keyed on (submission_id, slot). A replayed submission inserts
    /// nothing and gets back the rows stored by the first attempt; a
    /// submission id already holding a different pick is refused and the
    /// transaction rolled back.
    async fn submit_picks(&self, submission: &PickSubmission) -> ProviderResult<Vec<PickRow>> {
        let week = week_param(submission.week)?;
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        let mut inserted = 0u64;
        for (slot, team) in submission.teams.iter().enumerate() {
            let result = sqlx::query(
                "INSERT INTO picks (user_id, league_id, team_id, week, submission_id, slot) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (submission_id, slot) DO NOTHING",
            )
            .bind(submission.user_id)
            .bind(submission.league_id)
            .bind(team.storage_id())
            .bind(week)
            .bind(submission.submission_id)
            .bind(slot as i16)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::from)?;
            inserted += result.rows_affected();
        }

        let sql = format!(
            "SELECT {} FROM picks \
             WHERE submission_id = $1 AND user_id = $2 AND league_id = $3 AND week = $4 \
             ORDER BY slot",
            PICK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(submission.submission_id)
            .bind(submission.user_id)
            .bind(submission.league_id)
            .bind(week)
            .fetch_all(&mut *tx)
            .await
            .map_err(StoreError::from)?;
        let rows = collect(&rows, pick_row)?;

        if !stored_whole(submission, inserted, &rows) {
            tx.rollback().await.map_err(StoreError::from)?;
            tracing::warn!(
                "Submission {} already stored for a different pick",
                submission.submission_id
            );
            return Err(ProviderError::storage(format!(
                "submission {} already stored for a different pick",
                submission.submission_id
            )));
        }

        tx.commit().await.map_err(StoreError::from)?;

        if inserted == 0 {
            tracing::debug!(
                "Submission {} already stored, returning {} rows",
                submission.submission_id,
                rows.len()
            );
        }

        Ok(rows)
    }
}

#[async_trait::async_trait]
impl LeagueDirectory for PgPickStore {
    async fn user_by_email(&self, email: &str) -> ProviderResult<Option<UserRow>> {
        let row = sqlx::query(
            "SELECT user_id, email, display_name FROM users WHERE LOWER(email) = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        Ok(row.as_ref().map(user_row).transpose().map_err(StoreError::from)?)
    }

    async fn all_leagues(&self) -> ProviderResult<Vec<LeagueRow>> {
        let sql = format!("SELECT {} FROM fantasy_leagues l ORDER BY l.id", LEAGUE_COLUMNS);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await.map_err(StoreError::from)?;
        collect(&rows, league_row)
    }

    async fn leagues_for_user(&self, user_id: UserId) -> ProviderResult<Vec<LeagueRow>> {
        let rows = sqlx::query(
            "SELECT l.id, m.league_id, l.name, l.game_mode, l.season, l.owner_id \
             FROM league_memberships m JOIN fantasy_leagues l ON l.id = m.league_id \
             WHERE m.user_id = $1 ORDER BY l.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        collect(&rows, league_row)
    }

    async fn league_members(&self, league_id: LeagueId) -> ProviderResult<Vec<UserRow>> {
        let rows = sqlx::query(
            "SELECT u.user_id, u.email, COALESCE(m.display_name, u.display_name) AS display_name \
             FROM league_memberships m JOIN users u ON u.user_id = m.user_id \
             WHERE m.league_id = $1 ORDER BY u.user_id",
        )
        .bind(league_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::from)?;
        collect(&rows, user_row)
    }

    async fn picks_for_league(
        &self,
        league_id: LeagueId,
        through_week: Option<u32>,
    ) -> ProviderResult<Vec<PickRow>> {
        let through_week = through_week.map(week_param).transpose()?;
        let sql = format!(
            "SELECT {} FROM picks WHERE league_id = $1 AND ($2::INTEGER IS NULL OR week <= $2) \
             ORDER BY week, user_id, created_at, id",
            PICK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(league_id)
            .bind(through_week)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        collect(&rows, pick_row)
    }

    async fn games_for_season(&self, season: &str) -> ProviderResult<Vec<GameRow>> {
        let sql = format!(
            "SELECT {} FROM sports_games WHERE season = $1 ORDER BY week, start_time, id",
            GAME_COLUMNS
        );
        let rows =
            sqlx::query(&sql).bind(season).fetch_all(&self.pool).await.map_err(StoreError::from)?;
        collect(&rows, game_row)
    }

    async fn picks_for_week(
        &self,
        league_id: LeagueId,
        user_id: UserId,
        week: u32,
    ) -> ProviderResult<Vec<PickRow>> {
        let sql = format!(
            "SELECT {} FROM picks WHERE league_id = $1 AND user_id = $2 AND week = $3 \
             ORDER BY created_at, id",
            PICK_COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(league_id)
            .bind(user_id)
            .bind(week_param(week)?)
            .fetch_all(&self.pool)
            .await
            .map_err(StoreError::from)?;
        collect(&rows, pick_row)
    }

    async fn display_name(
        &self,
        user_id: UserId,
        league_id: LeagueId,
    ) -> ProviderResult<Option<String>> {
        let row = sqlx::query(
            "SELECT display_name FROM league_memberships WHERE user_id = $1 AND league_id = $2",
        )
        .bind(user_id)
        .bind(league_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        match row {
            Some(row) => Ok(row.try_get("display_name").map_err(StoreError::from)?),
            None => Ok(None),
        }
    }
}
