//! Pick registration

use crate::provider::{PickSink, SeasonProvider};
use crate::shaping::{league_from_row, pick_from_row};
use crate::types::{GameMode, Pick, PickSubmission};
use crate::{PickEngineError, Result, SeasonConfig};

/// Persist an accepted submission and return the stored picks.
///
/// The league is looked up again so a caller that skipped validation still
/// cannot write into an unsupported league. Any failure here is a storage
/// failure; callers treat it as retryable rather than as invalid input.
pub async fn register<S>(
    store: &S,
    submission: &PickSubmission,
    config: &SeasonConfig,
) -> Result<Vec<Pick>>
where
    S: SeasonProvider + PickSink + ?Sized,
{
    let league = store
        .league(submission.league_id)
        .await?
        .map(|row| league_from_row(&row, config));

    match league {
        Some(league) if league.game_mode == GameMode::PickTwo => {}
        Some(league) => {
            tracing::warn!(
                "Refusing to register picks for league {} with game mode {}",
                league.id,
                league.game_mode.as_str()
            );
            return Err(PickEngineError::Storage {
                message: format!("league {} unavailable for registration", league.id),
            });
        }
        None => {
            return Err(PickEngineError::Storage {
                message: format!("league {} unavailable for registration", submission.league_id),
            });
        }
    }

    let rows = store.submit_picks(submission).await.map_err(|e| {
        tracing::error!("Failed to store picks for submission {}: {}", submission.submission_id, e);
        PickEngineError::from(e)
    })?;

    tracing::debug!(
        "Stored {} pick rows for user {} league {} week {}",
        rows.len(),
        submission.user_id,
        submission.league_id,
        submission.week
    );

    Ok(rows.iter().map(pick_from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryPickStore;
    use crate::rows::LeagueRow;
    use crate::types::TeamRef;
    use crate::ErrorCode;
    use uuid::Uuid;

    async fn store_with_league(game_mode: &str) -> InMemoryPickStore {
        let store = InMemoryPickStore::new();
        store
            .insert_league(LeagueRow {
                id: 1,
                league_id: None,
                name: "Office".to_string(),
                game_mode: game_mode.to_string(),
                season: "2025".to_string(),
                owner_id: None,
            })
            .await;
        store
    }

    fn submission(league_id: i64, teams: Vec<TeamRef>) -> PickSubmission {
        PickSubmission { submission_id: Uuid::new_v4(), user_id: 7, league_id, week: 5, teams }
    }

    #[tokio::test]
    async fn test_register_double_bye() {
        let store = store_with_league("PICK_TWO").await;
        let config = SeasonConfig::new("2025");

        let picks =
            register(&store, &submission(1, vec![TeamRef::Bye, TeamRef::Bye]), &config).await.unwrap();

        assert_eq!(picks.len(), 2);
        for pick in &picks {
            assert_eq!(pick.team, TeamRef::Bye);
            assert_eq!(pick.week, 5);
            assert_eq!(pick.user_id, 7);
            assert_eq!(pick.league_id, 1);
            assert!(!pick.is_invalidated);
        }
    }

    #[tokio::test]
    async fn test_register_rechecks_game_mode() {
        let store = store_with_league("SURVIVOR").await;
        let err = register(
            &store,
            &submission(1, vec![TeamRef::Team(1), TeamRef::Team(2)]),
            &SeasonConfig::new("2025"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), ErrorCode::Unknown);
        assert!(store.picks().await.is_empty());
    }

    #[tokio::test]
    async fn test_register_missing_league() {
        let store = InMemoryPickStore::new();
        let err = register(
            &store,
            &submission(99, vec![TeamRef::Team(1), TeamRef::Team(2)]),
            &SeasonConfig::new("2025"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, PickEngineError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_write_failure_reported_as_storage() {
        let store = store_with_league("PICK_TWO").await;
        store.fail_writes(true);

        let err = register(
            &store,
            &submission(1, vec![TeamRef::Team(1), TeamRef::Team(2)]),
            &SeasonConfig::new("2025"),
        )
        .await
        .unwrap_err();

        assert_eq!(err.error_code(), ErrorCode::Unknown);
    }
}
