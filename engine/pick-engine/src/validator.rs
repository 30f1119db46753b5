//! Pick validation pipeline
//!
//! A candidate is checked against an immutable [`SeasonSnapshot`] by an
//! ordered list of rules. The first rule that fails decides the rejection;
//! rule order is part of the contract and must not change.

use crate::provider::SeasonProvider;
use crate::shaping::{game_from_row, league_from_row, pick_from_row, team_from_row};
use crate::types::{Game, GameMode, League, Pick, PickSubmission, Team};
use crate::{LeagueId, ProviderError, Rejection, SeasonConfig, UserId};
use chrono::{DateTime, Utc};

/// Season state a validation pass runs against
#[derive(Debug, Clone, Default)]
pub struct SeasonSnapshot {
    pub league: Option<League>,
    pub teams: Vec<Team>,
    /// Games of the candidate's week
    pub week_games: Vec<Game>,
    /// The member's full pick history in the league
    pub history: Vec<Pick>,
}

impl SeasonSnapshot {
    fn team(&self, team_id: i64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == team_id)
    }

    fn game_for(&self, short_name: &str) -> Option<&Game> {
        self.week_games.iter().find(|g| g.involves(short_name))
    }
}

/// Read everything one validation pass needs.
///
/// The four reads are independent and run concurrently.
pub async fn fetch_snapshot<P>(
    provider: &P,
    user_id: UserId,
    league_id: LeagueId,
    week: u32,
    config: &SeasonConfig,
) -> Result<SeasonSnapshot, ProviderError>
where
    P: SeasonProvider + ?Sized,
{
    let (league, teams, games, history) = tokio::try_join!(
        provider.league(league_id),
        provider.teams(),
        provider.games_for_week(&config.current_season, week),
        provider.picks_for_member(user_id, league_id),
    )?;

    Ok(SeasonSnapshot {
        league: league.map(|row| league_from_row(&row, config)),
        teams: teams.iter().map(team_from_row).collect(),
        week_games: games.iter().map(game_from_row).collect(),
        history: history.iter().map(pick_from_row).collect(),
    })
}

/// State threaded through the rules of one pass
struct RuleContext<'a> {
    candidate: &'a PickSubmission,
    snapshot: &'a SeasonSnapshot,
    config: &'a SeasonConfig,
    now: DateTime<Utc>,
    /// Games of the selected teams, filled by the schedule rule
    picked_games: Vec<&'a Game>,
}

type Rule = for<'a> fn(&mut RuleContext<'a>) -> Result<(), Rejection>;

const RULES: [(&str, Rule); 9] = [
    ("game_mode", game_mode_gate),
    ("cardinality", cardinality),
    ("duplicate_team", duplicate_team),
    ("mixed_bye", mixed_bye),
    ("schedule_presence", schedule_presence),
    ("self_matchup", self_matchup),
    ("lock_time", lock_time),
    ("historical_reuse", historical_reuse),
    ("previous_week_lock", previous_week_lock),
];

/// Run the rule pipeline. `Ok(())` means the candidate may be registered.
pub fn validate(
    candidate: &PickSubmission,
    snapshot: &SeasonSnapshot,
    config: &SeasonConfig,
    now: DateTime<Utc>,
) -> Result<(), Rejection> {
    let mut ctx = RuleContext { candidate, snapshot, config, now, picked_games: Vec::new() };

    for (name, rule) in RULES.iter() {
        if let Err(rejection) = rule(&mut ctx) {
            tracing::debug!(
                "Pick for user {} league {} week {} failed rule {}: {}",
                candidate.user_id,
                candidate.league_id,
                candidate.week,
                name,
                rejection
            );
            return Err(rejection);
        }
    }

    Ok(())
}

fn game_mode_gate(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    match &ctx.snapshot.league {
        Some(league) if league.game_mode == GameMode::PickTwo => Ok(()),
        _ => Err(Rejection::UnsupportedLeague),
    }
}

fn cardinality(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let selected = ctx.candidate.teams.len();
    if selected != 2 {
        return Err(Rejection::WrongTeamCount { selected });
    }
    Ok(())
}

fn duplicate_team(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let (first, second) = (ctx.candidate.teams[0], ctx.candidate.teams[1]);
    if first == second && !first.is_bye() {
        return Err(Rejection::DuplicateTeam);
    }
    Ok(())
}

fn mixed_bye(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let (first, second) = (ctx.candidate.teams[0], ctx.candidate.teams[1]);
    if first != second && (first.is_bye() || second.is_bye()) {
        return Err(Rejection::MixedBye);
    }
    Ok(())
}

fn schedule_presence(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let (candidate, snapshot) = (ctx.candidate, ctx.snapshot);
    for team_id in candidate.teams.iter().filter_map(|t| t.team_id()) {
        let team = snapshot.team(team_id).ok_or(Rejection::UnknownTeam { team_id })?;
        let game = snapshot
            .game_for(&team.short_name)
            .ok_or_else(|| Rejection::NoGameThisWeek { short_name: team.short_name.clone() })?;
        ctx.picked_games.push(game);
    }
    Ok(())
}

fn self_matchup(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    if let [first, second] = ctx.picked_games.as_slice() {
        if first.id == second.id && ctx.candidate.week != ctx.config.final_week {
            return Err(Rejection::SameGame { final_week: ctx.config.final_week });
        }
    }
    Ok(())
}

fn lock_time(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    if ctx.picked_games.iter().any(|game| game.has_started(ctx.now)) {
        return Err(Rejection::GameStarted);
    }
    Ok(())
}

fn historical_reuse(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let limit = ctx.config.bye_limit;
    let mut bye_count = 0u32;

    let earlier_weeks = ctx
        .snapshot
        .history
        .iter()
        .filter(|pick| !pick.is_invalidated && pick.week != ctx.candidate.week);

    for pick in earlier_weeks {
        if !ctx.candidate.teams.contains(&pick.team) {
            continue;
        }
        if pick.team.is_bye() {
            bye_count += 1;
            if bye_count >= limit {
                return Err(Rejection::ByeLimitReached { limit });
            }
        } else {
            return Err(Rejection::TeamAlreadyPicked);
        }
    }

    Ok(())
}

fn previous_week_lock(ctx: &mut RuleContext<'_>) -> Result<(), Rejection> {
    let snapshot = ctx.snapshot;
    let same_week = snapshot
        .history
        .iter()
        .filter(|pick| !pick.is_invalidated && pick.week == ctx.candidate.week);

    for team_id in same_week.filter_map(|pick| pick.team.team_id()) {
        let Some(team) = snapshot.team(team_id) else {
            continue;
        };
        if let Some(game) = snapshot.game_for(&team.short_name) {
            if game.has_started(ctx.now) {
                return Err(Rejection::PreviousPickLocked);
            }
        }
    }

    Ok(())
}
