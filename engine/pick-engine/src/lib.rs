//! PickEngine - weekly pick validation and registration
//!
//! This crate decides whether a proposed weekly pick is legal for a pick'em
//! league and durably records accepted picks. Season data is read through
//! the [`SeasonProvider`] trait and picks are written through [`PickSink`],
//! so the engine runs equally against PostgreSQL or the in-memory store.
//!
//! ## Flow
//!
//! - **Validator**: ordered rule pipeline over an immutable [`SeasonSnapshot`]
//! - **Registrar**: re-confirms the league and issues a single atomic write
//! - **PickService**: serialises validate+register per (user, league, week)

pub mod clock;
pub mod config;
pub mod error;
pub mod lock;
pub mod memory;
pub mod provider;
pub mod queries;
pub mod registrar;
pub mod rows;
pub mod service;
pub mod shaping;
pub mod types;
pub mod validator;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::SeasonConfig;
pub use error::{ErrorCode, PickEngineError, ProviderError, Rejection};
pub use lock::SubmissionLocks;
pub use memory::InMemoryPickStore;
pub use provider::{LeagueDirectory, PickSink, PickStore, ProviderResult, SeasonProvider};
pub use queries::{LeagueView, PickView};
pub use registrar::register;
pub use service::{ErrorDetail, PickRequest, PickService, SubmitPickResponse};
pub use types::{
    Game, GameMode, GameResult, GameView, League, Pick, PickSubmission, Team, TeamRef, User,
};
pub use validator::{fetch_snapshot, validate, SeasonSnapshot};

/// Identifier of a registered user
pub type UserId = i64;

/// Identifier of a fantasy league
pub type LeagueId = i64;

/// Identifier of a sports team
pub type TeamId = i64;

/// Identifier of a scheduled game
pub type GameId = i64;

/// Identifier of a stored pick row
pub type PickId = i64;

/// Result type alias
pub type Result<T> = std::result::Result<T, PickEngineError>;
