//! Handicap timeline maintenance on top of the `handicap` engine.
//!
//! - [`persistence`]: repository traits and the SQLite backend.
//! - [`recompute`]: per-player timeline rebuilds and the batch worker pool.
//! - [`rounds`]: round lifecycle mutations that trigger recomputes.
//! - [`queries`]: current index, recent differentials, tee projections.
//! - [`fixture`]: JSON import.

pub mod config;
pub mod fixture;
pub mod locks;
pub mod persistence;
pub mod queries;
pub mod recompute;
pub mod rounds;

pub use fixture::{import_fixture, Fixture, FixtureError, ImportReport};
pub use queries::{
    CurrentHandicap, DifferentialDetail, HandicapQueries, IndexSource, QueryError, TeeProjection,
};
pub use recompute::{
    rebuild_all, PlayerFailure, RebuildReport, RecomputeDiagnostic, RecomputeError,
    RecomputeService, TimelineResult,
};
pub use rounds::{RoundError, RoundService};
