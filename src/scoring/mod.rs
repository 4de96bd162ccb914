//! Match scoring engine: round model, win targets, merge rule, live session, and finalization.
//!
//! Nothing in this module performs I/O; the service layer wires it to storage,
//! the REST backend, and notifications.

/// Validation conditions raised by the engine.
pub mod error;
/// Round finalization.
pub mod finalizer;
/// Server/local round reconciliation.
pub mod merge;
/// Round and point-event records.
pub mod rounds;
/// Live point counter for the round being scored.
pub mod session;
/// Win-score presets and thresholds.
pub mod win_target;

pub use self::error::ScoringError;
pub use self::finalizer::finalize_round;
pub use self::merge::{DataOrigin, MergedRounds, merge_rounds};
pub use self::rounds::{MAX_ROUNDS_PER_MATCH, MatchId, Origin, PointEvent, RoundRecord, Team};
pub use self::session::ScoringSession;
pub use self::win_target::{WinScoreSetting, WinTarget};
