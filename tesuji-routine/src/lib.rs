//! Tesuji Routine
//!
//! Browser-agnostic core of a timed Go training routine: a puzzle block, a
//! live-play block and an AI review block, repeated until the user stops.
//! Everything here talks to the browser through the [`Surface`] trait and to
//! the play server's API through [`GameLookup`], so whole sessions can be
//! replayed against the doubles in [`scripted`].

pub mod account;
pub mod config;
pub mod error;
pub mod lookup;
pub mod navigation;
pub mod overlay;
pub mod phase;
pub mod probes;
pub mod scripted;
pub mod session;
pub mod surface;

// Re-export commonly used types
pub use config::{AccountGate, ConfigError, PhaseDurations, SessionConfig, SiteConfig, Timings};
pub use error::{SessionError, SurfaceError};
pub use lookup::{GameLookup, GameMetadata, NoLookup, is_reviewable};
pub use navigation::NavigationGuard;
pub use overlay::{OverlayState, Presenter, ScriptOverlay, format_clock};
pub use phase::{
    PhaseContext, PlayController, PlayExit, PlayOutcome, PlayPhase, PuzzleController,
    PuzzleOutcome, ReviewController, ReviewOutcome, review_duration,
};
pub use probes::game_id_from_url;
pub use session::{GameReference, SessionState, SessionSummary, TrainingSession};
pub use surface::{Locator, Surface};
