//! The three phase controllers and the context they share.

mod play;
mod puzzle;
mod review;

pub use play::{PlayController, PlayExit, PlayOutcome, PlayPhase};
pub use puzzle::{PuzzleController, PuzzleOutcome};
pub use review::{ReviewController, ReviewOutcome, review_duration};

use std::time::Duration;

use tokio::time::Instant;

use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::lookup::GameLookup;
use crate::navigation::NavigationGuard;
use crate::overlay::{OverlayState, Presenter};
use crate::surface::Surface;

/// Collaborators every controller needs, passed explicitly.
pub struct PhaseContext<'a> {
    pub surface: &'a dyn Surface,
    pub presenter: &'a mut dyn Presenter,
    pub lookup: &'a dyn GameLookup,
    pub navigator: NavigationGuard,
    pub config: SessionConfig,
    render_failures: u32,
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        surface: &'a dyn Surface,
        presenter: &'a mut dyn Presenter,
        lookup: &'a dyn GameLookup,
        config: SessionConfig,
    ) -> Self {
        Self {
            surface,
            presenter,
            lookup,
            navigator: NavigationGuard::from_timings(&config.timings),
            config,
            render_failures: 0,
        }
    }

    /// Render `state`, tolerating isolated failures.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SurfaceLost`] once renders have failed
    /// `max_render_failures` times in a row.
    pub async fn show(&mut self, state: &OverlayState) -> Result<(), SessionError> {
        if self.presenter.render(state).await {
            self.render_failures = 0;
            return Ok(());
        }
        self.render_failures += 1;
        log::warn!(
            "overlay \"{}\" not shown ({} consecutive failures)",
            state.title,
            self.render_failures
        );
        if self.render_failures >= self.config.max_render_failures {
            return Err(SessionError::SurfaceLost {
                failures: self.render_failures,
            });
        }
        Ok(())
    }
}

/// Whole seconds left before `deadline`; zero once it has passed.
pub(crate) fn remaining_secs(deadline: Instant) -> u64 {
    deadline.saturating_duration_since(Instant::now()).as_secs()
}

pub(crate) fn deadline_after(length: Duration) -> Instant {
    Instant::now() + length
}
