//! The outer loop: puzzle, play, review, again.

use serde::Serialize;

use crate::account;
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::lookup::{self, GameLookup, GameMetadata};
use crate::overlay::Presenter;
use crate::phase::{PhaseContext, PlayController, PuzzleController, ReviewController, ReviewOutcome};
use crate::surface::Surface;

/// A game seen during the play phase.
///
/// Its metadata is fetched lazily and at most once, even when the fetch
/// comes back empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameReference {
    id: String,
    metadata: Option<GameMetadata>,
    outcome: Option<String>,
    resolved: bool,
}

impl GameReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: None,
            outcome: None,
            resolved: false,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn metadata(&self) -> Option<&GameMetadata> {
        self.metadata.as_ref()
    }

    #[must_use]
    pub fn outcome_text(&self) -> Option<&str> {
        self.outcome.as_deref()
    }

    /// Whether the lookup has already been asked about this game.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// The game's outcome text, asking `lookup` the first time only.
    pub async fn resolve(&mut self, lookup: &dyn GameLookup) -> Option<&str> {
        if !self.resolved {
            self.resolved = true;
            self.metadata = lookup.fetch(&self.id).await;
            self.outcome = lookup::outcome_text(self.metadata.as_ref()).map(str::to_owned);
        }
        self.outcome.as_deref()
    }
}

/// State carried from one loop iteration to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Set once a review has looped back into another round.
    pub extra_practice: bool,
    /// Game handed from the play phase to the review phase.
    pub active_game: Option<GameReference>,
}

/// Counters reported when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub cycles: u32,
    pub reviews: u32,
    pub skipped_reviews: u32,
    pub puzzle_nag_ticks: u32,
}

/// Drives the account gates once, then puzzle, play and review until the
/// user asks to stop.
pub struct TrainingSession<'a> {
    ctx: PhaseContext<'a>,
    state: SessionState,
    summary: SessionSummary,
}

impl<'a> TrainingSession<'a> {
    /// # Errors
    ///
    /// Returns [`SessionError::Config`] if `config` fails validation.
    pub fn new(
        surface: &'a dyn Surface,
        presenter: &'a mut dyn Presenter,
        lookup: &'a dyn GameLookup,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            ctx: PhaseContext::new(surface, presenter, lookup, config),
            state: SessionState::default(),
            summary: SessionSummary::default(),
        })
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Run until the review phase's EXIT button is clicked.
    ///
    /// # Errors
    ///
    /// Fails only when the browsing surface is lost.
    pub async fn run(mut self) -> Result<SessionSummary, SessionError> {
        account::run_gates(&mut self.ctx).await?;
        loop {
            if self.run_cycle().await?.ends_session() {
                log::info!(
                    "session finished after {} cycles ({} reviews)",
                    self.summary.cycles,
                    self.summary.reviews
                );
                return Ok(self.summary);
            }
        }
    }

    /// One puzzle, play and review round.
    ///
    /// # Errors
    ///
    /// Fails only when the browsing surface is lost.
    pub async fn run_cycle(&mut self) -> Result<ReviewOutcome, SessionError> {
        self.summary.cycles += 1;
        log::info!("cycle {} starting", self.summary.cycles);

        let puzzle = PuzzleController::new().run(&mut self.ctx).await?;
        self.summary.puzzle_nag_ticks += puzzle.nag_ticks;

        let play = PlayController::new(self.ctx.config.phases.play(), self.state.extra_practice)
            .run(&mut self.ctx)
            .await?;
        self.state.active_game = play.game;

        let review = ReviewController::new()
            .run(&mut self.ctx, self.state.active_game.take())
            .await?;
        match review {
            ReviewOutcome::Skipped => self.summary.skipped_reviews += 1,
            ReviewOutcome::Advance | ReviewOutcome::Exit => self.summary.reviews += 1,
        }
        if !review.ends_session() {
            self.state.extra_practice = true;
        }
        Ok(review)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::CannedLookup;

    #[tokio::test]
    async fn resolve_fetches_once_even_when_empty() {
        let lookup = CannedLookup::new();
        let mut game = GameReference::new("12");
        assert_eq!(game.resolve(&lookup).await, None);
        assert_eq!(game.resolve(&lookup).await, None);
        assert!(game.is_resolved());
        assert_eq!(lookup.calls(), vec!["12"]);
    }

    #[tokio::test]
    async fn resolve_caches_outcome_text() {
        let lookup = CannedLookup::new().with(
            "3",
            GameMetadata {
                outcome: Some("White resigned".to_string()),
                ..GameMetadata::default()
            },
        );
        let mut game = GameReference::new("3");
        assert!(!game.is_resolved());
        assert_eq!(game.resolve(&lookup).await, Some("White resigned"));
        assert_eq!(game.outcome_text(), Some("White resigned"));
        assert!(game.metadata().is_some());
        game.resolve(&lookup).await;
        assert_eq!(lookup.calls().len(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let surface = crate::scripted::ScriptedSurface::new("about:blank");
        let mut presenter = crate::scripted::RecordingPresenter::new();
        let mut config = SessionConfig::default();
        config.max_render_failures = 0;
        let result = TrainingSession::new(&surface, &mut presenter, &lookup::NoLookup, config);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }
}
