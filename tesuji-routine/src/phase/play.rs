use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, sleep};

use super::{PhaseContext, deadline_after, remaining_secs};
use crate::error::SessionError;
use crate::lookup;
use crate::overlay::{OverlayState, copy};
use crate::probes;
use crate::session::GameReference;

/// Sub-phase of the play block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayPhase {
    /// No live game on screen.
    Searching,
    InGame,
    /// A game just ended without a reviewable outcome; waiting for NEXT.
    OfferReview,
    /// The block ran out with no game in progress; waiting for NEXT.
    TimeUp,
}

impl PlayPhase {
    /// Terminal sub-phases never expire on their own.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::OfferReview | Self::TimeUp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayExit {
    /// A reviewable game ended and the block handed over on its own.
    AutoAdvanced,
    /// The user clicked NEXT in the given terminal sub-phase.
    Advanced(PlayPhase),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayOutcome {
    pub exit: PlayExit,
    /// Last game seen during the block, with whatever metadata was fetched.
    pub game: Option<GameReference>,
}

/// Timed live-play block.
///
/// A running game is never cut off by the timer; a finished game with a
/// reviewable outcome ends the block early.
#[derive(Debug)]
pub struct PlayController {
    phase: PlayPhase,
    game: Option<GameReference>,
    deadline: Instant,
    extra_practice: bool,
}

impl PlayController {
    #[must_use]
    pub fn new(length: Duration, extra_practice: bool) -> Self {
        Self {
            phase: PlayPhase::Searching,
            game: None,
            deadline: deadline_after(length),
            extra_practice,
        }
    }

    #[must_use]
    pub const fn phase(&self) -> PlayPhase {
        self.phase
    }

    #[must_use]
    pub const fn game(&self) -> Option<&GameReference> {
        self.game.as_ref()
    }

    /// # Errors
    ///
    /// Fails only when the browsing surface is lost.
    pub async fn run(mut self, ctx: &mut PhaseContext<'_>) -> Result<PlayOutcome, SessionError> {
        log::info!(
            "play phase started ({}s{})",
            ctx.config.phases.play_secs,
            if self.extra_practice { ", extra practice" } else { "" }
        );
        let play_url = ctx.config.sites.play_url.clone();
        ctx.navigator.navigate_now(ctx.surface, &play_url).await?;

        let tick = ctx.config.timings.play_tick();
        loop {
            if let Some(outcome) = self.tick(ctx).await? {
                log::info!(
                    "play phase ended: {:?}, game {}",
                    outcome.exit,
                    outcome.game.as_ref().map_or("none", GameReference::id)
                );
                return Ok(outcome);
            }
            sleep(tick).await;
        }
    }

    async fn tick(&mut self, ctx: &mut PhaseContext<'_>) -> Result<Option<PlayOutcome>, SessionError> {
        let remaining = remaining_secs(self.deadline);

        if self.phase.is_terminal() && ctx.presenter.poll_advance().await? {
            return Ok(Some(self.finish(PlayExit::Advanced(self.phase))));
        }

        let url = ctx.surface.current_url().await?;
        if let Some(id) = probes::game_id_from_url(&url) {
            self.capture(id);
        }

        let marker = ctx.config.sites.game_page_marker();
        let in_game = probes::in_active_game(ctx.surface, &marker).await?;
        if in_game {
            self.enter(PlayPhase::InGame);
        } else if self.phase == PlayPhase::InGame {
            if probes::game_finished(ctx.surface).await? {
                if self.reviewable(ctx).await
                    && !probes::in_active_game(ctx.surface, &marker).await?
                {
                    ctx.show(&OverlayState::notice(
                        copy::GAME_FINISHED_AUTO_TITLE,
                        copy::GAME_FINISHED_AUTO_SUBTITLE,
                    ))
                    .await?;
                    sleep(ctx.config.timings.settle()).await;
                    return Ok(Some(self.finish(PlayExit::AutoAdvanced)));
                }
                self.enter(PlayPhase::OfferReview);
            } else {
                // Table restarted or game cancelled.
                self.enter(PlayPhase::Searching);
            }
        }

        if remaining == 0 && !in_game && self.phase != PlayPhase::OfferReview {
            self.enter(PlayPhase::TimeUp);
        }

        ctx.show(&self.overlay(remaining)).await?;
        let domain = ctx.config.sites.play_domain.clone();
        ctx.navigator.enforce_domain(ctx.surface, &domain).await?;
        Ok(None)
    }

    /// Fetch the current game's outcome (once per game id) and judge it.
    async fn reviewable(&mut self, ctx: &PhaseContext<'_>) -> bool {
        let Some(game) = self.game.as_mut() else {
            return false;
        };
        let outcome = game.resolve(ctx.lookup).await.map(str::to_owned);
        log::info!(
            "game {} finished: {}",
            game.id(),
            outcome.as_deref().unwrap_or("unknown outcome")
        );
        lookup::is_reviewable(outcome.as_deref())
    }

    fn capture(&mut self, id: String) {
        if self.game.as_ref().is_some_and(|game| game.id() == id) {
            return;
        }
        log::info!("tracking game {id}");
        self.game = Some(GameReference::new(id));
    }

    fn enter(&mut self, phase: PlayPhase) {
        if self.phase != phase {
            log::info!("play: {:?} -> {phase:?}", self.phase);
            self.phase = phase;
        }
    }

    fn overlay(&self, remaining: u64) -> OverlayState {
        match self.phase {
            PlayPhase::OfferReview => {
                OverlayState::notice(copy::GAME_FINISHED_TITLE, copy::GAME_FINISHED_SUBTITLE)
                    .with_advance()
            }
            PlayPhase::TimeUp => {
                OverlayState::notice(copy::PLAY_COMPLETE_TITLE, copy::PLAY_COMPLETE_SUBTITLE)
                    .with_advance()
            }
            PlayPhase::Searching | PlayPhase::InGame if remaining > 0 => {
                let state = OverlayState::countdown(copy::PLAY_TITLE, remaining);
                if self.extra_practice {
                    state.with_time_suffix(copy::EXTRA_PRACTICE_SUFFIX)
                } else {
                    state
                }
            }
            PlayPhase::Searching | PlayPhase::InGame => {
                OverlayState::notice(copy::PLAY_WAITING_TITLE, "")
            }
        }
    }

    fn finish(&mut self, exit: PlayExit) -> PlayOutcome {
        PlayOutcome {
            exit,
            game: self.game.take(),
        }
    }
}
