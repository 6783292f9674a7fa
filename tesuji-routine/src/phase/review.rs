use std::time::Duration;

use tokio::time::sleep;

use super::{PhaseContext, deadline_after, remaining_secs};
use crate::error::SessionError;
use crate::lookup;
use crate::overlay::{OverlayState, copy};
use crate::session::GameReference;

/// What the user chose once the review was over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// No game to review; the loop goes straight on.
    Skipped,
    /// Play another round.
    Advance,
    /// Stop the routine.
    Exit,
}

impl ReviewOutcome {
    #[must_use]
    pub const fn ends_session(self) -> bool {
        matches!(self, Self::Exit)
    }
}

/// Length of the review for a game that lasted `game`.
///
/// Short games get a review no longer than the game itself, but never less
/// than `floor`. Unknown or long games get the full `default`.
#[must_use]
pub fn review_duration(default: Duration, game: Option<Duration>, floor: Duration) -> Duration {
    match game {
        Some(length) if length < default => Duration::from_secs(length.as_secs()).max(floor),
        _ => default,
    }
}

/// Timed review of the last game in an external analysis tool.
#[derive(Debug, Default)]
pub struct ReviewController;

impl ReviewController {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// # Errors
    ///
    /// Fails only when the browsing surface is lost.
    pub async fn run(
        self,
        ctx: &mut PhaseContext<'_>,
        game: Option<GameReference>,
    ) -> Result<ReviewOutcome, SessionError> {
        let Some(game) = game else {
            log::info!("no game to review; skipping review phase");
            return Ok(ReviewOutcome::Skipped);
        };

        let review_url = ctx.config.sites.review_url(game.id());
        ctx.navigator.navigate_now(ctx.surface, &review_url).await?;

        let length = review_duration(
            ctx.config.phases.review(),
            lookup::duration_seconds(game.metadata()),
            ctx.config.phases.review_floor(),
        );
        log::info!("review phase started for game {} ({}s)", game.id(), length.as_secs());

        let deadline = deadline_after(length);
        let tick = ctx.config.timings.review_tick();
        loop {
            let remaining = remaining_secs(deadline);
            if remaining == 0 {
                break;
            }
            ctx.show(&OverlayState::countdown(copy::REVIEW_TITLE, remaining))
                .await?;
            sleep(tick).await;
        }

        let done = OverlayState::notice(copy::REVIEW_COMPLETE_TITLE, copy::REVIEW_COMPLETE_SUBTITLE)
            .with_advance()
            .with_exit();
        let tick = ctx.config.timings.terminal_tick();
        // A fresh render clears the click flags, so poll before drawing again.
        loop {
            ctx.show(&done).await?;
            sleep(tick).await;
            if ctx.presenter.poll_exit().await? {
                log::info!("review complete; exit requested");
                return Ok(ReviewOutcome::Exit);
            }
            if ctx.presenter.poll_advance().await? {
                log::info!("review complete; playing again");
                return Ok(ReviewOutcome::Advance);
            }
        }
    }
}
