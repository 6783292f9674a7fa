use tokio::time::sleep;

use super::{PhaseContext, deadline_after, remaining_secs};
use crate::error::SessionError;
use crate::overlay::{OverlayState, copy};
use crate::probes;

/// How the puzzle phase ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleOutcome {
    /// Ticks spent nagging the user to finish the open problem after time ran out.
    pub nag_ticks: u32,
}

/// Timed puzzle block. When time runs out the phase still waits for the
/// current problem to be finished before handing over.
#[derive(Debug, Default)]
pub struct PuzzleController {
    expired: bool,
    nag_ticks: u32,
}

impl PuzzleController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    ///
    /// Fails only when the browsing surface is lost.
    pub async fn run(mut self, ctx: &mut PhaseContext<'_>) -> Result<PuzzleOutcome, SessionError> {
        let puzzle_url = ctx.config.sites.puzzle_url.clone();
        let tick = ctx.config.timings.puzzle_tick();
        log::info!("puzzle phase started ({}s)", ctx.config.phases.puzzle_secs);

        ctx.navigator.ensure(ctx.surface, &puzzle_url).await?;
        let deadline = deadline_after(ctx.config.phases.puzzle());

        loop {
            let remaining = remaining_secs(deadline);
            if remaining == 0 && !self.expired {
                log::info!("puzzle time is up; waiting for the current problem");
                self.expired = true;
            }

            if self.expired {
                if probes::puzzle_complete(ctx.surface).await? {
                    ctx.show(&OverlayState::notice(
                        copy::PUZZLE_COMPLETE_TITLE,
                        copy::PUZZLE_COMPLETE_SUBTITLE,
                    ))
                    .await?;
                    sleep(ctx.config.timings.settle()).await;
                    log::info!("puzzle phase complete after {} nag ticks", self.nag_ticks);
                    return Ok(PuzzleOutcome {
                        nag_ticks: self.nag_ticks,
                    });
                }
                self.nag_ticks += 1;
                ctx.show(&OverlayState::notice(
                    copy::PUZZLE_FINISH_TITLE,
                    copy::PUZZLE_FINISH_SUBTITLE,
                ))
                .await?;
            } else {
                ctx.show(&OverlayState::countdown(copy::PUZZLE_TITLE, remaining))
                    .await?;
            }

            ctx.navigator.ensure(ctx.surface, &puzzle_url).await?;
            sleep(tick).await;
        }
    }
}
