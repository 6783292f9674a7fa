//! Sign-in checks run once before the first round.

use tokio::time::sleep;

use crate::config::AccountGate;
use crate::error::SessionError;
use crate::overlay::{OverlayState, copy};
use crate::phase::PhaseContext;
use crate::probes;

/// Walk every configured gate in order.
///
/// # Errors
///
/// Fails only when the browsing surface is lost.
pub async fn run_gates(ctx: &mut PhaseContext<'_>) -> Result<(), SessionError> {
    let gates = ctx.config.accounts.clone();
    for gate in &gates {
        wait_for_sign_in(ctx, gate).await?;
    }
    Ok(())
}

/// Whether visiting the gate's check address bounces to its login page.
///
/// # Errors
///
/// Propagates surface failures.
pub async fn requires_login(ctx: &mut PhaseContext<'_>, gate: &AccountGate) -> Result<bool, SessionError> {
    ctx.navigator.ensure(ctx.surface, &gate.check_url).await?;
    probes::wait_until_ready(
        ctx.surface,
        ctx.config.timings.dom_ready_timeout(),
        ctx.config.timings.dom_ready_poll(),
    )
    .await;
    sleep(ctx.config.timings.login_settle()).await;
    Ok(ctx.surface.current_url().await?.contains(&gate.login_fragment))
}

/// Hold on the gate's login page until the user has signed in.
///
/// # Errors
///
/// Fails only when the browsing surface is lost.
pub async fn wait_for_sign_in(ctx: &mut PhaseContext<'_>, gate: &AccountGate) -> Result<(), SessionError> {
    if !requires_login(ctx, gate).await? {
        log::debug!("already signed in at {}", gate.check_url);
        return Ok(());
    }
    log::info!("sign-in required at {}", gate.login_url);
    ctx.navigator.ensure(ctx.surface, &gate.login_url).await?;

    let tick = ctx.config.timings.login_tick();
    loop {
        ctx.show(&OverlayState::notice(copy::ACCOUNT_SETUP_TITLE, &gate.subtitle))
            .await?;
        if !ctx.surface.current_url().await?.contains(&gate.login_fragment) {
            log::info!("signed in; leaving {}", gate.login_url);
            return Ok(());
        }
        sleep(tick).await;
    }
}
