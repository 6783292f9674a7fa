use std::time::Duration;

use async_trait::async_trait;

use super::{OverlayState, Presenter};
use crate::error::SurfaceError;
use crate::probes;
use crate::surface::Surface;

pub const OVERLAY_ELEMENT_ID: &str = "goOverlay";
pub const ADVANCE_FLAG_SCRIPT: &str = "return window.goNext === true;";
pub const EXIT_FLAG_SCRIPT: &str = "return window.goExit === true;";

const STATE_PLACEHOLDER: &str = "__OVERLAY_STATE__";

const OVERLAY_TEMPLATE: &str = r"(function() {
    const state = __OVERLAY_STATE__;
    const old = document.getElementById('goOverlay');
    if (old) old.remove();
    if (window.goTimerInterval) {
        clearInterval(window.goTimerInterval);
        window.goTimerInterval = null;
    }

    const div = document.createElement('div');
    div.id = 'goOverlay';
    div.style.cssText = 'position:fixed;top:20px;right:20px;z-index:999999;'
        + 'background:rgba(0,0,0,0.7);color:white;padding:20px;border-radius:14px;'
        + 'font-family:sans-serif;text-align:center;font-size:18px;';

    const title = document.createElement('div');
    title.style.cssText = 'font-size:16px;font-weight:600;opacity:0.9;';
    title.textContent = state.title;
    div.appendChild(title);

    const body = document.createElement('div');
    if (state.countdownSeconds !== null) {
        body.id = 'goTimer';
        body.style.cssText = 'font-size:36px;font-weight:700;margin-top:8px;';
    } else {
        body.style.cssText = 'font-size:14px;color:#bbb;margin-top:6px;';
    }
    body.textContent = state.subtitle;
    div.appendChild(body);

    const addButton = (id, label, flag, extraStyle) => {
        const btn = document.createElement('button');
        btn.id = id;
        btn.textContent = label;
        btn.style.cssText = 'margin-top:12px;font-size:16px;padding:6px 14px;border-radius:8px;' + extraStyle;
        btn.onclick = () => { window[flag] = true; };
        div.appendChild(btn);
    };
    if (state.showAdvanceButton) addButton('goBtn', 'NEXT', 'goNext', '');
    if (state.showExitButton) addButton('exitBtn', 'EXIT', 'goExit', 'margin-left:8px;');

    document.body.appendChild(div);
    window.goNext = false;
    window.goExit = false;

    if (state.countdownSeconds !== null) {
        const endTime = Date.now() + Math.max(0, state.countdownSeconds) * 1000;
        const formatTime = (totalSeconds) => {
            const mins = Math.floor(totalSeconds / 60);
            const secs = Math.floor(totalSeconds % 60);
            return `${mins}:${secs.toString().padStart(2, '0')}`;
        };
        const tick = () => {
            const remainingMs = Math.max(0, endTime - Date.now());
            body.innerHTML = formatTime(remainingMs / 1000) + state.timeSuffix;
            if (remainingMs <= 0 && window.goTimerInterval) {
                clearInterval(window.goTimerInterval);
                window.goTimerInterval = null;
            }
        };
        tick();
        window.goTimerInterval = setInterval(tick, 100);
    }
})();";

/// Script that replaces the overlay with one reflecting `state`.
///
/// The state travels as a JSON literal, so titles never need escaping.
#[must_use]
pub fn overlay_script(state: &OverlayState) -> String {
    let literal = serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string());
    OVERLAY_TEMPLATE.replace(STATE_PLACEHOLDER, &literal)
}

/// [`Presenter`] that injects the overlay into the page through the
/// surface's script channel and reads the click flags back from `window`.
#[derive(Clone, Copy)]
pub struct ScriptOverlay<'a> {
    surface: &'a dyn Surface,
    ready_timeout: Duration,
    ready_poll: Duration,
}

impl<'a> ScriptOverlay<'a> {
    pub const fn new(surface: &'a dyn Surface, ready_timeout: Duration, ready_poll: Duration) -> Self {
        Self {
            surface,
            ready_timeout,
            ready_poll,
        }
    }

    async fn read_flag(&self, script: &str) -> Result<bool, SurfaceError> {
        match self.surface.execute(script).await {
            Ok(value) => Ok(value.as_bool().unwrap_or(false)),
            Err(err) if err.is_recoverable() => {
                log::debug!("flag read rejected: {err}");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl Presenter for ScriptOverlay<'_> {
    async fn render(&mut self, state: &OverlayState) -> bool {
        probes::wait_until_ready(self.surface, self.ready_timeout, self.ready_poll).await;
        match self.surface.execute(&overlay_script(state)).await {
            Ok(_) => true,
            Err(err) => {
                log::warn!("overlay injection failed: {err}");
                false
            }
        }
    }

    async fn poll_advance(&mut self) -> Result<bool, SurfaceError> {
        self.read_flag(ADVANCE_FLAG_SCRIPT).await
    }

    async fn poll_exit(&mut self) -> Result<bool, SurfaceError> {
        self.read_flag(EXIT_FLAG_SCRIPT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::copy;
    use crate::scripted::{ScriptedSurface, Step};

    fn overlay(surface: &ScriptedSurface) -> ScriptOverlay<'_> {
        ScriptOverlay::new(surface, Duration::from_secs(8), Duration::from_millis(200))
    }

    #[test]
    fn script_embeds_state_as_json() {
        let state = OverlayState::countdown(copy::PLAY_TITLE, 90).with_advance();
        let script = overlay_script(&state);
        assert!(script.contains(r#""title":"Play""#));
        assert!(script.contains(r#""countdownSeconds":90"#));
        assert!(script.contains(r#""showAdvanceButton":true"#));
        assert!(!script.contains(STATE_PLACEHOLDER));
    }

    #[test]
    fn quotes_in_copy_stay_inside_the_literal() {
        let state = OverlayState::notice("It's \"done\"", "</script>");
        let script = overlay_script(&state);
        assert!(script.contains(r#""title":"It's \"done\"""#));
    }

    #[tokio::test(start_paused = true)]
    async fn render_injects_and_clears_flags() {
        let surface = ScriptedSurface::new("https://online-go.com/play")
            .at(Duration::from_secs(1), Step::ClickAdvance);
        let mut presenter = overlay(&surface);

        assert!(presenter.render(&OverlayState::notice("a", "b").with_advance()).await);
        assert!(!presenter.poll_advance().await.unwrap());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(presenter.poll_advance().await.unwrap());
        assert!(!presenter.poll_exit().await.unwrap());

        assert!(presenter.render(&OverlayState::notice("a", "b")).await);
        assert!(!presenter.poll_advance().await.unwrap());
        assert_eq!(surface.overlay_renders(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_script_reports_failure_without_error() {
        let surface = ScriptedSurface::new("about:blank").failing_scripts(1);
        let mut presenter = overlay(&surface);
        // The readiness probe eats the single scripted failure and retries.
        assert!(presenter.render(&OverlayState::notice("a", "")).await);

        let surface = ScriptedSurface::new("about:blank").failing_scripts(u32::MAX);
        let mut presenter = overlay(&surface);
        assert!(!presenter.render(&OverlayState::notice("a", "")).await);
        assert!(!presenter.poll_exit().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn lost_surface_surfaces_on_poll() {
        let surface = ScriptedSurface::new("about:blank").lost_from(Duration::ZERO);
        let mut presenter = overlay(&surface);
        assert!(!presenter.render(&OverlayState::notice("a", "")).await);
        assert!(presenter.poll_advance().await.is_err());
    }
}
