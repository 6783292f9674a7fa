//! On-page status overlay: what to show, and the capability that shows it.

pub mod copy;
mod script;

pub use script::{ADVANCE_FLAG_SCRIPT, EXIT_FLAG_SCRIPT, OVERLAY_ELEMENT_ID, ScriptOverlay, overlay_script};

use async_trait::async_trait;
use serde::Serialize;

use crate::error::SurfaceError;

/// Everything one overlay render shows. Each render fully replaces the
/// previous overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayState {
    pub title: String,
    pub subtitle: String,
    /// Seconds left on a self-refreshing timer, if any.
    pub countdown_seconds: Option<u64>,
    pub show_advance_button: bool,
    pub show_exit_button: bool,
    /// Markup appended after the timer text.
    pub time_suffix: String,
}

impl OverlayState {
    /// Title and subtitle, no timer, no buttons.
    pub fn notice(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            ..Self::default()
        }
    }

    /// Live countdown from `remaining_secs`.
    pub fn countdown(title: impl Into<String>, remaining_secs: u64) -> Self {
        Self {
            title: title.into(),
            subtitle: format_clock(remaining_secs),
            countdown_seconds: Some(remaining_secs),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_advance(mut self) -> Self {
        self.show_advance_button = true;
        self
    }

    #[must_use]
    pub const fn with_exit(mut self) -> Self {
        self.show_exit_button = true;
        self
    }

    #[must_use]
    pub fn with_time_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.time_suffix = suffix.into();
        self
    }
}

/// `m:ss`
#[must_use]
pub fn format_clock(total_secs: u64) -> String {
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

/// Renders overlays and relays the user's clicks back to the controller.
///
/// Every render clears both intent flags; a poll reports whether the
/// matching button was clicked since the last render.
#[async_trait]
pub trait Presenter: Send {
    /// Replace the overlay. Returns `false` if it could not be shown this
    /// time; the caller decides when repeated failures become fatal.
    async fn render(&mut self, state: &OverlayState) -> bool;

    /// # Errors
    ///
    /// Returns an error only if the surface itself is gone.
    async fn poll_advance(&mut self) -> Result<bool, SurfaceError>;

    /// # Errors
    ///
    /// Returns an error only if the surface itself is gone.
    async fn poll_exit(&mut self) -> Result<bool, SurfaceError>;
}
