//! Session configuration: phase lengths, polling cadence, and target sites.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when session configuration invariants are violated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },
    #[error("review floor {floor}s exceeds the review length {review}s")]
    ReviewFloorTooLong { floor: u64, review: u64 },
}

/// Lengths of the three phases, in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDurations {
    #[serde(default = "PhaseDurations::default_puzzle_secs")]
    pub puzzle_secs: u64,
    #[serde(default = "PhaseDurations::default_play_secs")]
    pub play_secs: u64,
    #[serde(default = "PhaseDurations::default_review_secs")]
    pub review_secs: u64,
    /// Shortest review ever scheduled, however short the game was.
    #[serde(default = "PhaseDurations::default_review_floor_secs")]
    pub review_floor_secs: u64,
}

impl PhaseDurations {
    const fn default_puzzle_secs() -> u64 {
        15 * 60
    }

    const fn default_play_secs() -> u64 {
        45 * 60
    }

    const fn default_review_secs() -> u64 {
        10 * 60
    }

    const fn default_review_floor_secs() -> u64 {
        60
    }

    #[must_use]
    pub const fn from_minutes(puzzle: u64, play: u64, review: u64) -> Self {
        Self {
            puzzle_secs: puzzle.saturating_mul(60),
            play_secs: play.saturating_mul(60),
            review_secs: review.saturating_mul(60),
            review_floor_secs: Self::default_review_floor_secs(),
        }
    }

    #[must_use]
    pub const fn puzzle(&self) -> Duration {
        Duration::from_secs(self.puzzle_secs)
    }

    #[must_use]
    pub const fn play(&self) -> Duration {
        Duration::from_secs(self.play_secs)
    }

    #[must_use]
    pub const fn review(&self) -> Duration {
        Duration::from_secs(self.review_secs)
    }

    #[must_use]
    pub const fn review_floor(&self) -> Duration {
        Duration::from_secs(self.review_floor_secs)
    }
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self::from_minutes(15, 45, 10)
    }
}

/// Polling cadence and fixed delays, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timings {
    pub puzzle_tick_ms: u64,
    pub play_tick_ms: u64,
    pub review_tick_ms: u64,
    /// Poll interval while waiting for a click on a terminal overlay.
    pub terminal_tick_ms: u64,
    /// Pause after a transition so the overlay can be read.
    pub settle_ms: u64,
    /// Throttle window for repeated navigation to the same address.
    pub navigation_window_ms: u64,
    pub dom_ready_timeout_ms: u64,
    pub dom_ready_poll_ms: u64,
    pub lookup_timeout_ms: u64,
    pub login_settle_ms: u64,
    pub login_tick_ms: u64,
}

impl Timings {
    #[must_use]
    pub const fn puzzle_tick(&self) -> Duration {
        Duration::from_millis(self.puzzle_tick_ms)
    }

    #[must_use]
    pub const fn play_tick(&self) -> Duration {
        Duration::from_millis(self.play_tick_ms)
    }

    #[must_use]
    pub const fn review_tick(&self) -> Duration {
        Duration::from_millis(self.review_tick_ms)
    }

    #[must_use]
    pub const fn terminal_tick(&self) -> Duration {
        Duration::from_millis(self.terminal_tick_ms)
    }

    #[must_use]
    pub const fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    #[must_use]
    pub const fn navigation_window(&self) -> Duration {
        Duration::from_millis(self.navigation_window_ms)
    }

    #[must_use]
    pub const fn dom_ready_timeout(&self) -> Duration {
        Duration::from_millis(self.dom_ready_timeout_ms)
    }

    #[must_use]
    pub const fn dom_ready_poll(&self) -> Duration {
        Duration::from_millis(self.dom_ready_poll_ms)
    }

    #[must_use]
    pub const fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }

    #[must_use]
    pub const fn login_settle(&self) -> Duration {
        Duration::from_millis(self.login_settle_ms)
    }

    #[must_use]
    pub const fn login_tick(&self) -> Duration {
        Duration::from_millis(self.login_tick_ms)
    }
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            puzzle_tick_ms: 5_000,
            play_tick_ms: 3_000,
            review_tick_ms: 5_000,
            terminal_tick_ms: 1_000,
            settle_ms: 2_000,
            navigation_window_ms: 2_000,
            dom_ready_timeout_ms: 8_000,
            dom_ready_poll_ms: 200,
            lookup_timeout_ms: 5_000,
            login_settle_ms: 1_000,
            login_tick_ms: 3_000,
        }
    }
}

/// Addresses of the puzzle site, the play server, and the review tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub puzzle_url: String,
    pub puzzle_login_url: String,
    pub play_url: String,
    pub play_login_url: String,
    /// Host the play phase is pinned to.
    pub play_domain: String,
    pub game_api_base: String,
    pub review_base: String,
}

impl SiteConfig {
    /// JSON record of a finished or running game.
    #[must_use]
    pub fn game_record_url(&self, game_id: &str) -> String {
        format!("{}/games/{game_id}", self.game_api_base.trim_end_matches('/'))
    }

    #[must_use]
    pub fn sgf_url(&self, game_id: &str) -> String {
        format!("{}/sgf", self.game_record_url(game_id))
    }

    /// Review tool address with the game's SGF record embedded as `?url=`.
    #[must_use]
    pub fn review_url(&self, game_id: &str) -> String {
        format!("{}?url={}", self.review_base, self.sgf_url(game_id))
    }

    /// Address fragment present only on a game page of the play server.
    #[must_use]
    pub fn game_page_marker(&self) -> String {
        format!("{}/game/", self.play_domain)
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            puzzle_url: "https://www.101weiqi.com/task/do/".to_string(),
            puzzle_login_url: "https://www.101weiqi.com/login".to_string(),
            play_url: "https://online-go.com/play".to_string(),
            play_login_url: "https://online-go.com/sign-in#/play".to_string(),
            play_domain: "online-go.com".to_string(),
            game_api_base: "https://online-go.com/api/v1".to_string(),
            review_base: "https://sir-teo.github.io/web-katrain/".to_string(),
        }
    }
}

/// A site that must be signed into before the routine starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountGate {
    pub check_url: String,
    pub login_url: String,
    /// Address fragment that means the site bounced us to its login page.
    pub login_fragment: String,
    pub subtitle: String,
}

impl AccountGate {
    #[must_use]
    pub fn defaults_for(sites: &SiteConfig) -> Vec<Self> {
        vec![
            Self {
                check_url: sites.puzzle_url.clone(),
                login_url: sites.puzzle_login_url.clone(),
                login_fragment: "/login".to_string(),
                subtitle: "Sign in to 101weiqi to continue".to_string(),
            },
            Self {
                check_url: sites.play_url.clone(),
                login_url: sites.play_login_url.clone(),
                login_fragment: "sign-in".to_string(),
                subtitle: "Sign in to OGS to continue".to_string(),
            },
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub phases: PhaseDurations,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub sites: SiteConfig,
    #[serde(default = "SessionConfig::default_accounts")]
    pub accounts: Vec<AccountGate>,
    #[serde(default = "SessionConfig::default_max_render_failures")]
    pub max_render_failures: u32,
}

impl SessionConfig {
    const fn default_max_render_failures() -> u32 {
        5
    }

    fn default_accounts() -> Vec<AccountGate> {
        AccountGate::defaults_for(&SiteConfig::default())
    }

    /// Check the invariants the phase controllers rely on.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_zero = [
            ("phases.puzzle_secs", self.phases.puzzle_secs),
            ("phases.play_secs", self.phases.play_secs),
            ("phases.review_secs", self.phases.review_secs),
            ("timings.puzzle_tick_ms", self.timings.puzzle_tick_ms),
            ("timings.play_tick_ms", self.timings.play_tick_ms),
            ("timings.review_tick_ms", self.timings.review_tick_ms),
            ("timings.terminal_tick_ms", self.timings.terminal_tick_ms),
            ("timings.dom_ready_poll_ms", self.timings.dom_ready_poll_ms),
            ("timings.login_tick_ms", self.timings.login_tick_ms),
            ("max_render_failures", u64::from(self.max_render_failures)),
        ];
        if let Some((field, _)) = non_zero.into_iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Zero { field });
        }
        if self.phases.review_floor_secs > self.phases.review_secs {
            return Err(ConfigError::ReviewFloorTooLong {
                floor: self.phases.review_floor_secs,
                review: self.phases.review_secs,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn without_accounts(mut self) -> Self {
        self.accounts.clear();
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            phases: PhaseDurations::default(),
            timings: Timings::default(),
            sites: SiteConfig::default(),
            accounts: Self::default_accounts(),
            max_render_failures: Self::default_max_render_failures(),
        }
    }
}
