//! Idempotent, rate-limited navigation of the browsing surface.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::Timings;
use crate::error::SurfaceError;
use crate::probes;
use crate::surface::Surface;

/// Owns the "last navigation" record so repeated polling cannot hammer the
/// surface with the same address.
#[derive(Debug, Clone)]
pub struct NavigationGuard {
    window: Duration,
    ready_timeout: Duration,
    ready_poll: Duration,
    last_url: Option<String>,
    last_nav: Option<Instant>,
    issued: u32,
}

impl NavigationGuard {
    #[must_use]
    pub const fn new(window: Duration, ready_timeout: Duration, ready_poll: Duration) -> Self {
        Self {
            window,
            ready_timeout,
            ready_poll,
            last_url: None,
            last_nav: None,
            issued: 0,
        }
    }

    #[must_use]
    pub const fn from_timings(timings: &Timings) -> Self {
        Self::new(
            timings.navigation_window(),
            timings.dom_ready_timeout(),
            timings.dom_ready_poll(),
        )
    }

    /// Number of navigations actually sent to the surface.
    #[must_use]
    pub const fn issued(&self) -> u32 {
        self.issued
    }

    #[must_use]
    pub fn last_url(&self) -> Option<&str> {
        self.last_url.as_deref()
    }

    /// Navigate to `url` unless the surface is already somewhere under it.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub async fn ensure(&mut self, surface: &dyn Surface, url: &str) -> Result<bool, SurfaceError> {
        self.safe_navigate(surface, url, self.window).await
    }

    /// Like [`ensure`](Self::ensure), but also skips the navigation when the
    /// same address was issued less than `min_interval` ago, even if the
    /// surface has drifted away since.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub async fn safe_navigate(
        &mut self,
        surface: &dyn Surface,
        url: &str,
        min_interval: Duration,
    ) -> Result<bool, SurfaceError> {
        let now = Instant::now();
        if surface.current_url().await?.starts_with(url) {
            return Ok(false);
        }
        let throttled = self.last_url.as_deref() == Some(url)
            && self
                .last_nav
                .is_some_and(|at| now.saturating_duration_since(at) < min_interval);
        if throttled {
            log::debug!("navigation to {url} throttled");
            return Ok(false);
        }
        self.navigate_now(surface, url).await?;
        Ok(true)
    }

    /// Navigate unconditionally, still recording the navigation.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub async fn navigate_now(&mut self, surface: &dyn Surface, url: &str) -> Result<(), SurfaceError> {
        log::debug!("navigating to {url}");
        surface.navigate(url).await?;
        self.last_url = Some(url.to_string());
        self.last_nav = Some(Instant::now());
        self.issued += 1;
        probes::wait_until_ready(surface, self.ready_timeout, self.ready_poll).await;
        Ok(())
    }

    /// Send the surface back to the root of `domain` if it has left it.
    ///
    /// # Errors
    ///
    /// Propagates surface failures.
    pub async fn enforce_domain(
        &mut self,
        surface: &dyn Surface,
        domain: &str,
    ) -> Result<bool, SurfaceError> {
        if surface.current_url().await?.contains(domain) {
            return Ok(false);
        }
        log::info!("surface left {domain}; steering back");
        self.ensure(surface, &format!("https://{domain}")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripted::{ScriptedSurface, Step};

    fn guard() -> NavigationGuard {
        NavigationGuard::new(
            Duration::from_secs(2),
            Duration::from_secs(8),
            Duration::from_millis(200),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ensure_is_idempotent_when_already_there() {
        let surface = ScriptedSurface::new("https://www.101weiqi.com/task/do/123");
        let mut nav = guard();
        for _ in 0..5 {
            let moved = nav
                .ensure(&surface, "https://www.101weiqi.com/task/do/")
                .await
                .unwrap();
            assert!(!moved);
        }
        assert_eq!(nav.issued(), 0);
        assert!(surface.navigations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_target_is_throttled_within_window() {
        let surface = ScriptedSurface::new("about:blank")
            .at(Duration::from_millis(500), Step::Url("https://elsewhere.test/".into()));
        let mut nav = guard();

        assert!(nav.ensure(&surface, "https://online-go.com/play").await.unwrap());
        tokio::time::sleep(Duration::from_millis(600)).await;
        // Surface drifted away, but the same target was issued 600ms ago.
        assert!(!nav.ensure(&surface, "https://online-go.com/play").await.unwrap());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(nav.ensure(&surface, "https://online-go.com/play").await.unwrap());
        assert_eq!(nav.issued(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn different_target_is_not_throttled() {
        let surface = ScriptedSurface::new("about:blank");
        let mut nav = guard();
        assert!(nav.ensure(&surface, "https://a.test/").await.unwrap());
        assert!(nav.ensure(&surface, "https://b.test/").await.unwrap());
        assert_eq!(surface.navigations(), vec!["https://a.test/", "https://b.test/"]);
        assert_eq!(nav.last_url(), Some("https://b.test/"));
    }

    #[tokio::test(start_paused = true)]
    async fn enforce_domain_only_moves_when_off_site() {
        let surface = ScriptedSurface::new("https://online-go.com/game/12");
        let mut nav = guard();
        assert!(!nav.enforce_domain(&surface, "online-go.com").await.unwrap());

        let surface = ScriptedSurface::new("https://news.test/");
        assert!(nav.enforce_domain(&surface, "online-go.com").await.unwrap());
        assert_eq!(surface.navigations(), vec!["https://online-go.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn lost_surface_propagates() {
        let surface = ScriptedSurface::new("about:blank").lost_from(Duration::ZERO);
        let mut nav = guard();
        let err = nav.ensure(&surface, "https://a.test/").await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
