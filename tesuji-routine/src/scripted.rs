//! Scripted stand-ins for the browsing surface, the overlay, and the game
//! lookup.
//!
//! Signals change on tokio's clock, so under a paused runtime
//! (`#[tokio::test(start_paused = true)]`) whole phases replay in virtual
//! time.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use crate::error::SurfaceError;
use crate::lookup::{GameLookup, GameMetadata};
use crate::overlay::{ADVANCE_FLAG_SCRIPT, EXIT_FLAG_SCRIPT, OVERLAY_ELEMENT_ID, OverlayState, Presenter};
use crate::probes::READY_SCRIPT;
use crate::surface::{Locator, Surface};

/// A change applied to a [`ScriptedSurface`] once its time comes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Url(String),
    Show(Locator),
    Hide(Locator),
    ClickAdvance,
    ClickExit,
}

#[derive(Debug)]
struct Scripted {
    started: Instant,
    url: String,
    present: HashSet<Locator>,
    timeline: Vec<(Duration, Step)>,
    absent_for: HashMap<Locator, u32>,
    polls: HashMap<Locator, u32>,
    navigations: Vec<String>,
    scripts: Vec<String>,
    overlay_renders: usize,
    advance_flag: bool,
    exit_flag: bool,
    failing_scripts: u32,
    lost_from: Option<Duration>,
    ready_from: Duration,
}

impl Scripted {
    fn advance_clock(&mut self) -> Result<Duration, SurfaceError> {
        let elapsed = self.started.elapsed();
        if self.lost_from.is_some_and(|at| elapsed >= at) {
            return Err(SurfaceError::Unavailable("scripted surface lost".to_string()));
        }
        let due = self.timeline.partition_point(|(at, _)| *at <= elapsed);
        for (_, step) in self.timeline.drain(..due).collect::<Vec<_>>() {
            self.apply(step);
        }
        Ok(elapsed)
    }

    fn apply(&mut self, step: Step) {
        match step {
            Step::Url(url) => self.url = url,
            Step::Show(locator) => {
                self.present.insert(locator);
            }
            Step::Hide(locator) => {
                self.present.remove(&locator);
            }
            Step::ClickAdvance => self.advance_flag = true,
            Step::ClickExit => self.exit_flag = true,
        }
    }
}

/// A browsing surface driven by a timeline of [`Step`]s.
#[derive(Debug)]
pub struct ScriptedSurface {
    state: Mutex<Scripted>,
}

impl ScriptedSurface {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(Scripted {
                started: Instant::now(),
                url: url.into(),
                present: HashSet::new(),
                timeline: Vec::new(),
                absent_for: HashMap::new(),
                polls: HashMap::new(),
                navigations: Vec::new(),
                scripts: Vec::new(),
                overlay_renders: 0,
                advance_flag: false,
                exit_flag: false,
                failing_scripts: 0,
                lost_from: None,
                ready_from: Duration::ZERO,
            }),
        }
    }

    fn inner(&self) -> MutexGuard<'_, Scripted> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn inner_mut(&mut self) -> &mut Scripted {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `step` once `at` has elapsed since construction.
    #[must_use]
    pub fn at(mut self, at: Duration, step: Step) -> Self {
        let timeline = &mut self.inner_mut().timeline;
        let index = timeline.partition_point(|(t, _)| *t <= at);
        timeline.insert(index, (at, step));
        self
    }

    #[must_use]
    pub fn with_element(mut self, locator: Locator) -> Self {
        self.inner_mut().present.insert(locator);
        self
    }

    /// `locator` is reported absent for its first `polls` presence checks and
    /// present afterwards.
    #[must_use]
    pub fn present_after_polls(mut self, locator: Locator, polls: u32) -> Self {
        self.inner_mut().absent_for.insert(locator, polls);
        self
    }

    /// The next `count` scripts are rejected by the page.
    #[must_use]
    pub fn failing_scripts(mut self, count: u32) -> Self {
        self.inner_mut().failing_scripts = count;
        self
    }

    /// Every call fails as unavailable once `at` has elapsed.
    #[must_use]
    pub fn lost_from(mut self, at: Duration) -> Self {
        self.inner_mut().lost_from = Some(at);
        self
    }

    /// The readiness script answers `false` until `at`.
    #[must_use]
    pub fn not_ready_until(mut self, at: Duration) -> Self {
        self.inner_mut().ready_from = at;
        self
    }

    #[must_use]
    pub fn navigations(&self) -> Vec<String> {
        self.inner().navigations.clone()
    }

    #[must_use]
    pub fn executed_scripts(&self) -> Vec<String> {
        self.inner().scripts.clone()
    }

    #[must_use]
    pub fn overlay_renders(&self) -> usize {
        self.inner().overlay_renders
    }

    #[must_use]
    pub fn poll_count(&self, locator: &Locator) -> u32 {
        self.inner().polls.get(locator).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn url(&self) -> String {
        self.inner().url.clone()
    }
}

#[async_trait]
impl Surface for ScriptedSurface {
    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        let mut state = self.inner();
        state.advance_clock()?;
        state.navigations.push(url.to_string());
        state.url = url.to_string();
        Ok(())
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        let mut state = self.inner();
        state.advance_clock()?;
        Ok(state.url.clone())
    }

    async fn execute(&self, script: &str) -> Result<Value, SurfaceError> {
        let mut state = self.inner();
        let elapsed = state.advance_clock()?;
        state.scripts.push(script.to_string());
        if state.failing_scripts > 0 {
            state.failing_scripts -= 1;
            return Err(SurfaceError::ScriptRejected("scripted rejection".to_string()));
        }
        let reply = match script {
            READY_SCRIPT => Value::Bool(elapsed >= state.ready_from),
            ADVANCE_FLAG_SCRIPT => Value::Bool(state.advance_flag),
            EXIT_FLAG_SCRIPT => Value::Bool(state.exit_flag),
            other if other.contains(OVERLAY_ELEMENT_ID) => {
                state.overlay_renders += 1;
                state.advance_flag = false;
                state.exit_flag = false;
                Value::Null
            }
            _ => Value::Null,
        };
        Ok(reply)
    }

    async fn element_present(&self, locator: &Locator) -> Result<bool, SurfaceError> {
        let mut state = self.inner();
        state.advance_clock()?;
        let polls = {
            let count = state.polls.entry(locator.clone()).or_insert(0);
            *count += 1;
            *count
        };
        if let Some(absent_for) = state.absent_for.get(locator) {
            return Ok(polls > *absent_for);
        }
        Ok(state.present.contains(locator))
    }
}

/// A [`Presenter`] that records every overlay and answers polls from
/// scheduled clicks.
///
/// A click only counts against the latest overlay, if that overlay shows the
/// matching button and the click came after it was rendered.
#[derive(Debug)]
pub struct RecordingPresenter {
    started: Instant,
    renders: Vec<(Duration, OverlayState)>,
    advance_clicks: Vec<Duration>,
    exit_clicks: Vec<Duration>,
    failing_renders: u32,
    failed_renders: u32,
}

impl Default for RecordingPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingPresenter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            renders: Vec::new(),
            advance_clicks: Vec::new(),
            exit_clicks: Vec::new(),
            failing_renders: 0,
            failed_renders: 0,
        }
    }

    #[must_use]
    pub fn click_advance_at(mut self, at: Duration) -> Self {
        self.advance_clicks.push(at);
        self
    }

    #[must_use]
    pub fn click_exit_at(mut self, at: Duration) -> Self {
        self.exit_clicks.push(at);
        self
    }

    /// The next `count` renders fail.
    #[must_use]
    pub const fn failing_renders(mut self, count: u32) -> Self {
        self.failing_renders = count;
        self
    }

    #[must_use]
    pub fn renders(&self) -> &[(Duration, OverlayState)] {
        &self.renders
    }

    #[must_use]
    pub fn titles(&self) -> Vec<&str> {
        self.renders.iter().map(|(_, s)| s.title.as_str()).collect()
    }

    #[must_use]
    pub fn count_titled(&self, title: &str) -> usize {
        self.renders.iter().filter(|(_, s)| s.title == title).count()
    }

    #[must_use]
    pub fn last(&self) -> Option<&OverlayState> {
        self.renders.last().map(|(_, s)| s)
    }

    #[must_use]
    pub const fn failed_renders(&self) -> u32 {
        self.failed_renders
    }

    fn clicked(&self, clicks: &[Duration], shows_button: impl Fn(&OverlayState) -> bool) -> bool {
        let now = self.started.elapsed();
        let Some((rendered_at, state)) = self.renders.last() else {
            return false;
        };
        shows_button(state) && clicks.iter().any(|at| at >= rendered_at && *at <= now)
    }
}

#[async_trait]
impl Presenter for RecordingPresenter {
    async fn render(&mut self, state: &OverlayState) -> bool {
        if self.failing_renders > 0 {
            self.failing_renders -= 1;
            self.failed_renders += 1;
            return false;
        }
        self.renders.push((self.started.elapsed(), state.clone()));
        true
    }

    async fn poll_advance(&mut self) -> Result<bool, SurfaceError> {
        Ok(self.clicked(&self.advance_clicks, |s| s.show_advance_button))
    }

    async fn poll_exit(&mut self) -> Result<bool, SurfaceError> {
        Ok(self.clicked(&self.exit_clicks, |s| s.show_exit_button))
    }
}

/// A [`GameLookup`] serving fixed records and remembering what was asked.
#[derive(Debug, Default)]
pub struct CannedLookup {
    records: HashMap<String, GameMetadata>,
    calls: Mutex<Vec<String>>,
}

impl CannedLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, game_id: impl Into<String>, metadata: GameMetadata) -> Self {
        self.records.insert(game_id.into(), metadata);
        self
    }

    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl GameLookup for CannedLookup {
    async fn fetch(&self, game_id: &str) -> Option<GameMetadata> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(game_id.to_string());
        self.records.get(game_id).cloned()
    }
}
