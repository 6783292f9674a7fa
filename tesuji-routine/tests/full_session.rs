use std::time::Duration;

use chrono::{TimeZone, Utc};
use tesuji_routine::{
    GameMetadata, Locator, ScriptOverlay, SessionConfig, SessionError, SessionSummary, SurfaceError,
    TrainingSession,
    overlay::copy,
    probes::{ANALYZE_BUTTON, PUZZLE_COMPLETION_MARKERS},
    scripted::{CannedLookup, RecordingPresenter, ScriptedSurface, Step},
};

fn secs(s: u64) -> Duration {
    Duration::from_secs(s)
}

fn short_config() -> SessionConfig {
    let mut config = SessionConfig::default().without_accounts();
    config.phases.puzzle_secs = 10;
    config.phases.play_secs = 30;
    config.phases.review_secs = 120;
    config
}

fn resigned_after(seconds: i64) -> GameMetadata {
    let start = Utc.with_ymd_and_hms(2024, 5, 4, 19, 0, 0).unwrap();
    GameMetadata {
        start_time: Some(start),
        end_time: Some(start + chrono::Duration::seconds(seconds)),
        outcome: Some("Black resigned".to_string()),
    }
}

#[tokio::test(start_paused = true)]
async fn three_rounds_until_exit() {
    let analyze = Locator::xpath(ANALYZE_BUTTON);
    let surface = ScriptedSurface::new("about:blank")
        .with_element(Locator::xpath(PUZZLE_COMPLETION_MARKERS[2]))
        // Round one: a resignation ends play early.
        .at(secs(14), Step::Url("https://online-go.com/game/500".into()))
        .at(secs(20), Step::Show(analyze.clone()))
        .at(secs(30), Step::Hide(analyze.clone()))
        // Round three: a game with no record on the server.
        .at(secs(172), Step::Url("https://online-go.com/game/600".into()))
        .at(secs(180), Step::Show(analyze));
    let lookup = CannedLookup::new().with("500", resigned_after(90));
    let mut presenter = RecordingPresenter::new()
        .click_advance_at(secs(114))
        .click_advance_at(secs(157))
        .click_advance_at(secs(185))
        .click_exit_at(secs(307));

    let session = TrainingSession::new(&surface, &mut presenter, &lookup, short_config())
        .expect("valid config");
    let summary = session.run().await.expect("session ends on exit");

    assert_eq!(
        summary,
        SessionSummary {
            cycles: 3,
            reviews: 2,
            skipped_reviews: 1,
            puzzle_nag_ticks: 0,
        }
    );
    assert_eq!(lookup.calls(), vec!["500", "600"]);

    let reviews: Vec<_> = surface
        .navigations()
        .into_iter()
        .filter(|url| url.contains("web-katrain"))
        .collect();
    assert_eq!(
        reviews,
        vec![
            "https://sir-teo.github.io/web-katrain/?url=https://online-go.com/api/v1/games/500/sgf",
            "https://sir-teo.github.io/web-katrain/?url=https://online-go.com/api/v1/games/600/sgf",
        ]
    );

    // Ninety-second game, so a ninety-second review.
    let first_review: Vec<_> = presenter
        .renders()
        .iter()
        .filter(|(at, s)| s.title == copy::REVIEW_TITLE && *at < secs(114))
        .collect();
    assert_eq!(first_review.len(), 18);
    assert_eq!(first_review[0].1.countdown_seconds, Some(90));

    let first_extra = presenter
        .renders()
        .iter()
        .find(|(_, s)| s.time_suffix == copy::EXTRA_PRACTICE_SUFFIX)
        .map(|(at, _)| *at);
    assert_eq!(first_extra, Some(secs(126)));
    assert!(presenter.count_titled(copy::PLAY_COMPLETE_TITLE) >= 1);
    assert_eq!(presenter.count_titled(copy::GAME_FINISHED_AUTO_TITLE), 1);
}

#[tokio::test(start_paused = true)]
async fn lost_surface_ends_the_session() {
    let surface = ScriptedSurface::new("about:blank").lost_from(secs(7));
    let lookup = CannedLookup::new();
    let mut presenter = RecordingPresenter::new();

    let session = TrainingSession::new(&surface, &mut presenter, &lookup, short_config())
        .expect("valid config");
    let err = session.run().await.expect_err("surface is gone");

    assert!(matches!(
        err,
        SessionError::Surface(SurfaceError::Unavailable(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn overlay_that_never_renders_is_fatal() {
    let surface = ScriptedSurface::new("https://www.101weiqi.com/task/do/").failing_scripts(u32::MAX);
    let lookup = CannedLookup::new();
    let config = short_config();
    let mut presenter = ScriptOverlay::new(
        &surface,
        config.timings.dom_ready_timeout(),
        config.timings.dom_ready_poll(),
    );

    let session =
        TrainingSession::new(&surface, &mut presenter, &lookup, config).expect("valid config");
    let err = session.run().await.expect_err("overlay never shows");

    assert!(matches!(err, SessionError::SurfaceLost { failures: 5 }));
    assert!(lookup.calls().is_empty());
}
