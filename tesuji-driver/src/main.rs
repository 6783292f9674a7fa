mod browser;
mod lookup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde::Serialize;
use tesuji_routine::{PhaseDurations, ScriptOverlay, SessionConfig, SessionSummary, TrainingSession};

use browser::launch::default_profile_dir;
use browser::{
    AttachConfig, ChromeOptions, DEFAULT_WEBDRIVER_URL, Launch, WebDriverSurface, attach,
    launch_chrome,
};
use lookup::HttpGameLookup;

#[derive(Debug, Parser)]
#[command(name = "tesuji", version)]
#[command(about = "Timed Go training routine: puzzles, a live game, then an AI review")]
struct Args {
    /// Chrome remote debugging port
    #[arg(long, env = "TESUJI_DEBUG_PORT", default_value_t = 9222)]
    debug_port: u16,

    /// Chrome profile directory (keeps site logins between runs)
    #[arg(long, env = "TESUJI_PROFILE_DIR")]
    profile_dir: Option<PathBuf>,

    /// Chrome executable, tried before the usual install locations
    #[arg(long, env = "CHROME_PATH")]
    chrome_path: Option<PathBuf>,

    /// chromedriver endpoint
    #[arg(long, env = "TESUJI_WEBDRIVER_URL", default_value = DEFAULT_WEBDRIVER_URL)]
    webdriver_url: String,

    /// Length of the puzzle block
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..=1440))]
    puzzle_minutes: u64,

    /// Length of the play block
    #[arg(long, default_value_t = 45, value_parser = clap::value_parser!(u64).range(1..=1440))]
    play_minutes: u64,

    /// Longest review block
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..=1440))]
    review_minutes: u64,

    /// Do not check that the puzzle and play sites are signed in
    #[arg(long)]
    skip_account_check: bool,

    /// Attach to an already running Chrome instead of starting one
    #[arg(long)]
    no_launch: bool,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// Everything the run would use, as printed by `--print-config`.
#[derive(Debug, Serialize)]
struct ResolvedConfig<'a> {
    debug_port: u16,
    profile_dir: PathBuf,
    chrome_path: Option<&'a PathBuf>,
    webdriver_url: &'a str,
    launch: bool,
    session: &'a SessionConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args);
    config.validate().context("invalid session configuration")?;

    if args.print_config {
        let resolved = ResolvedConfig {
            debug_port: args.debug_port,
            profile_dir: chrome_options(&args).profile_dir,
            chrome_path: args.chrome_path.as_ref(),
            webdriver_url: &args.webdriver_url,
            launch: !args.no_launch,
            session: &config,
        };
        println!("{}", serde_json::to_string_pretty(&resolved)?);
        return Ok(());
    }

    announce_banner(&config.phases);

    if !args.no_launch {
        let launch = launch_chrome(&chrome_options(&args), &config.sites.puzzle_url)
            .await
            .context("launching Chrome")?;
        match launch {
            Launch::Reused => println!("🔁 Reusing browser on port {}", args.debug_port),
            Launch::Spawned => println!("🚀 Started browser on port {}", args.debug_port),
        }
    }

    let driver = attach(&AttachConfig {
        webdriver_url: args.webdriver_url.clone(),
        debug_port: args.debug_port,
    })
    .await
    .with_context(|| format!("attaching through chromedriver at {}", args.webdriver_url))?;

    let surface = WebDriverSurface::new(&driver);
    let mut presenter = ScriptOverlay::new(
        &surface,
        config.timings.dom_ready_timeout(),
        config.timings.dom_ready_poll(),
    );
    let lookup = HttpGameLookup::new(config.sites.clone(), config.timings.lookup_timeout())
        .context("building HTTP client")?;

    let summary = TrainingSession::new(&surface, &mut presenter, &lookup, config)?
        .run()
        .await
        .context("training session ended")?;
    announce_summary(&summary);

    // The browser stays open for the user.
    Ok(())
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn build_config(args: &Args) -> SessionConfig {
    let config = SessionConfig {
        phases: PhaseDurations::from_minutes(
            args.puzzle_minutes,
            args.play_minutes,
            args.review_minutes,
        ),
        ..SessionConfig::default()
    };
    if args.skip_account_check {
        config.without_accounts()
    } else {
        config
    }
}

fn chrome_options(args: &Args) -> ChromeOptions {
    ChromeOptions {
        debug_port: args.debug_port,
        profile_dir: args.profile_dir.clone().unwrap_or_else(default_profile_dir),
        chrome_path: args.chrome_path.clone(),
    }
}

fn announce_banner(phases: &PhaseDurations) {
    println!("{}", "🪨 Tesuji Training Routine".bright_cyan().bold());
    println!("{}", "================================".cyan());
    println!(
        "Puzzles {} min · Play {} min · Review up to {} min",
        phases.puzzle_secs / 60,
        phases.play_secs / 60,
        phases.review_secs / 60
    );
}

fn announce_summary(summary: &SessionSummary) {
    println!(
        "{} {} rounds, {} reviews ({} skipped)",
        "✅ Session finished:".green().bold(),
        summary.cycles,
        summary.reviews,
        summary.skipped_reviews
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use browser::launch::is_port_open;

    fn base_args() -> Args {
        Args {
            debug_port: 9222,
            profile_dir: None,
            chrome_path: None,
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            puzzle_minutes: 15,
            play_minutes: 45,
            review_minutes: 10,
            skip_account_check: false,
            no_launch: false,
            print_config: false,
            verbose: false,
        }
    }

    #[test]
    fn minutes_become_phase_lengths() {
        let mut args = base_args();
        args.play_minutes = 30;
        let config = build_config(&args);
        assert_eq!(config.phases.puzzle_secs, 900);
        assert_eq!(config.phases.play_secs, 1800);
        assert_eq!(config.phases.review_secs, 600);
        assert_eq!(config.accounts.len(), 2);
        config.validate().expect("valid");
    }

    #[test]
    fn skipping_account_check_drops_the_gates() {
        let mut args = base_args();
        args.skip_account_check = true;
        assert!(build_config(&args).accounts.is_empty());
    }

    #[test]
    fn zero_minutes_fail_validation() {
        let mut args = base_args();
        args.review_minutes = 0;
        assert!(build_config(&args).validate().is_err());
    }

    #[test]
    fn chrome_options_default_the_profile_dir() {
        let options = chrome_options(&base_args());
        assert_eq!(options.profile_dir, default_profile_dir());
        assert_eq!(options.debug_port, 9222);

        let mut args = base_args();
        args.profile_dir = Some(PathBuf::from("/tmp/go-profile"));
        assert_eq!(chrome_options(&args).profile_dir, PathBuf::from("/tmp/go-profile"));
    }

    #[test]
    fn parses_flags() {
        let args = Args::try_parse_from([
            "tesuji",
            "--debug-port",
            "9333",
            "--play-minutes",
            "20",
            "--no-launch",
            "-v",
        ])
        .expect("parse");
        assert_eq!(args.debug_port, 9333);
        assert_eq!(args.play_minutes, 20);
        assert!(args.no_launch && args.verbose);
    }

    #[test]
    fn minute_flags_are_bounded() {
        for minutes in ["0", "1441", "18446744073709551615"] {
            let err = Args::try_parse_from(["tesuji", "--review-minutes", minutes])
                .expect_err("out of range");
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
        let args = Args::try_parse_from(["tesuji", "--puzzle-minutes", "1440"]).expect("parse");
        assert_eq!(build_config(&args).phases.puzzle_secs, 86_400);
    }

    #[test]
    fn closed_port_is_detected() {
        let port = tokio_test::block_on(async {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
            listener.local_addr().expect("addr").port()
        });
        assert!(!tokio_test::block_on(is_port_open(port)));
    }
}
