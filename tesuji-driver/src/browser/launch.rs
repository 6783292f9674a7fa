//! Finding, starting and reusing a Chrome instance with remote debugging.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::sleep;

const PORT_POLL_ATTEMPTS: u32 = 40;
const PORT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const PORT_SETTLE: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error(
        "Chrome not found. Install Google Chrome or Chromium, or set CHROME_PATH to the executable path"
    )]
    ChromeNotFound,
    #[error("could not create profile directory {path}: {source}")]
    Profile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not start {path}: {source}")]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Chrome did not open debug port {port}")]
    PortNeverOpened { port: u16 },
}

/// How Chrome should be started.
#[derive(Debug, Clone)]
pub struct ChromeOptions {
    pub debug_port: u16,
    pub profile_dir: PathBuf,
    /// Explicit executable, tried before the platform defaults.
    pub chrome_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Launch {
    /// Something was already listening on the debug port.
    Reused,
    Spawned,
}

/// Default profile location, kept apart from the user's everyday profile.
#[must_use]
pub fn default_profile_dir() -> PathBuf {
    if cfg!(windows) {
        return PathBuf::from(r"C:\ChromeSeleniumProfile");
    }
    std::env::var_os("HOME")
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(".config/chrome-selenium-profile")
}

fn candidate_paths() -> Vec<PathBuf> {
    if cfg!(target_os = "macos") {
        vec![PathBuf::from(
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        )]
    } else if cfg!(windows) {
        let mut paths = vec![
            PathBuf::from(r"C:\Program Files\Google\Chrome\Application\chrome.exe"),
            PathBuf::from(r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe"),
        ];
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            paths.push(PathBuf::from(local).join(r"Google\Chrome\Application\chrome.exe"));
        }
        paths
    } else {
        [
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ]
        .into_iter()
        .map(PathBuf::from)
        .collect()
    }
}

/// First existing executable among `explicit` and the platform defaults.
///
/// # Errors
///
/// Returns [`LaunchError::ChromeNotFound`] when none exists.
pub fn find_chrome(explicit: Option<&Path>) -> Result<PathBuf, LaunchError> {
    explicit
        .map(Path::to_path_buf)
        .into_iter()
        .chain(candidate_paths())
        .find(|path| path.exists())
        .ok_or(LaunchError::ChromeNotFound)
}

pub async fn is_port_open(port: u16) -> bool {
    TcpStream::connect(("127.0.0.1", port)).await.is_ok()
}

fn chrome_args(options: &ChromeOptions, first_url: &str) -> Vec<String> {
    vec![
        first_url.to_string(),
        format!("--remote-debugging-port={}", options.debug_port),
        format!("--user-data-dir={}", options.profile_dir.display()),
        "--kiosk".to_string(),
        "--disable-notifications".to_string(),
        "--no-first-run".to_string(),
        "--disable-infobars".to_string(),
    ]
}

/// Start Chrome on `first_url` unless one is already serving the debug port.
///
/// # Errors
///
/// Fails if Chrome cannot be found or started, or never opens the port.
pub async fn launch_chrome(options: &ChromeOptions, first_url: &str) -> Result<Launch, LaunchError> {
    if is_port_open(options.debug_port).await {
        log::info!("reusing browser on debug port {}", options.debug_port);
        return Ok(Launch::Reused);
    }

    let chrome = find_chrome(options.chrome_path.as_deref())?;
    std::fs::create_dir_all(&options.profile_dir).map_err(|source| LaunchError::Profile {
        path: options.profile_dir.clone(),
        source,
    })?;

    log::info!("starting {}", chrome.display());
    Command::new(&chrome)
        .args(chrome_args(options, first_url))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| LaunchError::Spawn {
            path: chrome.clone(),
            source,
        })?;

    for _ in 0..PORT_POLL_ATTEMPTS {
        if is_port_open(options.debug_port).await {
            sleep(PORT_SETTLE).await;
            return Ok(Launch::Spawned);
        }
        sleep(PORT_POLL_INTERVAL).await;
    }
    Err(LaunchError::PortNeverOpened {
        port: options.debug_port,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    fn options(port: u16) -> ChromeOptions {
        ChromeOptions {
            debug_port: port,
            profile_dir: PathBuf::from("/tmp/tesuji-profile"),
            chrome_path: None,
        }
    }

    #[test]
    fn explicit_path_wins_when_it_exists() {
        let exe = std::env::current_exe().expect("test binary path");
        assert_eq!(find_chrome(Some(&exe)).expect("found"), exe);
    }

    #[test]
    fn missing_explicit_path_falls_through() {
        let bogus = Path::new("/definitely/not/chrome");
        match find_chrome(Some(bogus)) {
            Ok(path) => assert_ne!(path, bogus),
            Err(err) => assert!(matches!(err, LaunchError::ChromeNotFound)),
        }
    }

    #[test]
    fn launch_flags_carry_port_and_profile() {
        let args = chrome_args(&options(9333), "https://www.101weiqi.com/task/do/");
        assert_eq!(args[0], "https://www.101weiqi.com/task/do/");
        assert!(args.contains(&"--remote-debugging-port=9333".to_string()));
        assert!(args.contains(&"--user-data-dir=/tmp/tesuji-profile".to_string()));
        assert!(args.contains(&"--kiosk".to_string()));
    }

    #[tokio::test]
    async fn open_port_is_reused_without_spawning() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        assert!(is_port_open(port).await);

        let mut opts = options(port);
        opts.chrome_path = Some(PathBuf::from("/definitely/not/chrome"));
        let launch = launch_chrome(&opts, "about:blank").await.expect("reused");
        assert_eq!(launch, Launch::Reused);
    }
}
