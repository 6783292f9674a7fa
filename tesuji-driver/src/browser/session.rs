use std::time::Duration;
use thirtyfour::prelude::*;

pub const DEFAULT_WEBDRIVER_URL: &str = "http://localhost:9515";

/// Where chromedriver listens and which Chrome it should take over.
#[derive(Debug, Clone)]
pub struct AttachConfig {
    pub webdriver_url: String,
    pub debug_port: u16,
}

impl Default for AttachConfig {
    fn default() -> Self {
        Self {
            webdriver_url: DEFAULT_WEBDRIVER_URL.to_string(),
            debug_port: 9222,
        }
    }
}

impl AttachConfig {
    #[must_use]
    pub fn debugger_address(&self) -> String {
        format!("127.0.0.1:{}", self.debug_port)
    }
}

/// Open a WebDriver session attached to the already running Chrome.
///
/// Implicit waits are disabled so presence probes answer immediately.
pub async fn attach(cfg: &AttachConfig) -> WebDriverResult<WebDriver> {
    let mut caps = DesiredCapabilities::chrome();
    caps.add_experimental_option("debuggerAddress", cfg.debugger_address())?;

    let driver = WebDriver::new(cfg.webdriver_url.as_str(), caps).await?;
    driver.set_implicit_wait_timeout(Duration::ZERO).await?;
    Ok(driver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debugger_address_uses_loopback() {
        let cfg = AttachConfig {
            debug_port: 9333,
            ..AttachConfig::default()
        };
        assert_eq!(cfg.debugger_address(), "127.0.0.1:9333");
        assert_eq!(cfg.webdriver_url, DEFAULT_WEBDRIVER_URL);
    }
}
