use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SurfaceError;

/// How an element on the page is located.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    #[must_use]
    pub fn selector(&self) -> &str {
        match self {
            Self::Css(s) | Self::XPath(s) => s,
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css:{s}"),
            Self::XPath(s) => write!(f, "xpath:{s}"),
        }
    }
}

/// The remote-controlled browser tab the routine runs in.
///
/// Phase controllers only ever talk to the page through this trait, so any
/// browsing technology (or a scripted double) can stand behind it.
#[async_trait]
pub trait Surface: Send + Sync {
    /// Load `url` in the tab.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] if the tab cannot be reached.
    async fn navigate(&self, url: &str) -> Result<(), SurfaceError>;

    /// The tab's current address.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] if the tab cannot be reached.
    async fn current_url(&self) -> Result<String, SurfaceError>;

    /// Run `script` in the page and return whatever it returns.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::ScriptRejected`] if the page fails the script.
    async fn execute(&self, script: &str) -> Result<Value, SurfaceError>;

    /// Whether at least one element matches `locator` right now.
    ///
    /// # Errors
    ///
    /// Returns [`SurfaceError::Unavailable`] if the tab cannot be reached.
    async fn element_present(&self, locator: &Locator) -> Result<bool, SurfaceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_display_names_the_strategy() {
        assert_eq!(Locator::css("#goOverlay").to_string(), "css:#goOverlay");
        assert_eq!(Locator::xpath("//button").selector(), "//button");
    }
}
