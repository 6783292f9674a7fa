use async_trait::async_trait;
use serde_json::Value;
use tesuji_routine::{Locator, Surface, SurfaceError};
use thirtyfour::prelude::*;

/// [`Surface`] over a live WebDriver session.
///
/// Script failures are reported as recoverable; failures of any other
/// command mean the session or the tab is gone.
#[derive(Debug, Clone)]
pub struct WebDriverSurface<'a> {
    driver: &'a WebDriver,
}

impl<'a> WebDriverSurface<'a> {
    pub const fn new(driver: &'a WebDriver) -> Self {
        Self { driver }
    }
}

fn unavailable(err: &WebDriverError) -> SurfaceError {
    SurfaceError::Unavailable(err.to_string())
}

fn by(locator: &Locator) -> By {
    match locator {
        Locator::Css(selector) => By::Css(selector.clone()),
        Locator::XPath(expression) => By::XPath(expression.clone()),
    }
}

#[async_trait]
impl Surface for WebDriverSurface<'_> {
    async fn navigate(&self, url: &str) -> Result<(), SurfaceError> {
        self.driver.goto(url).await.map_err(|e| unavailable(&e))
    }

    async fn current_url(&self) -> Result<String, SurfaceError> {
        self.driver
            .current_url()
            .await
            .map(|url| url.to_string())
            .map_err(|e| unavailable(&e))
    }

    async fn execute(&self, script: &str) -> Result<Value, SurfaceError> {
        let result = self
            .driver
            .execute(script, vec![])
            .await
            .map_err(|e| SurfaceError::ScriptRejected(e.to_string()))?;
        Ok(result.json().clone())
    }

    async fn element_present(&self, locator: &Locator) -> Result<bool, SurfaceError> {
        let found = self
            .driver
            .find_all(by(locator))
            .await
            .map_err(|e| unavailable(&e))?;
        Ok(!found.is_empty())
    }
}
