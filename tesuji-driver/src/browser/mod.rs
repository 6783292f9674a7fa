pub mod launch;
mod session;
mod surface;

pub use launch::{ChromeOptions, Launch, launch_chrome};
pub use session::{AttachConfig, DEFAULT_WEBDRIVER_URL, attach};
pub use surface::WebDriverSurface;
