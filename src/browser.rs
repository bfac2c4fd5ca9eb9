//! Browser-session boundary: the injection hook and a best-effort opener.
//!
//! The spoof pipeline never talks to a browser directly; it hands one
//! script string to whatever implements [`PageHook`].

use async_trait::async_trait;
use std::fmt;

/// Error from the browser-automation layer.
#[derive(Debug)]
pub struct BrowserError(pub String);

impl fmt::Display for BrowserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for BrowserError {}

/// Script-delivery primitives of a browser session.
///
/// `add_init_script` must arrange for the script to run on every new
/// document, including frames, before that document's own scripts.
/// `evaluate` runs it once in the current document and exists only as a
/// degraded fallback.
#[async_trait]
pub trait PageHook: Send + Sync {
    async fn add_init_script(&self, script: &str) -> Result<(), BrowserError>;
    async fn evaluate(&self, script: &str) -> Result<(), BrowserError>;
}

/// Best-effort browser opener used to hand the verification URL to the
/// human during device login.
pub fn try_open_browser(url: &str) -> bool {
    #[cfg(target_os = "macos")]
    {
        // macOS standard browser launcher.
        return std::process::Command::new("open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }
    #[cfg(target_os = "windows")]
    {
        // Windows shell launcher.
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()
            .is_ok_and(|status| status.success());
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        // Linux/BSD desktop launcher.
        return std::process::Command::new("xdg-open")
            .arg(url)
            .status()
            .is_ok_and(|status| status.success());
    }
    #[allow(unreachable_code)]
    false
}
