//! Locating a local Chromium-based executable.

use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// Executable names looked up on `PATH`. All of them speak CDP.
const CHROMIUM_EXECUTABLES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chrome",
    "chromium",
    "chromium-browser",
    "msedge",
    "microsoft-edge",
    "brave-browser",
];

#[cfg(target_os = "macos")]
const PLATFORM_PATHS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "windows")]
const PLATFORM_PATHS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_PATHS: &[&str] = &[];

/// Find a browser to launch.
///
/// Order: the configured path, the `CHROME` environment variable, platform
/// install locations, then well-known names on `PATH`. A configured path
/// that does not exist is an error rather than a silent fallback.
pub fn locate_chrome(configured: Option<&Path>) -> Result<PathBuf, FetchError> {
    if let Some(path) = configured {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(FetchError::BrowserNotAvailable(format!(
            "configured chrome_path {} does not exist",
            path.display()
        )));
    }

    if let Ok(path) = std::env::var("CHROME") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(path) = PLATFORM_PATHS
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
    {
        return Ok(path);
    }

    CHROMIUM_EXECUTABLES
        .iter()
        .find_map(|name| which::which(name).ok())
        .ok_or_else(|| FetchError::BrowserNotAvailable(install_instructions()))
}

/// Platform-specific install guidance.
#[must_use]
pub fn install_instructions() -> String {
    let instructions = if cfg!(target_os = "macos") {
        "  brew install --cask google-chrome"
    } else if cfg!(target_os = "windows") {
        "  winget install Google.Chrome"
    } else if cfg!(target_os = "linux") {
        "  Debian/Ubuntu: sudo apt install chromium\n  \
         Fedora:        sudo dnf install chromium"
    } else {
        "  Download from https://www.google.com/chrome/"
    };

    format!(
        "no Chromium-based browser found. Install one:\n\n\
         {instructions}\n\n\
         Or point pagekeep at one:\n  \
         [browser]\n  \
         chrome_path = \"/path/to/chrome\"\n\n\
         Or set CHROME, or BROWSER_ENDPOINT to use a remote DevTools endpoint."
    )
}

/// Log whether a local browser is available. Returns `true` when found.
pub fn check_and_warn(configured: Option<&Path>) -> bool {
    match locate_chrome(configured) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "browser detected");
            true
        },
        Err(e) => {
            tracing::warn!(error = %e, "browser not available");
            false
        },
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_path_takes_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("fake-chrome");
        std::fs::write(&fake, "fake").unwrap();

        assert_eq!(locate_chrome(Some(&fake)).unwrap(), fake);
    }

    #[test]
    fn missing_configured_path_is_an_error() {
        let err = locate_chrome(Some(Path::new("/nonexistent/chrome"))).unwrap_err();
        assert!(matches!(err, FetchError::BrowserNotAvailable(ref m) if m.contains("chrome_path")));
    }

    #[test]
    fn install_hint_mentions_config() {
        let hint = install_instructions();
        assert!(hint.contains("[browser]"));
        assert!(hint.contains("BROWSER_ENDPOINT"));
    }
}
