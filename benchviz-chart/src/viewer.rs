//! Host Viewer
//!
//! Presents a written chart with the platform's file opener.

use crate::canvas::{RenderError, RenderedChart};
use std::ffi::OsString;
use std::process::{Command, Stdio};

/// Whether a display surface is reachable, judged from the environment
/// lookup `var` (normally [`std::env::var_os`]).
///
/// macOS always has one; other Unix hosts need an X11 or Wayland session.
pub fn display_available<F>(var: F) -> bool
where
    F: Fn(&str) -> Option<OsString>,
{
    if cfg!(target_os = "macos") {
        return true;
    }
    ["DISPLAY", "WAYLAND_DISPLAY"]
        .iter()
        .any(|name| var(*name).is_some_and(|v| !v.is_empty()))
}

fn viewer_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

impl RenderedChart {
    /// Open the chart in the host viewer and wait for the opener to return.
    pub fn open(&self) -> Result<(), RenderError> {
        self.open_with(|name| std::env::var_os(name))
    }

    /// [`open`](Self::open) with the display checked against `var` instead of
    /// the process environment.
    pub fn open_with<F>(&self, var: F) -> Result<(), RenderError>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        if !display_available(var) {
            return Err(RenderError::NoDisplay(self.path.clone()));
        }

        let viewer = viewer_command();
        tracing::debug!(viewer, path = %self.path.display(), "opening chart");
        let status = Command::new(viewer)
            .arg(&self.path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| RenderError::Viewer {
                viewer: viewer.to_string(),
                source,
            })?;

        if !status.success() {
            return Err(RenderError::ViewerExit {
                viewer: viewer.to_string(),
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_display_detection() {
        assert!(!display_available(|_| None));
        assert!(!display_available(|_| Some(OsString::new())));
        assert!(display_available(|name| {
            (name == "WAYLAND_DISPLAY").then(|| OsString::from("wayland-0"))
        }));
        assert!(display_available(|name| {
            (name == "DISPLAY").then(|| OsString::from(":0"))
        }));
    }

    #[test]
    #[cfg(all(unix, not(target_os = "macos")))]
    fn test_open_without_display() {
        let chart = RenderedChart {
            path: std::path::PathBuf::from("chart.svg"),
        };
        let err = chart.open_with(|_| None).unwrap_err();
        assert!(matches!(err, RenderError::NoDisplay(ref p) if p == &chart.path));
    }
}
