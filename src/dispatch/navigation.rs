//! Navigation requests for app and URL launches.

use serde::{Deserialize, Serialize};

/// Something the platform (or a caller-supplied launcher) should open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationRequest {
    /// Explicit component of an application.
    Component { package: String, class: String },
    /// Default launch entry of a package, resolved by whoever performs the
    /// launch.
    LaunchPackage { package: String },
    /// View a URL in the default handler.
    ViewUrl { url: String },
}

/// How an open-app value addresses its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppTarget {
    /// Bare package; resolved through the platform's default launch lookup.
    Package(String),
    /// Explicit `package/class` component.
    Component { package: String, class: String },
}

impl AppTarget {
    /// Parse `package` or `package/component`.
    ///
    /// A component starting with `.` is relative to the package. Returns
    /// `None` for an empty value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match value.split_once('/') {
            None => Some(Self::Package(value.to_owned())),
            Some((package, component)) => {
                let class = if component.starts_with('.') {
                    format!("{package}{component}")
                } else {
                    component.to_owned()
                };
                Some(Self::Component {
                    package: package.to_owned(),
                    class,
                })
            }
        }
    }
}

/// Prepend `https://` when `value` carries no http(s) scheme.
///
/// Returns `None` for an empty value.
#[must_use]
pub fn normalize_url(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if value.starts_with("http://") || value.starts_with("https://") {
        Some(value.to_owned())
    } else {
        Some(format!("https://{value}"))
    }
}
