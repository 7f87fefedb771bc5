use serde_json::{json, Value};

/// Failures while turning a requirement into dependency records.
///
/// Every variant keeps the offending input verbatim so callers can point at the
/// exact manifest or lockfile line.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("failed to parse requirement `{input}`: {message}")]
    Parse { input: String, message: String },
    #[error("unsupported link `{url}`: {reason}")]
    UnsupportedLink { url: String, reason: String },
    #[error("invalid environment marker `{marker}`: {message}")]
    MarkerSyntax { marker: String, message: String },
}

impl DependencyError {
    pub(crate) fn parse(input: impl Into<String>, message: impl ToString) -> Self {
        Self::Parse {
            input: input.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn unsupported_link(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UnsupportedLink {
            url: url.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn marker_syntax(marker: impl Into<String>, message: impl ToString) -> Self {
        Self::MarkerSyntax {
            marker: marker.into(),
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "DX101",
            Self::UnsupportedLink { .. } => "DX102",
            Self::MarkerSyntax { .. } => "DX103",
        }
    }

    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "invalid_requirement",
            Self::UnsupportedLink { .. } => "unsupported_link",
            Self::MarkerSyntax { .. } => "invalid_marker",
        }
    }

    #[must_use]
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Parse { .. } => {
                Some("Use PEP 508 syntax like 'name[extra]>=1.0 ; python_version >= \"3.8\"'.")
            }
            Self::UnsupportedLink { .. } => Some(
                "Use an http(s):// archive URL, a local path, or a VCS URL like 'git+https://host/org/repo@rev'.",
            ),
            Self::MarkerSyntax { .. } => {
                Some("Markers look like 'python_version >= \"3.8\" and sys_platform == \"linux\"'.")
            }
        }
    }

    /// The user-supplied text that failed.
    #[must_use]
    pub fn input(&self) -> &str {
        match self {
            Self::Parse { input, .. } => input,
            Self::UnsupportedLink { url, .. } => url,
            Self::MarkerSyntax { marker, .. } => marker,
        }
    }

    #[must_use]
    pub fn details(&self) -> Value {
        let mut details = json!({
            "code": self.code(),
            "reason": self.reason(),
            "input": self.input(),
        });
        if let Value::Object(map) = &mut details {
            if let Some(hint) = self.hint() {
                map.insert("hint".into(), json!(hint));
            }
        }
        details
    }
}

pub type Result<T, E = DependencyError> = std::result::Result<T, E>;
