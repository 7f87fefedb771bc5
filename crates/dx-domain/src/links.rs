//! Classification of requirement URLs into link variants.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::trace;
use url::Url;

use crate::errors::{DependencyError, Result};

/// Version control systems that may prefix a transport scheme (`git+https://…`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VcsKind {
    Git,
    Hg,
    Svn,
    Bzr,
}

impl VcsKind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix.to_ascii_lowercase().as_str() {
            "git" => Some(Self::Git),
            "hg" => Some(Self::Hg),
            "svn" => Some(Self::Svn),
            "bzr" => Some(Self::Bzr),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Git => "git",
            Self::Hg => "hg",
            Self::Svn => "svn",
            Self::Bzr => "bzr",
        }
    }

    pub(crate) fn supports_transport(self, transport: &str) -> bool {
        match self {
            Self::Git => matches!(transport, "http" | "https" | "ssh" | "git" | "file"),
            Self::Hg => matches!(transport, "http" | "https" | "ssh" | "file"),
            Self::Svn => matches!(transport, "http" | "https" | "ssh" | "svn" | "file"),
            Self::Bzr => matches!(transport, "http" | "https" | "ssh" | "ftp" | "sftp" | "lp" | "file"),
        }
    }
}

impl fmt::Display for VcsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a package is fetched from, independent of its version semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Link {
    Direct(DirectLink),
    Vcs(VcsLink),
    Local(LocalLink),
}

impl Link {
    /// Package name recoverable from the link itself, if any.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Direct(link) => link.name.as_deref(),
            Self::Vcs(link) => link.name.as_deref(),
            Self::Local(link) => link.name.as_deref(),
        }
    }

    #[must_use]
    pub fn as_vcs(&self) -> Option<&VcsLink> {
        match self {
            Self::Vcs(link) => Some(link),
            _ => None,
        }
    }

    /// The VCS revision this link pins, when it is a VCS link with a non-empty revision.
    #[must_use]
    pub fn pinned_revision(&self) -> Option<&str> {
        self.as_vcs()
            .and_then(|link| link.revision.as_deref())
            .filter(|rev| !rev.is_empty())
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(link) => f.write_str(&link.url),
            Self::Vcs(link) => f.write_str(&link.raw),
            Self::Local(link) => write!(f, "{}", link.path.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct DirectLink {
    pub url: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct VcsLink {
    pub vcs: VcsKind,
    /// Transport URL with the `vcs+` prefix, revision, query and fragment removed.
    pub url: String,
    pub revision: Option<String>,
    pub name: Option<String>,
    pub subdirectory: Option<String>,
    /// The link exactly as written.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LocalLink {
    pub path: PathBuf,
    pub name: Option<String>,
}

/// Classify an optional URL into a [`Link`].
///
/// Blank input means "no link". Unknown schemes fail with
/// [`DependencyError::UnsupportedLink`] instead of falling back to the index.
pub fn parse_link(url: Option<&str>) -> Result<Option<Link>> {
    let Some(raw) = url.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(None);
    };

    if looks_like_path(raw) {
        return Ok(Some(Link::Local(local_link(PathBuf::from(raw)))));
    }

    let Some((scheme, _)) = raw.split_once("://") else {
        return Err(DependencyError::unsupported_link(
            raw,
            "expected a URL with a scheme or a local path",
        ));
    };

    let link = if let Some((prefix, transport)) = scheme.split_once('+') {
        let Some(vcs) = VcsKind::from_prefix(prefix) else {
            return Err(DependencyError::unsupported_link(
                raw,
                format!("unknown version control system `{prefix}`"),
            ));
        };
        Link::Vcs(vcs_link(raw, vcs, transport, &raw[prefix.len() + 1..])?)
    } else {
        match scheme.to_ascii_lowercase().as_str() {
            "git" => Link::Vcs(vcs_link(raw, VcsKind::Git, "git", raw)?),
            "http" | "https" => Link::Direct(direct_link(raw)?),
            "file" => {
                let parsed = Url::parse(raw)
                    .map_err(|err| DependencyError::unsupported_link(raw, err.to_string()))?;
                let path = parsed.to_file_path().map_err(|()| {
                    DependencyError::unsupported_link(raw, "file URL does not name a local path")
                })?;
                Link::Local(local_link(path))
            }
            other => {
                return Err(DependencyError::unsupported_link(
                    raw,
                    format!("unsupported scheme `{other}`"),
                ))
            }
        }
    };
    trace!(url = raw, link = ?link, "classified link");
    Ok(Some(link))
}

fn looks_like_path(raw: &str) -> bool {
    raw == "."
        || raw.starts_with('/')
        || raw.starts_with("./")
        || raw.starts_with("../")
        || raw.starts_with("~/")
}

fn vcs_link(raw: &str, vcs: VcsKind, transport: &str, location: &str) -> Result<VcsLink> {
    let transport = transport.to_ascii_lowercase();
    if !vcs.supports_transport(&transport) {
        return Err(DependencyError::unsupported_link(
            raw,
            format!("unsupported {vcs} transport `{transport}`"),
        ));
    }
    let mut url =
        Url::parse(location).map_err(|err| DependencyError::unsupported_link(raw, err.to_string()))?;
    let fragment = FragmentInfo::parse(url.fragment());
    url.set_fragment(None);
    url.set_query(None);

    let mut revision = None;
    if let Some((prefix, suffix)) = url
        .path()
        .rsplit_once('@')
        .map(|(prefix, suffix)| (prefix.to_string(), suffix.to_string()))
    {
        url.set_path(&prefix);
        if !suffix.is_empty() {
            revision = Some(suffix);
        }
    }

    let name = fragment.egg.or_else(|| {
        url.path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .map(|segment| segment.trim_end_matches(".git").to_string())
            .filter(|segment| !segment.is_empty())
    });

    Ok(VcsLink {
        vcs,
        url: url.to_string(),
        revision,
        name,
        subdirectory: fragment.subdirectory,
        raw: raw.to_string(),
    })
}

fn direct_link(raw: &str) -> Result<DirectLink> {
    let url = Url::parse(raw).map_err(|err| DependencyError::unsupported_link(raw, err.to_string()))?;
    let fragment = FragmentInfo::parse(url.fragment());
    let name = fragment.egg.or_else(|| {
        url.path_segments()
            .and_then(|mut segments| segments.rfind(|segment| !segment.is_empty()))
            .and_then(name_from_filename)
    });
    Ok(DirectLink {
        url: raw.to_string(),
        name,
    })
}

fn local_link(path: PathBuf) -> LocalLink {
    let name = path.file_name().and_then(|file| file.to_str()).and_then(|file| {
        name_from_filename(file).or_else(|| is_project_dir(&path).then(|| file.to_string()))
    });
    LocalLink { path, name }
}

fn is_project_dir(path: &Path) -> bool {
    path.extension().is_none()
}

const SDIST_SUFFIXES: [&str; 5] = [".tar.gz", ".tar.bz2", ".tar.xz", ".tgz", ".zip"];

/// Distribution name encoded in a wheel or sdist filename.
fn name_from_filename(filename: &str) -> Option<String> {
    if let Some(stem) = filename.strip_suffix(".whl") {
        return stem
            .split('-')
            .next()
            .filter(|name| !name.is_empty())
            .map(ToString::to_string);
    }
    let stem = SDIST_SUFFIXES
        .iter()
        .find_map(|suffix| filename.strip_suffix(suffix))?;
    let (name, version) = stem.rsplit_once('-')?;
    if name.is_empty() || !version.starts_with(|ch: char| ch.is_ascii_digit()) {
        return None;
    }
    Some(name.to_string())
}

#[derive(Default)]
struct FragmentInfo {
    egg: Option<String>,
    subdirectory: Option<String>,
}

impl FragmentInfo {
    fn parse(fragment: Option<&str>) -> Self {
        let mut info = Self::default();
        for pair in fragment.unwrap_or_default().split('&') {
            match pair.split_once('=') {
                Some(("egg", value)) if !value.is_empty() => info.egg = Some(value.to_string()),
                Some(("subdirectory", value)) if !value.is_empty() => {
                    info.subdirectory = Some(value.to_string());
                }
                _ => {}
            }
        }
        info
    }
}
