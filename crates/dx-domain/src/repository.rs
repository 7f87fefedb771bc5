use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::errors::{DependencyError, Result};
use crate::links::{Link, VcsKind};

pub const DEFAULT_INDEX_NAME: &str = "pypi";
pub const DEFAULT_INDEX_URL: &str = "https://pypi.org/simple";

/// The source a package will be fetched from. Picking one never touches the network.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Repository {
    Index {
        name: String,
        url: String,
    },
    Vcs {
        vcs: VcsKind,
        url: String,
        revision: Option<String>,
    },
    Direct {
        url: String,
    },
    Local {
        path: PathBuf,
    },
}

impl Repository {
    #[must_use]
    pub fn default_index() -> Self {
        Self::Index {
            name: DEFAULT_INDEX_NAME.to_string(),
            url: DEFAULT_INDEX_URL.to_string(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Index { .. } => "index",
            Self::Vcs { .. } => "vcs",
            Self::Direct { .. } => "direct",
            Self::Local { .. } => "local",
        }
    }

    #[must_use]
    pub fn is_vcs(&self) -> bool {
        matches!(self, Self::Vcs { .. })
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index { name, url } => write!(f, "{name} ({url})"),
            Self::Vcs {
                vcs,
                url,
                revision: Some(revision),
            } => write!(f, "{vcs}+{url}@{revision}"),
            Self::Vcs { vcs, url, .. } => write!(f, "{vcs}+{url}"),
            Self::Direct { url } => f.write_str(url),
            Self::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Maps a link, or its absence, to the repository that serves it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLocator {
    default_index: Repository,
}

impl Default for RepositoryLocator {
    fn default() -> Self {
        Self {
            default_index: Repository::default_index(),
        }
    }
}

impl RepositoryLocator {
    /// A locator that sends link-less dependencies to the index at `url`.
    #[must_use]
    pub fn with_index(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            default_index: Repository::Index {
                name: name.into(),
                url: url.into(),
            },
        }
    }

    #[must_use]
    pub fn default_index(&self) -> &Repository {
        &self.default_index
    }

    /// Links are public values and may be built by hand, so their transport is
    /// checked again here rather than trusted.
    pub fn locate(&self, link: Option<&Link>) -> Result<Repository> {
        let repo = match link {
            None => self.default_index.clone(),
            Some(Link::Vcs(link)) => {
                let transport = link.url.split_once("://").map(|(scheme, _)| scheme);
                if !transport.is_some_and(|scheme| link.vcs.supports_transport(scheme)) {
                    return Err(DependencyError::unsupported_link(
                        link.raw.clone(),
                        format!("no {} repository serves `{}`", link.vcs, link.url),
                    ));
                }
                Repository::Vcs {
                    vcs: link.vcs,
                    url: link.url.clone(),
                    revision: link.revision.clone(),
                }
            }
            Some(Link::Direct(link)) => {
                let lowered = link.url.to_ascii_lowercase();
                if !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
                    return Err(DependencyError::unsupported_link(
                        link.url.clone(),
                        "direct links must use http or https",
                    ));
                }
                Repository::Direct {
                    url: link.url.clone(),
                }
            }
            Some(Link::Local(link)) => Repository::Local {
                path: link.path.clone(),
            },
        };
        debug!(kind = repo.kind(), repo = %repo, "located repository");
        Ok(repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::parse_link;

    fn locate(url: Option<&str>) -> Repository {
        let link = parse_link(url).unwrap();
        RepositoryLocator::default().locate(link.as_ref()).unwrap()
    }

    #[test]
    fn no_link_goes_to_the_index() {
        assert_eq!(locate(None), Repository::default_index());
        let custom = RepositoryLocator::with_index("internal", "https://pkgs.example.com/simple");
        assert_eq!(
            custom.locate(None).unwrap(),
            Repository::Index {
                name: "internal".into(),
                url: "https://pkgs.example.com/simple".into()
            }
        );
    }

    #[test]
    fn vcs_link_gets_a_distinct_repository() {
        let repo = locate(Some("git+https://github.com/org/tool.git@v1.2"));
        assert!(repo.is_vcs());
        assert_eq!(repo.to_string(), "git+https://github.com/org/tool.git@v1.2");
    }

    #[test]
    fn plain_and_local_links() {
        assert_eq!(
            locate(Some("https://example.com/pkg-1.0.tar.gz")).kind(),
            "direct"
        );
        assert_eq!(locate(Some("./pkgs/demo")).kind(), "local");
    }

    #[test]
    fn hand_built_links_with_bad_transports_are_rejected() {
        let link = Link::Direct(crate::links::DirectLink {
            url: "ftp://example.com/pkg.zip".into(),
            name: None,
        });
        let err = RepositoryLocator::default().locate(Some(&link)).unwrap_err();
        assert_eq!(err.code(), "DX102");

        let link = Link::Vcs(crate::links::VcsLink {
            vcs: VcsKind::Hg,
            url: "git://example.com/repo".into(),
            revision: None,
            name: None,
            subdirectory: None,
            raw: "hg+git://example.com/repo".into(),
        });
        let err = RepositoryLocator::default().locate(Some(&link)).unwrap_err();
        assert!(matches!(err, DependencyError::UnsupportedLink { ref url, .. } if url == "hg+git://example.com/repo"));
    }
}
