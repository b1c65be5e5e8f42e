//! Flake references - WHERE a flake dependency points.
//!
//! A reference is either a concrete location (a local path, a git or github
//! repository, a tarball url) or an indirect alias that must be resolved
//! through the registry chain before it can be fetched. Classification is
//! deliberately narrow: an alias is a single-segment token; anything with
//! internal structure is a location.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

static SCHEME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-z][a-z0-9+]*):(.+)$").unwrap());

static ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").unwrap());

static SEGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").unwrap());

static REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_./-]*$").unwrap());

static REV_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").unwrap());

/// Error parsing a textual flake reference.
///
/// Malformed references are always rejected, never guessed at.
#[derive(Debug, Error)]
pub enum RefParseError {
    #[error("invalid flake reference `{text}`: {reason}")]
    Invalid { text: String, reason: String },

    #[error("invalid flake alias `{alias}`: aliases are single-segment names")]
    InvalidAlias { alias: String },

    #[error("unsupported scheme `{scheme}` in flake reference `{text}`")]
    UnsupportedScheme { text: String, scheme: String },

    #[error("invalid url in flake reference `{text}`: {reason}")]
    InvalidUrl { text: String, reason: String },
}

/// A parsed flake reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlakeRef {
    /// A local filesystem location. Always concrete; never substituted
    /// through the registry.
    Path { path: PathBuf },

    /// A uri-like location, optionally decorated with a branch/tag and a
    /// fixed revision.
    Concrete(ConcreteRef),

    /// A bare alias, to be resolved through the registry chain. Optional
    /// `ref`/`rev` decorations are carried alongside and applied to the
    /// substituted target.
    Indirect {
        alias: String,
        reference: Option<String>,
        rev: Option<String>,
    },
}

/// A concrete, fetchable location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteRef {
    pub location: Location,
    /// Branch or tag to track.
    pub reference: Option<String>,
    /// Fixed commit hash.
    pub rev: Option<String>,
}

/// The kind of concrete location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    /// A github repository, fetched as a tarball via the github api.
    GitHub { owner: String, repo: String },
    /// A git repository at an explicit url.
    Git { url: Url },
    /// A plain tarball url. Carries no ref/rev; the content is the identity.
    Tarball { url: Url },
}

impl FlakeRef {
    /// Parse and classify a textual flake reference.
    ///
    /// `.` and anything containing a path separator is a path; a recognized
    /// `scheme:rest` form is a concrete location; a bare single-segment
    /// token is an alias.
    pub fn parse(text: &str) -> Result<Self, RefParseError> {
        if text == "." {
            return Ok(FlakeRef::Path {
                path: PathBuf::from("."),
            });
        }

        if let Some(caps) = SCHEME_RE.captures(text) {
            let scheme = caps.get(1).unwrap().as_str();
            let rest = caps.get(2).unwrap().as_str();
            return Self::parse_concrete(text, scheme, rest);
        }

        if text.contains('/') {
            return Ok(FlakeRef::Path {
                path: PathBuf::from(text),
            });
        }

        Self::parse_indirect(text)
    }

    /// Construct a validated bare alias reference.
    pub fn indirect(alias: &str) -> Result<Self, RefParseError> {
        if !ALIAS_RE.is_match(alias) {
            return Err(RefParseError::InvalidAlias {
                alias: alias.to_string(),
            });
        }
        Ok(FlakeRef::Indirect {
            alias: alias.to_string(),
            reference: None,
            rev: None,
        })
    }

    fn parse_concrete(text: &str, scheme: &str, rest: &str) -> Result<Self, RefParseError> {
        match scheme {
            "github" => Self::parse_github(text, rest),
            "git" | "git+https" | "git+http" | "git+ssh" | "git+file" => {
                let url_text = text.strip_prefix("git+").unwrap_or(text);
                Self::parse_git(text, url_text)
            }
            "tarball+https" | "tarball+http" => {
                let url_text = text.strip_prefix("tarball+").unwrap_or(text);
                Self::parse_tarball(text, url_text)
            }
            "https" | "http" => Self::parse_tarball(text, text),
            _ => Err(RefParseError::UnsupportedScheme {
                text: text.to_string(),
                scheme: scheme.to_string(),
            }),
        }
    }

    fn parse_github(text: &str, rest: &str) -> Result<Self, RefParseError> {
        let (base, query) = match rest.split_once('?') {
            Some((base, query)) => (base, Some(query)),
            None => (rest, None),
        };

        let segments: Vec<&str> = base.split('/').collect();
        if segments.len() < 2 || segments.len() > 3 {
            return Err(RefParseError::Invalid {
                text: text.to_string(),
                reason: "expected `github:<owner>/<repo>[/<ref-or-rev>]`".to_string(),
            });
        }

        let owner = segments[0];
        let repo = segments[1];
        if !SEGMENT_RE.is_match(owner) || !SEGMENT_RE.is_match(repo) {
            return Err(RefParseError::Invalid {
                text: text.to_string(),
                reason: "invalid owner or repository name".to_string(),
            });
        }

        // A third segment is a commit hash if it looks like one, else a
        // branch/tag name.
        let (mut reference, mut rev) = (None, None);
        if let Some(extra) = segments.get(2) {
            if REV_RE.is_match(extra) {
                rev = Some(extra.to_string());
            } else if REF_RE.is_match(extra) {
                reference = Some(extra.to_string());
            } else {
                return Err(RefParseError::Invalid {
                    text: text.to_string(),
                    reason: format!("`{extra}` is neither a valid ref nor a revision"),
                });
            }
        }

        if let Some(query) = query {
            let (query_ref, query_rev) = parse_decorations(text, query)?;
            if query_ref.is_some() && reference.is_some() || query_rev.is_some() && rev.is_some() {
                return Err(RefParseError::Invalid {
                    text: text.to_string(),
                    reason: "ref/rev given both as a path segment and a query parameter"
                        .to_string(),
                });
            }
            reference = reference.or(query_ref);
            rev = rev.or(query_rev);
        }

        Ok(FlakeRef::Concrete(ConcreteRef {
            location: Location::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
            },
            reference,
            rev,
        }))
    }

    fn parse_git(text: &str, url_text: &str) -> Result<Self, RefParseError> {
        let mut url = Url::parse(url_text).map_err(|e| RefParseError::InvalidUrl {
            text: text.to_string(),
            reason: e.to_string(),
        })?;

        let (reference, rev) = match url.query() {
            Some(query) => parse_decorations(text, &query.to_string())?,
            None => (None, None),
        };
        url.set_query(None);
        url.set_fragment(None);

        Ok(FlakeRef::Concrete(ConcreteRef {
            location: Location::Git { url },
            reference,
            rev,
        }))
    }

    fn parse_tarball(text: &str, url_text: &str) -> Result<Self, RefParseError> {
        let url = Url::parse(url_text).map_err(|e| RefParseError::InvalidUrl {
            text: text.to_string(),
            reason: e.to_string(),
        })?;

        let is_archive = [".tar.gz", ".tgz", ".tar"]
            .iter()
            .any(|ext| url.path().ends_with(ext));
        if !is_archive {
            return Err(RefParseError::Invalid {
                text: text.to_string(),
                reason: "expected a tarball url (.tar.gz, .tgz or .tar)".to_string(),
            });
        }

        Ok(FlakeRef::Concrete(ConcreteRef {
            location: Location::Tarball { url },
            reference: None,
            rev: None,
        }))
    }

    fn parse_indirect(text: &str) -> Result<Self, RefParseError> {
        let (alias, query) = match text.split_once('?') {
            Some((alias, query)) => (alias, Some(query)),
            None => (text, None),
        };

        if !ALIAS_RE.is_match(alias) {
            return Err(RefParseError::InvalidAlias {
                alias: alias.to_string(),
            });
        }

        let (reference, rev) = match query {
            Some(query) => parse_decorations(text, query)?,
            None => (None, None),
        };

        Ok(FlakeRef::Indirect {
            alias: alias.to_string(),
            reference,
            rev,
        })
    }

    /// Check if this is a path reference.
    pub fn is_path(&self) -> bool {
        matches!(self, FlakeRef::Path { .. })
    }

    /// Check if this is a concrete (non-path) location.
    pub fn is_concrete(&self) -> bool {
        matches!(self, FlakeRef::Concrete(_))
    }

    /// Check if this is an unresolved alias.
    pub fn is_indirect(&self) -> bool {
        matches!(self, FlakeRef::Indirect { .. })
    }

    /// Get the alias name, if this is an indirect reference.
    pub fn alias(&self) -> Option<&str> {
        match self {
            FlakeRef::Indirect { alias, .. } => Some(alias),
            _ => None,
        }
    }

    /// Get the tracked branch/tag, if any.
    pub fn reference(&self) -> Option<&str> {
        match self {
            FlakeRef::Concrete(c) => c.reference.as_deref(),
            FlakeRef::Indirect { reference, .. } => reference.as_deref(),
            FlakeRef::Path { .. } => None,
        }
    }

    /// Get the fixed revision, if any.
    pub fn rev(&self) -> Option<&str> {
        match self {
            FlakeRef::Concrete(c) => c.rev.as_deref(),
            FlakeRef::Indirect { rev, .. } => rev.as_deref(),
            FlakeRef::Path { .. } => None,
        }
    }

    /// Overlay `ref`/`rev` decorations carried by an alias onto this
    /// reference. Decorations never override a pin the target already
    /// fixes; paths carry no decorations at all.
    pub fn apply_decorations(self, reference: Option<&str>, rev: Option<&str>) -> Self {
        match self {
            FlakeRef::Path { .. } => self,
            FlakeRef::Concrete(mut c) => {
                if c.reference.is_none() {
                    c.reference = reference.map(str::to_string);
                }
                if c.rev.is_none() {
                    c.rev = rev.map(str::to_string);
                }
                FlakeRef::Concrete(c)
            }
            FlakeRef::Indirect {
                alias,
                reference: own_ref,
                rev: own_rev,
            } => FlakeRef::Indirect {
                alias,
                reference: own_ref.or_else(|| reference.map(str::to_string)),
                rev: own_rev.or_else(|| rev.map(str::to_string)),
            },
        }
    }

    /// Return a copy with the fixed revision replaced.
    pub fn with_rev(self, rev: impl Into<String>) -> Self {
        match self {
            FlakeRef::Concrete(mut c) => {
                c.rev = Some(rev.into());
                FlakeRef::Concrete(c)
            }
            other => other,
        }
    }
}

fn parse_decorations(
    text: &str,
    query: &str,
) -> Result<(Option<String>, Option<String>), RefParseError> {
    let mut reference = None;
    let mut rev = None;

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(RefParseError::Invalid {
                text: text.to_string(),
                reason: format!("malformed query parameter `{pair}`"),
            });
        };
        match key {
            "ref" => {
                if !REF_RE.is_match(value) {
                    return Err(RefParseError::Invalid {
                        text: text.to_string(),
                        reason: format!("invalid ref `{value}`"),
                    });
                }
                reference = Some(value.to_string());
            }
            "rev" => {
                if !REV_RE.is_match(value) {
                    return Err(RefParseError::Invalid {
                        text: text.to_string(),
                        reason: format!("invalid revision `{value}`: expected 40 hex digits"),
                    });
                }
                rev = Some(value.to_string());
            }
            _ => {
                return Err(RefParseError::Invalid {
                    text: text.to_string(),
                    reason: format!("unknown query parameter `{key}`"),
                });
            }
        }
    }

    Ok((reference, rev))
}

fn write_decorations(
    f: &mut fmt::Formatter<'_>,
    reference: Option<&str>,
    rev: Option<&str>,
) -> fmt::Result {
    match (reference, rev) {
        (Some(r), Some(v)) => write!(f, "?ref={r}&rev={v}"),
        (Some(r), None) => write!(f, "?ref={r}"),
        (None, Some(v)) => write!(f, "?rev={v}"),
        (None, None) => Ok(()),
    }
}

impl fmt::Display for FlakeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlakeRef::Path { path } => write!(f, "{}", path.display()),
            FlakeRef::Concrete(c) => c.fmt(f),
            FlakeRef::Indirect {
                alias,
                reference,
                rev,
            } => {
                write!(f, "{alias}")?;
                write_decorations(f, reference.as_deref(), rev.as_deref())
            }
        }
    }
}

impl fmt::Display for ConcreteRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Location::GitHub { owner, repo } => write!(f, "github:{owner}/{repo}")?,
            Location::Git { url } => {
                if url.scheme() == "git" {
                    write!(f, "{url}")?;
                } else {
                    write!(f, "git+{url}")?;
                }
            }
            Location::Tarball { url } => return write!(f, "{url}"),
        }
        write_decorations(f, self.reference.as_deref(), self.rev.as_deref())
    }
}

impl FromStr for FlakeRef {
    type Err = RefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FlakeRef::parse(s)
    }
}

impl Serialize for FlakeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FlakeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FlakeRef::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_is_path() {
        let r = FlakeRef::parse(".").unwrap();
        assert_eq!(
            r,
            FlakeRef::Path {
                path: PathBuf::from(".")
            }
        );
    }

    #[test]
    fn test_bare_token_is_indirect() {
        let r = FlakeRef::parse("nixpkgs").unwrap();
        assert_eq!(r.alias(), Some("nixpkgs"));
        assert!(r.is_indirect());
    }

    #[test]
    fn test_relative_dir_is_path() {
        let r = FlakeRef::parse("./local/dir").unwrap();
        assert_eq!(
            r,
            FlakeRef::Path {
                path: PathBuf::from("./local/dir")
            }
        );
    }

    #[test]
    fn test_absolute_dir_is_path() {
        assert!(FlakeRef::parse("/srv/flakes/app").unwrap().is_path());
    }

    #[test]
    fn test_github_basic() {
        let r = FlakeRef::parse("github:owner/repo").unwrap();
        match &r {
            FlakeRef::Concrete(c) => {
                assert_eq!(
                    c.location,
                    Location::GitHub {
                        owner: "owner".into(),
                        repo: "repo".into()
                    }
                );
                assert_eq!(c.reference, None);
                assert_eq!(c.rev, None);
            }
            other => panic!("expected concrete ref, got {other:?}"),
        }
    }

    #[test]
    fn test_github_with_ref_segment() {
        let r = FlakeRef::parse("github:NixOS/nixpkgs/release-19.03").unwrap();
        assert_eq!(r.reference(), Some("release-19.03"));
        assert_eq!(r.rev(), None);
    }

    #[test]
    fn test_github_with_rev_segment() {
        let rev = "a7e559a5504572008567383c3dc8e142fa7a8633";
        let r = FlakeRef::parse(&format!("github:NixOS/nixpkgs/{rev}")).unwrap();
        assert_eq!(r.rev(), Some(rev));
        assert_eq!(r.reference(), None);
    }

    #[test]
    fn test_github_rejects_duplicate_decorations() {
        let err = FlakeRef::parse("github:a/b/main?ref=other").unwrap_err();
        assert!(matches!(err, RefParseError::Invalid { .. }));
    }

    #[test]
    fn test_git_url_with_query() {
        let rev = "0123456789abcdef0123456789abcdef01234567";
        let text = format!("git+https://example.org/repo.git?ref=main&rev={rev}");
        let r = FlakeRef::parse(&text).unwrap();
        assert_eq!(r.reference(), Some("main"));
        assert_eq!(r.rev(), Some(rev));
        match r {
            FlakeRef::Concrete(ConcreteRef {
                location: Location::Git { url },
                ..
            }) => assert_eq!(url.as_str(), "https://example.org/repo.git"),
            other => panic!("expected git ref, got {other:?}"),
        }
    }

    #[test]
    fn test_tarball_url() {
        let r = FlakeRef::parse("https://example.org/src/app-1.2.tar.gz").unwrap();
        assert!(matches!(
            r,
            FlakeRef::Concrete(ConcreteRef {
                location: Location::Tarball { .. },
                ..
            })
        ));
    }

    #[test]
    fn test_https_without_archive_suffix_rejected() {
        let err = FlakeRef::parse("https://example.org/repo").unwrap_err();
        assert!(matches!(err, RefParseError::Invalid { .. }));
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let err = FlakeRef::parse("svn:something").unwrap_err();
        assert!(matches!(err, RefParseError::UnsupportedScheme { .. }));
    }

    #[test]
    fn test_invalid_alias_rejected() {
        assert!(matches!(
            FlakeRef::parse("foo.bar").unwrap_err(),
            RefParseError::InvalidAlias { .. }
        ));
        assert!(matches!(
            FlakeRef::parse("1stuff").unwrap_err(),
            RefParseError::InvalidAlias { .. }
        ));
    }

    #[test]
    fn test_indirect_with_decorations() {
        let rev = "0123456789abcdef0123456789abcdef01234567";
        let r = FlakeRef::parse(&format!("nixpkgs?ref=staging&rev={rev}")).unwrap();
        assert_eq!(r.alias(), Some("nixpkgs"));
        assert_eq!(r.reference(), Some("staging"));
        assert_eq!(r.rev(), Some(rev));
    }

    #[test]
    fn test_bad_rev_rejected() {
        let err = FlakeRef::parse("nixpkgs?rev=abc").unwrap_err();
        assert!(matches!(err, RefParseError::Invalid { .. }));
    }

    #[test]
    fn test_display_parse_roundtrip() {
        let rev = "0123456789abcdef0123456789abcdef01234567";
        let texts = [
            ".".to_string(),
            "./local/dir".to_string(),
            "nixpkgs".to_string(),
            format!("nixpkgs?ref=staging&rev={rev}"),
            "github:owner/repo".to_string(),
            "github:owner/repo?ref=main".to_string(),
            format!("github:owner/repo?ref=main&rev={rev}"),
            "git+https://example.org/repo.git?ref=main".to_string(),
            "https://example.org/app.tar.gz".to_string(),
        ];
        for text in texts {
            let parsed = FlakeRef::parse(&text).unwrap();
            assert_eq!(parsed.to_string(), text);
            assert_eq!(FlakeRef::parse(&parsed.to_string()).unwrap(), parsed);
        }
    }

    #[test]
    fn test_apply_decorations_does_not_override_pins() {
        let pinned = FlakeRef::parse("github:owner/repo?ref=release").unwrap();
        let decorated = pinned.apply_decorations(Some("main"), None);
        assert_eq!(decorated.reference(), Some("release"));

        let bare = FlakeRef::parse("github:owner/repo").unwrap();
        let decorated = bare.apply_decorations(Some("main"), None);
        assert_eq!(decorated.reference(), Some("main"));
    }

    #[test]
    fn test_serde_as_string() {
        let r = FlakeRef::parse("github:owner/repo?ref=main").unwrap();
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"github:owner/repo?ref=main\"");
        let back: FlakeRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
