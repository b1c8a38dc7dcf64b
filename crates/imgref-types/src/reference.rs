//! Image reference parsing and normalization.
//!
//! A reference names an artifact as `[domain/]path[:tag][@digest]`:
//!
//! - `ubuntu` normalizes to `docker.io/library/ubuntu`
//! - `ghcr.io/acme/app:1.2` keeps its registry domain
//! - `ubuntu@sha256:<hex>` is digest-qualified and names one artifact forever
//!
//! Every reference has two renderings. The full form (`Display`) always
//! spells out the domain. The familiar form drops the default domain and
//! the `library/` prefix of official images, which is what users type.
//!
//! Path rules:
//! - Components are lowercase alphanumerics, joined by `.`, `_`, `__` or
//!   runs of `-`
//! - The full name (domain and path) is at most 255 characters
//! - A bare 64-character hex string is never a repository name

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::Digest;
use crate::error::TypeError;

/// Registry domain implied when a reference names none.
pub const DEFAULT_DOMAIN: &str = "docker.io";

/// Tag applied to a reference that carries neither a tag nor a digest.
pub const DEFAULT_TAG: &str = "latest";

/// Maximum length of the full repository name, domain included.
pub const NAME_TOTAL_LENGTH_MAX: usize = 255;

const LEGACY_DEFAULT_DOMAIN: &str = "index.docker.io";
const OFFICIAL_REPO_PREFIX: &str = "library/";
const TAG_LENGTH_MAX: usize = 128;

/// A parsed, normalized image reference.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Reference {
    domain: String,
    path: String,
    tag: Option<String>,
    digest: Option<Digest>,
}

impl Reference {
    /// Parse a reference as a user would type it, filling in the default
    /// domain and the `library/` prefix where implied.
    ///
    /// # Examples
    ///
    /// ```
    /// use imgref_types::Reference;
    ///
    /// let r = Reference::parse_normalized("ubuntu:22.04").unwrap();
    /// assert_eq!(r.to_string(), "docker.io/library/ubuntu:22.04");
    /// assert_eq!(r.familiar_string(), "ubuntu:22.04");
    /// assert!(Reference::parse_normalized("Ubuntu").is_err());
    /// ```
    pub fn parse_normalized(s: &str) -> Result<Self, TypeError> {
        if is_identifier(s) {
            return Err(TypeError::InvalidReference {
                value: s.to_string(),
                reason: "cannot specify 64-byte hexadecimal strings".into(),
            });
        }

        let (domain, remainder) = split_domain(s);
        let remote_name = remainder.split_once(':').map_or(remainder.as_str(), |(n, _)| n);
        if remote_name.to_lowercase() != remote_name {
            return Err(TypeError::UppercaseName(remote_name.to_string()));
        }

        Self::from_parts(s, domain, &remainder)
    }

    /// Build a name-only reference from a domain and a repository path.
    pub fn from_name(domain: &str, path: &str) -> Result<Self, TypeError> {
        let value = format!("{domain}/{path}");
        validate_domain(&value, domain)?;
        validate_path(&value, path)?;
        check_name_length(domain, path)?;
        Ok(Self {
            domain: domain.to_string(),
            path: path.to_string(),
            tag: None,
            digest: None,
        })
    }

    fn from_parts(value: &str, domain: String, remainder: &str) -> Result<Self, TypeError> {
        let (name_and_tag, digest) = match remainder.split_once('@') {
            Some((name, digest)) => {
                let digest = Digest::parse(digest).map_err(|e| TypeError::InvalidReference {
                    value: value.to_string(),
                    reason: e.to_string(),
                })?;
                (name, Some(digest))
            }
            None => (remainder, None),
        };

        let (path, tag) = match name_and_tag.rsplit_once(':') {
            Some((path, tag)) => {
                validate_tag(tag)?;
                (path, Some(tag.to_string()))
            }
            None => (name_and_tag, None),
        };

        validate_domain(value, &domain)?;
        validate_path(value, path)?;
        check_name_length(&domain, path)?;

        Ok(Self {
            domain,
            path: path.to_string(),
            tag,
            digest,
        })
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Repository path below the domain, e.g. `library/ubuntu`.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn digest(&self) -> Option<&Digest> {
        self.digest.as_ref()
    }

    /// Returns `true` if the reference carries a digest.
    pub fn is_canonical(&self) -> bool {
        self.digest.is_some()
    }

    pub fn is_tagged(&self) -> bool {
        self.tag.is_some()
    }

    /// Returns `true` if the reference carries neither a tag nor a digest.
    pub fn is_name_only(&self) -> bool {
        self.tag.is_none() && self.digest.is_none()
    }

    /// Full repository name, e.g. `docker.io/library/ubuntu`.
    pub fn name(&self) -> String {
        format!("{}/{}", self.domain, self.path)
    }

    /// Repository name as users write it, e.g. `ubuntu`.
    pub fn familiar_name(&self) -> String {
        if self.domain == DEFAULT_DOMAIN {
            match self.path.strip_prefix(OFFICIAL_REPO_PREFIX) {
                Some(rest) if !rest.contains('/') => rest.to_string(),
                _ => self.path.clone(),
            }
        } else {
            self.name()
        }
    }

    /// Familiar name plus tag and digest, e.g. `ubuntu:latest`.
    pub fn familiar_string(&self) -> String {
        let mut out = self.familiar_name();
        self.write_suffix(&mut out);
        out
    }

    /// The repository name alone, without tag or digest.
    pub fn trim_named(&self) -> Self {
        Self {
            domain: self.domain.clone(),
            path: self.path.clone(),
            tag: None,
            digest: None,
        }
    }

    /// Apply [`DEFAULT_TAG`] if the reference is name-only.
    pub fn with_default_tag(mut self) -> Self {
        if self.is_name_only() {
            self.tag = Some(DEFAULT_TAG.to_string());
        }
        self
    }

    /// Drop the tag when a digest is also present; the digest wins.
    pub fn favor_digest(mut self) -> Self {
        if self.digest.is_some() {
            self.tag = None;
        }
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Result<Self, TypeError> {
        validate_tag(tag)?;
        self.tag = Some(tag.to_string());
        Ok(self)
    }

    pub fn with_digest(mut self, digest: Digest) -> Self {
        self.digest = Some(digest);
        self
    }

    fn write_suffix(&self, out: &mut String) {
        if let Some(tag) = &self.tag {
            out.push(':');
            out.push_str(tag);
        }
        if let Some(digest) = &self.digest {
            out.push('@');
            out.push_str(&digest.to_string());
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = self.name();
        self.write_suffix(&mut out);
        f.write_str(&out)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({self})")
    }
}

impl FromStr for Reference {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_normalized(s)
    }
}

impl TryFrom<String> for Reference {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse_normalized(&s)
    }
}

impl From<Reference> for String {
    fn from(reference: Reference) -> Self {
        reference.to_string()
    }
}

/// A bare 64-character lowercase hex string (an image ID, not a name).
fn is_identifier(s: &str) -> bool {
    s.len() == 64 && s.bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Split off the registry domain, applying the default domain and the
/// official-image prefix when the first component is not a hostname.
fn split_domain(name: &str) -> (String, String) {
    let (mut domain, mut remainder) = match name.split_once('/') {
        Some((first, rest)) if looks_like_domain(first) => (first.to_string(), rest.to_string()),
        _ => (DEFAULT_DOMAIN.to_string(), name.to_string()),
    };
    if domain == LEGACY_DEFAULT_DOMAIN {
        domain = DEFAULT_DOMAIN.to_string();
    }
    if domain == DEFAULT_DOMAIN && !remainder.contains('/') {
        remainder = format!("{OFFICIAL_REPO_PREFIX}{remainder}");
    }
    (domain, remainder)
}

fn looks_like_domain(component: &str) -> bool {
    component.contains('.')
        || component.contains(':')
        || component == "localhost"
        || component.to_lowercase() != component
}

fn validate_tag(tag: &str) -> Result<(), TypeError> {
    let invalid = |reason: &str| TypeError::InvalidTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };
    let word = |b: u8| b.is_ascii_alphanumeric() || b == b'_';

    let mut bytes = tag.bytes();
    match bytes.next() {
        None => return Err(invalid("tag must not be empty")),
        Some(first) if !word(first) => {
            return Err(invalid("must start with an alphanumeric or '_'"));
        }
        Some(_) => {}
    }
    if tag.len() > TAG_LENGTH_MAX {
        return Err(invalid("longer than 128 characters"));
    }
    if !bytes.all(|b| word(b) || b == b'.' || b == b'-') {
        return Err(invalid("contains characters outside [A-Za-z0-9_.-]"));
    }
    Ok(())
}

fn validate_domain(value: &str, domain: &str) -> Result<(), TypeError> {
    let invalid = |reason: String| TypeError::InvalidReference {
        value: value.to_string(),
        reason,
    };

    let host = match domain.rsplit_once(':') {
        Some((host, port)) => {
            if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(format!("invalid port in domain {domain:?}")));
            }
            host
        }
        None => domain,
    };

    let valid_label = |label: &str| {
        let b = label.as_bytes();
        !b.is_empty()
            && b[0].is_ascii_alphanumeric()
            && b[b.len() - 1].is_ascii_alphanumeric()
            && b.iter().all(|c| c.is_ascii_alphanumeric() || *c == b'-')
    };
    if !host.split('.').all(valid_label) {
        return Err(invalid(format!("invalid domain {domain:?}")));
    }
    Ok(())
}

fn validate_path(value: &str, path: &str) -> Result<(), TypeError> {
    for component in path.split('/') {
        if !is_path_component(component) {
            return Err(TypeError::InvalidReference {
                value: value.to_string(),
                reason: format!("invalid path component {component:?}"),
            });
        }
    }
    Ok(())
}

/// `[a-z0-9]+` runs joined by `.`, `_`, `__` or one or more `-`.
fn is_path_component(component: &str) -> bool {
    let b = component.as_bytes();
    let alnum = |c: u8| c.is_ascii_lowercase() || c.is_ascii_digit();
    let mut i = 0;
    loop {
        let start = i;
        while i < b.len() && alnum(b[i]) {
            i += 1;
        }
        if i == start {
            return false;
        }
        if i == b.len() {
            return true;
        }
        match b[i] {
            b'.' => i += 1,
            b'_' => {
                i += 1;
                if i < b.len() && b[i] == b'_' {
                    i += 1;
                }
            }
            b'-' => {
                while i < b.len() && b[i] == b'-' {
                    i += 1;
                }
            }
            _ => return false,
        }
    }
}

fn check_name_length(domain: &str, path: &str) -> Result<(), TypeError> {
    let len = domain.len() + 1 + path.len();
    if len > NAME_TOTAL_LENGTH_MAX {
        return Err(TypeError::NameTooLong {
            name: format!("{domain}/{path}"),
            len,
            max: NAME_TOTAL_LENGTH_MAX,
        });
    }
    Ok(())
}
