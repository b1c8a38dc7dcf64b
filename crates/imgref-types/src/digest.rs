use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256, Sha384, Sha512};

use crate::error::TypeError;

/// Name of the canonical digest algorithm, as it appears in rendered digests.
///
/// A repository may not be named after it: `sha256:<tag>` would be
/// indistinguishable from a bare digest string.
pub const CANONICAL_ALGORITHM: &str = "sha256";

/// Hash algorithm that produced a [`Digest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DigestAlgorithm {
    Sha256,
    Sha384,
    Sha512,
}

impl DigestAlgorithm {
    /// The algorithm identifier used in the `<algorithm>:<hex>` form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }

    /// Length of the hex-encoded digest value.
    pub fn hex_len(&self) -> usize {
        match self {
            Self::Sha256 => 64,
            Self::Sha384 => 96,
            Self::Sha512 => 128,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DigestAlgorithm {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            other => Err(TypeError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Content-derived, immutable identifier for an artifact.
///
/// Rendered as `<algorithm>:<lowercase hex>`, e.g. `sha256:e3b0c4...`.
/// Ordering and equality follow the rendered string.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    algorithm: DigestAlgorithm,
    encoded: String,
}

impl Digest {
    /// Compute the canonical (sha256) digest of `data`.
    pub fn from_content(data: &[u8]) -> Self {
        Self::from_content_with(DigestAlgorithm::Sha256, data)
    }

    /// Compute the digest of `data` with the given algorithm.
    pub fn from_content_with(algorithm: DigestAlgorithm, data: &[u8]) -> Self {
        let encoded = match algorithm {
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
            DigestAlgorithm::Sha384 => hex::encode(Sha384::digest(data)),
            DigestAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
        };
        Self { algorithm, encoded }
    }

    /// Build a digest from an algorithm and its hex-encoded value.
    pub fn new(algorithm: DigestAlgorithm, encoded: &str) -> Result<Self, TypeError> {
        let value = || format!("{algorithm}:{encoded}");
        if encoded.len() != algorithm.hex_len() {
            return Err(TypeError::InvalidDigest {
                value: value(),
                reason: format!(
                    "expected {} hex characters, got {}",
                    algorithm.hex_len(),
                    encoded.len()
                ),
            });
        }
        if !encoded
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(TypeError::InvalidDigest {
                value: value(),
                reason: "encoded part must be lowercase hex".into(),
            });
        }
        Ok(Self {
            algorithm,
            encoded: encoded.to_string(),
        })
    }

    /// Parse the `<algorithm>:<hex>` form.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let (algorithm, encoded) = s.split_once(':').ok_or_else(|| TypeError::InvalidDigest {
            value: s.to_string(),
            reason: "missing algorithm separator ':'".into(),
        })?;
        Self::new(algorithm.parse()?, encoded)
    }

    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The hex-encoded value, without the algorithm prefix.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// Short hex representation (first 12 characters), as shown to users.
    pub fn short(&self) -> &str {
        &self.encoded[..12]
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({}:{})", self.algorithm, self.short())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.encoded)
    }
}

impl FromStr for Digest {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = TypeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str =
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn from_content_is_deterministic() {
        let d1 = Digest::from_content(b"hello world");
        let d2 = Digest::from_content(b"hello world");
        assert_eq!(d1, d2);
        assert_ne!(d1, Digest::from_content(b"hello"));
    }

    #[test]
    fn empty_content_matches_known_sha256() {
        assert_eq!(Digest::from_content(b"").to_string(), EMPTY_SHA256);
    }

    #[test]
    fn parse_and_display_agree() {
        let digest = Digest::parse(EMPTY_SHA256).unwrap();
        assert_eq!(digest.algorithm(), DigestAlgorithm::Sha256);
        assert_eq!(digest.to_string(), EMPTY_SHA256);
        assert_eq!(digest.short(), "e3b0c44298fc");
    }

    #[test]
    fn other_algorithms_have_their_own_lengths() {
        let d384 = Digest::from_content_with(DigestAlgorithm::Sha384, b"x");
        let d512 = Digest::from_content_with(DigestAlgorithm::Sha512, b"x");
        assert_eq!(d384.encoded().len(), 96);
        assert_eq!(d512.encoded().len(), 128);
        assert_eq!(Digest::parse(&d512.to_string()).unwrap(), d512);
    }

    #[test]
    fn reject_missing_separator() {
        assert!(matches!(
            Digest::parse("e3b0c44298fc"),
            Err(TypeError::InvalidDigest { .. })
        ));
    }

    #[test]
    fn reject_unknown_algorithm() {
        assert_eq!(
            Digest::parse("md5:d41d8cd98f00b204e9800998ecf8427e"),
            Err(TypeError::UnsupportedAlgorithm("md5".into()))
        );
    }

    #[test]
    fn reject_wrong_length_and_uppercase() {
        assert!(Digest::parse("sha256:abcd").is_err());
        let upper = EMPTY_SHA256.to_uppercase().replacen("SHA256", "sha256", 1);
        assert!(Digest::parse(&upper).is_err());
    }

    #[test]
    fn serde_uses_string_form() {
        let digest = Digest::parse(EMPTY_SHA256).unwrap();
        let json = serde_json::to_string(&digest).unwrap();
        assert_eq!(json, format!("\"{EMPTY_SHA256}\""));
        let parsed: Digest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, digest);
        assert!(serde_json::from_str::<Digest>("\"sha256:nothex\"").is_err());
    }

    #[test]
    fn ordering_follows_rendered_form() {
        let a = Digest::new(DigestAlgorithm::Sha256, &"0".repeat(64)).unwrap();
        let b = Digest::new(DigestAlgorithm::Sha256, &"1".repeat(64)).unwrap();
        assert!(a < b);
    }
}
