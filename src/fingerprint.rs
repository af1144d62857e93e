//! Cache-busting output filenames.
//!
//! Every generated asset is named `base.HASH8.ext`, where `HASH8` is the
//! trailing eight characters of a one-way hash of either the original
//! filename ([`HashMethod::Name`]) or the encoded bytes
//! ([`HashMethod::Content`]). [`HashMethod::None`] keeps the name as is.
//!
//! Identical inputs always produce the identical name; hosts rely on that
//! for their own caching. The default hash is SHA-256; any
//! `Fn(&[u8]) -> String` can replace it.

use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// Salt prepended to the filename in [`HashMethod::Name`] mode.
pub const NAME_HASH_PREFIX: &str = "_pwa-manifest-";

/// Length of the hash segment in fingerprinted names.
pub const HASH_LEN: usize = 8;

/// What the fingerprint is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashMethod {
    #[default]
    Name,
    Content,
    None,
}

impl HashMethod {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(HashMethod::Name),
            "content" => Some(HashMethod::Content),
            "none" => Some(HashMethod::None),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HashMethod::Name => "name",
            HashMethod::Content => "content",
            HashMethod::None => "none",
        }
    }
}

/// One-way function used for fingerprints.
pub type HashFunction = Arc<dyn Fn(&[u8]) -> String + Send + Sync>;

/// SHA-256 of `data` as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}

/// Derive the output filename for an asset.
pub fn fingerprint(
    filename: &str,
    content: &[u8],
    method: HashMethod,
    hash: &dyn Fn(&[u8]) -> String,
) -> String {
    let digest = match method {
        HashMethod::None => return filename.to_string(),
        HashMethod::Name => hash(format!("{NAME_HASH_PREFIX}{filename}").as_bytes()),
        HashMethod::Content => hash(content),
    };
    let short = trailing_chars(&digest, HASH_LEN);
    match filename.rsplit_once('.') {
        Some((base, ext)) => format!("{base}.{short}.{ext}"),
        None => format!("{filename}.{short}"),
    }
}

/// Last `n` characters of `s` (all of `s` when shorter). `n` must be non-zero.
fn trailing_chars(s: &str, n: usize) -> &str {
    s.char_indices()
        .rev()
        .nth(n - 1)
        .map_or(s, |(idx, _)| &s[idx..])
}

/// A naming mode bound to a hash function.
#[derive(Clone)]
pub struct Fingerprinter {
    method: HashMethod,
    hash: HashFunction,
}

impl Fingerprinter {
    pub fn new(method: HashMethod) -> Self {
        Self {
            method,
            hash: Arc::new(sha256_hex),
        }
    }

    pub fn with_method(mut self, method: HashMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_hash_function<F>(mut self, hash: F) -> Self
    where
        F: Fn(&[u8]) -> String + Send + Sync + 'static,
    {
        self.hash = Arc::new(hash);
        self
    }

    pub fn method(&self) -> HashMethod {
        self.method
    }

    pub fn fingerprint(&self, filename: &str, content: &[u8]) -> String {
        fingerprint(filename, content, self.method, self.hash.as_ref())
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(HashMethod::default())
    }
}

impl fmt::Debug for Fingerprinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fingerprinter")
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}
