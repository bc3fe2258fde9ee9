//! Durable cache key composition.
//!
//! Keys handed to the external store are namespaced and versioned so that
//! unrelated consumers of the same store never collide, and bumping
//! [`KEY_VERSION`] invalidates every previously written entry at once.

use std::fmt;

/// Namespace prepended to every composed key.
pub const KEY_NAMESPACE: &str = "treebuild";

/// Version marker baked into every composed key. Bump to invalidate all
/// prior store entries.
pub const KEY_VERSION: &str = "v1";

/// Delimiter joining namespace, version, and caller tokens.
pub const KEY_SEPARATOR: char = '/';

/// A durable cache key as sent to the external store.
///
/// Construct with [`CacheKey::compose`] to get the namespaced, versioned
/// form, or convert from a raw string when driving the registry directly
/// with keys owned by the embedding application.
///
/// # Examples
///
/// ```
/// use treebuild::CacheKey;
///
/// let key = CacheKey::compose(["posts", "42"]);
/// assert_eq!(key.as_str(), "treebuild/v1/posts/42");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Joins the namespace, version marker, and caller-supplied tokens with
    /// [`KEY_SEPARATOR`].
    pub fn compose<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut raw = String::with_capacity(KEY_NAMESPACE.len() + KEY_VERSION.len() + 1);
        raw.push_str(KEY_NAMESPACE);
        raw.push(KEY_SEPARATOR);
        raw.push_str(KEY_VERSION);
        for token in tokens {
            raw.push(KEY_SEPARATOR);
            raw.push_str(token.as_ref());
        }
        Self(raw)
    }

    /// The key's textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
