//! Paths exempt from authentication.
//!
//! The list is security-sensitive: every prefix here opens a route to
//! anonymous traffic, so deployments review it rather than guess it.

/// Prefix allow-list for anonymous access.
#[derive(Debug, Clone, Default)]
pub struct PublicPaths {
    prefixes: Vec<String>,
}

impl PublicPaths {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns true if `path` starts with any configured prefix.
    pub fn is_public(&self, path: &str) -> bool {
        self.prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }
}
