//! Qualified names, the unit every selector segment and every parsed element
//! name is compared in.

use std::fmt;

/// A resolved `(namespace-uri, local-name, prefix)` triple.
///
/// Two names are equal iff their namespace URI and local name agree; the
/// prefix is presentational only and never affects equality or hashing.
#[derive(Debug, Clone)]
pub struct QName {
    pub namespace_uri: String,
    pub local_name: String,
    pub prefix: String,
}

impl QName {
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>, prefix: impl Into<String>) -> Self {
        QName {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
            prefix: prefix.into(),
        }
    }

    /// The name as it should be written back out: `prefix:local` if a prefix
    /// is present, else just `local`.
    pub fn qualified(&self) -> String {
        if self.prefix.is_empty() {
            self.local_name.clone()
        } else {
            format!("{}:{}", self.prefix, self.local_name)
        }
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace_uri == other.namespace_uri && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.qualified())
    }
}
