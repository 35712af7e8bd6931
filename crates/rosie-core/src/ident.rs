use std::fmt;

use serde::{Deserialize, Serialize};

/// A possibly package-qualified RPL identifier.
///
/// The canonical rendering joins the non-empty parts with `.`, so
/// `net.ipv4` is the identifier `ipv4` in package `net`. Equality is
/// structural over both parts.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct Identifier {
    pub package: Option<String>,
    pub localname: String,
}

impl Identifier {
    /// An unqualified identifier.
    pub fn local(localname: impl Into<String>) -> Self {
        Self {
            package: None,
            localname: localname.into(),
        }
    }

    /// A package-qualified identifier.
    pub fn qualified(package: impl Into<String>, localname: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            localname: localname.into(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        self.package.is_some()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "{}.{}", pkg, self.localname),
            None => write!(f, "{}", self.localname),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_renders_bare() {
        assert_eq!(Identifier::local("digit").to_string(), "digit");
    }

    #[test]
    fn qualified_renders_dotted() {
        assert_eq!(Identifier::qualified("net", "ipv4").to_string(), "net.ipv4");
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(Identifier::local("a"), Identifier::local("a"));
        assert_ne!(Identifier::local("a"), Identifier::qualified("p", "a"));
    }
}
