use std::fmt;

use serde::{Deserialize, Serialize};

/// Which half of a user's storage a path lives in.
///
/// Private files are only visible to their owner. Public files are visible to
/// everyone, which is why field values placed there are always encrypted for
/// an explicit recipient list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Private,
    Public,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Private => write!(f, "private"),
            Scope::Public => write!(f, "public"),
        }
    }
}

/// A logical location in the remote store.
///
/// The store client decides where this physically lives (for Keybase:
/// `/keybase/<scope>/<owner>/<base_path>/<segments..>`). An `owner` of `None`
/// means the current user.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    scope: Scope,
    owner: Option<String>,
    segments: Vec<String>,
}

impl StorePath {
    pub fn private() -> Self {
        Self {
            scope: Scope::Private,
            owner: None,
            segments: Vec::new(),
        }
    }

    pub fn public() -> Self {
        Self {
            scope: Scope::Public,
            owner: None,
            segments: Vec::new(),
        }
    }

    /// Point this path into another user's namespace
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn join(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Segments joined with `/`, empty for the scope root
    pub fn relative(&self) -> String {
        self.segments.join("/")
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.scope,
            self.owner.as_deref().unwrap_or("~"),
            self.relative()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let path = StorePath::private()
            .join("services")
            .join("http@a.com@80")
            .join("info.json");
        assert_eq!(path.to_string(), "private/~/services/http@a.com@80/info.json");
        assert_eq!(path.relative(), "services/http@a.com@80/info.json");

        let path = StorePath::public().owned_by("malte").join("ids");
        assert_eq!(path.to_string(), "public/malte/ids");
        assert_eq!(path.owner(), Some("malte"));
    }
}
