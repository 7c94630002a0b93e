//! Resolution paths.
//!
//! Paths are slash-delimited strings (`/tree/data/a`). The older
//! array-of-segments form is still accepted, but it is normalized here at the
//! boundary and nothing past this module ever sees it.

use std::fmt;
use std::sync::Once;

static LEGACY_PATH_WARNING: Once = Once::new();

/// A normalized path: the non-empty segments between slashes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct DagPath(Vec<String>);

impl DagPath {
    /// Parse a slash-delimited path. Leading, trailing and repeated slashes
    /// are ignored.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
                .collect(),
        )
    }

    /// Build a path from the deprecated array-of-segments form.
    pub fn from_legacy_segments<I, T>(segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        LEGACY_PATH_WARNING.call_once(|| {
            tracing::warn!(
                "passing path segments as an array is deprecated, use the string form (eg /path/to/data) instead"
            );
        });
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect::<Vec<_>>()
            .join("/");
        Self::parse(&joined)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Append another path to this one.
    pub fn join(&self, other: &DagPath) -> DagPath {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        DagPath(segments)
    }
}

impl fmt::Display for DagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0.join("/"))
    }
}

impl From<&str> for DagPath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for DagPath {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<&String> for DagPath {
    fn from(path: &String) -> Self {
        Self::parse(path)
    }
}

impl From<&DagPath> for DagPath {
    fn from(path: &DagPath) -> Self {
        path.clone()
    }
}

impl From<&[&str]> for DagPath {
    fn from(segments: &[&str]) -> Self {
        Self::from_legacy_segments(segments)
    }
}

impl<const N: usize> From<[&str; N]> for DagPath {
    fn from(segments: [&str; N]) -> Self {
        Self::from_legacy_segments(segments)
    }
}

impl From<Vec<&str>> for DagPath {
    fn from(segments: Vec<&str>) -> Self {
        Self::from_legacy_segments(segments)
    }
}

impl From<Vec<String>> for DagPath {
    fn from(segments: Vec<String>) -> Self {
        Self::from_legacy_segments(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slashes_are_normalized() {
        let expected = DagPath::parse("tree/data/a");
        assert_eq!(DagPath::parse("/tree/data/a"), expected);
        assert_eq!(DagPath::parse("tree//data/a/"), expected);
        assert_eq!(expected.segments(), ["tree", "data", "a"]);
    }

    #[test]
    fn test_empty_path() {
        assert!(DagPath::parse("").is_empty());
        assert!(DagPath::parse("/").is_empty());
        assert_eq!(DagPath::parse("").to_string(), "/");
    }

    #[test]
    fn test_legacy_segments_match_string_form() {
        let legacy: DagPath = ["tree", "_tupelo", "authentications"].into();
        assert_eq!(legacy, DagPath::from("/tree/_tupelo/authentications"));

        let owned: DagPath = vec!["id".to_string()].into();
        assert_eq!(owned, DagPath::from("id"));
    }

    #[test]
    fn test_join() {
        let base = DagPath::parse("/tree/data");
        assert_eq!(base.join(&DagPath::parse("a/b")), DagPath::parse("tree/data/a/b"));
        assert_eq!(base.join(&DagPath::default()), base);
    }
}
