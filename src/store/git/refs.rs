//! Parsing of `git ls-remote` output.

use std::fmt;

use crate::store::StoreError;

/// Kind of a remote reference, derived from its `refs/<kind>/` segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefType {
    Tag,
    Branch,
    Pull,
    Head,
    Other(String),
}

impl RefType {
    fn from_segment(segment: &str) -> Self {
        match segment {
            "tags" => RefType::Tag,
            "heads" => RefType::Branch,
            "pull" => RefType::Pull,
            other => match other.to_lowercase() {
                lower if lower == "head" => RefType::Head,
                lower => RefType::Other(lower),
            },
        }
    }
}

impl fmt::Display for RefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefType::Tag => f.write_str("tag"),
            RefType::Branch => f.write_str("branch"),
            RefType::Pull => f.write_str("pull"),
            RefType::Head => f.write_str("head"),
            RefType::Other(kind) => f.write_str(kind),
        }
    }
}

/// One line of a reference listing: `<sha> <raw-ref>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRef {
    pub sha: String,
    /// Short name usable with `git clone -b`, e.g. `v1.0.0` or `pull/12`.
    pub name: String,
    pub raw: String,
    pub kind: RefType,
}

impl GitRef {
    pub fn parse(line: &str) -> Result<Self, StoreError> {
        let mut parts = line.split_whitespace();
        let sha = parts.next().unwrap_or_default();
        let raw = parts.next().unwrap_or_default();

        let segment = match raw.strip_prefix("refs/") {
            Some(rest) => rest.split('/').next().unwrap_or_default(),
            None => raw,
        };
        let kind = RefType::from_segment(segment);

        let name = match kind {
            RefType::Tag | RefType::Branch => raw
                .strip_prefix("refs/")
                .and_then(|rest| rest.strip_prefix(segment))
                .and_then(|rest| rest.strip_prefix('/'))
                .unwrap_or_default(),
            // refs/pull/12/head -> pull/12, refs/pull/12/merge stays as is.
            RefType::Pull => {
                let rest = raw.strip_prefix("refs/").unwrap_or(raw);
                rest.strip_suffix("/head").unwrap_or(rest)
            }
            RefType::Head | RefType::Other(_) => raw,
        };

        if name.is_empty() {
            return Err(StoreError::MalformedRef {
                line: line.to_string(),
            });
        }

        Ok(GitRef {
            sha: sha.to_string(),
            name: name.to_string(),
            raw: raw.to_string(),
            kind,
        })
    }

    pub fn is_branch(&self) -> bool {
        self.kind == RefType::Branch
    }
}

/// A fully parsed reference listing, in listing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefListing {
    refs: Vec<GitRef>,
}

impl RefListing {
    /// Parse every non-empty line. Any malformed line fails the whole listing.
    pub fn parse<I, S>(lines: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let refs = lines
            .into_iter()
            .filter(|line| !line.as_ref().trim().is_empty())
            .map(|line| GitRef::parse(line.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { refs })
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GitRef> {
        self.refs.iter()
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

impl<'a> IntoIterator for &'a RefListing {
    type Item = &'a GitRef;
    type IntoIter = std::slice::Iter<'a, GitRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.refs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag() {
        let r = GitRef::parse("9439972b0c5540831cea5384656c737e32821661        refs/tags/v1.0.0")
            .unwrap();
        assert_eq!(r.sha, "9439972b0c5540831cea5384656c737e32821661");
        assert_eq!(r.name, "v1.0.0");
        assert_eq!(r.raw, "refs/tags/v1.0.0");
        assert_eq!(r.kind, RefType::Tag);
    }

    #[test]
    fn test_parse_branch_with_slashes() {
        let r = GitRef::parse("2afec0cd\trefs/heads/greenkeeper/express-4.17.1").unwrap();
        assert_eq!(r.name, "greenkeeper/express-4.17.1");
        assert!(r.is_branch());
    }

    #[test]
    fn test_parse_pull_refs() {
        let head = GitRef::parse("abc refs/pull/123/head").unwrap();
        assert_eq!(head.kind, RefType::Pull);
        assert_eq!(head.name, "pull/123");

        let merge = GitRef::parse("abc refs/pull/123/merge").unwrap();
        assert_eq!(merge.name, "pull/123/merge");
    }

    #[test]
    fn test_parse_symbolic_head() {
        let r = GitRef::parse("abc HEAD").unwrap();
        assert_eq!(r.kind, RefType::Head);
        assert_eq!(r.name, "HEAD");
        assert_eq!(r.kind.to_string(), "head");
    }

    #[test]
    fn test_parse_other_namespace() {
        let r = GitRef::parse("abc refs/notes/commits").unwrap();
        assert_eq!(r.kind, RefType::Other("notes".into()));
        assert_eq!(r.name, "refs/notes/commits");
    }

    #[test]
    fn test_parse_malformed_line() {
        let err = GitRef::parse("9439972b0c5540831cea5384656c737e32821661").unwrap_err();
        assert!(err.to_string().contains("Unsupported git ref line"));
        assert!(GitRef::parse("abc refs/tags/").is_err());
    }

    #[test]
    fn test_listing_skips_blank_lines_and_keeps_order() {
        let listing = RefListing::parse([
            "a refs/heads/master",
            "",
            "   ",
            "b refs/tags/v1.0.0",
        ])
        .unwrap();
        let names: Vec<_> = listing.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["master", "v1.0.0"]);
        assert_eq!(listing.len(), 2);
    }
}
