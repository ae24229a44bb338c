use std::fmt;

/// A field path addressing part of a document: a sequence of map keys,
/// applied from the root. Arrays are transparent, so a path never carries an
/// array index; it addresses the matching field inside every array element.
///
/// The empty path addresses the whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// The empty path, addressing the document root.
    pub fn root() -> Path {
        Path::default()
    }

    pub fn new<I, S>(segments: I) -> Path
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Path {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a dot-separated path, e.g. `"pos.x"`. The empty string is the
    /// root path. Keys containing a literal dot must go through [`Path::new`].
    pub fn parse(path: &str) -> Path {
        if path.is_empty() {
            return Path::root();
        }
        Path::new(path.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut first = true;
        for seg in &self.segments {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            f.write_str(seg)?;
        }
        Ok(())
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Path {
        Path::parse(path)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_and_display() {
        let path = Path::parse("pos.x");
        assert_eq!(path.segments(), &["pos".to_string(), "x".to_string()]);
        assert_eq!(path.to_string(), "pos.x");
        assert!(Path::parse("").is_root());
        assert_eq!(Path::root().to_string(), "");
    }

    #[test]
    fn dotted_key() {
        let path = Path::new(["a.b"]);
        assert_eq!(path.segments().len(), 1);
    }
}
