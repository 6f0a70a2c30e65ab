//! Insertion-ordered error accumulation with first-write-wins semantics.
//!
//! An [`ErrorSet`] maps error codes to human-readable descriptions. Entries
//! keep the order in which they were first added, and a code that is already
//! present is never overwritten by a later [`ErrorSet::add`].

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Ordered collection of `(code, description)` pairs.
///
/// The only mutation is [`add`](Self::add). Runs hand the set to callers by
/// shared reference once execution finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorSet {
    entries: Vec<(String, String)>,
}

impl ErrorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `description` under `code` unless `code` is already present.
    pub fn add(&mut self, code: impl Into<String>, description: impl Into<String>) {
        let code = code.into();
        if self.contains(&code) {
            return;
        }
        self.entries.push((code, description.into()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if at least one error has been recorded.
    #[must_use]
    pub fn any(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.entries.iter().any(|(c, _)| c == code)
    }

    /// Returns the description stored for `code`.
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(c, _)| c == code)
            .map(|(_, d)| d.as_str())
    }

    /// Iterates `(code, description)` pairs in insertion order.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Lazily renders each entry as `"code: description"` in insertion order.
    ///
    /// The returned iterator is `Clone`, so it can be restarted from the
    /// beginning without touching the set again.
    pub fn to_list(&self) -> Lines<'_> {
        Lines {
            inner: self.entries.iter(),
        }
    }

    /// Lazily yields every description with all `:` characters removed.
    ///
    /// This filters the whole description, not just a leading `"code: "`
    /// prefix: `"Expected: a value"` becomes `"Expected a value"`.
    pub fn only_messages(&self) -> Messages<'_> {
        Messages {
            inner: self.entries.iter(),
        }
    }
}

impl fmt::Display for ErrorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.to_list().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&line)?;
        }
        Ok(())
    }
}

impl Serialize for ErrorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (code, description) in &self.entries {
            map.serialize_entry(code, description)?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a ErrorSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ---------------------------------------------------------------------------
// Iterators
// ---------------------------------------------------------------------------

/// Borrowing iterator over `(code, description)` pairs.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, String)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(c, d)| (c.as_str(), d.as_str()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

/// Iterator produced by [`ErrorSet::to_list`].
#[derive(Debug, Clone)]
pub struct Lines<'a> {
    inner: std::slice::Iter<'a, (String, String)>,
}

impl Iterator for Lines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner.next().map(|(c, d)| format!("{c}: {d}"))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Lines<'_> {}

/// Iterator produced by [`ErrorSet::only_messages`].
#[derive(Debug, Clone)]
pub struct Messages<'a> {
    inner: std::slice::Iter<'a, (String, String)>,
}

impl Iterator for Messages<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        self.inner
            .next()
            .map(|(_, d)| d.chars().filter(|&ch| ch != ':').collect())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Messages<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
