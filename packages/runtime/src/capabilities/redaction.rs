//! Sensitive-parameter redaction.
//!
//! Works on the serialized text of the params, not on their structure: any
//! `"key": value` pair whose key exactly matches a configured name has its
//! value replaced with [`FILTERED`]. Matching is case-sensitive. A value may
//! be a string, a bare scalar, or a whole object or array, which is filtered
//! including everything nested in it.

use std::borrow::Cow;

use opkit_core::Capability;
use regex::Regex;

use crate::error::ConfigError;

/// Marker that replaces filtered values.
pub const FILTERED: &str = "[FILTERED]";

/// Replaces the values of configured keys in logged params.
#[derive(Debug, Clone)]
pub struct RedactionCapability {
    keys: Vec<String>,
    pattern: Option<Regex>,
}

impl RedactionCapability {
    pub const NAME: &'static str = "redaction";

    /// Builds the matcher for `keys`. An empty list filters nothing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRedactionPattern`] if the combined
    /// pattern cannot be compiled (e.g. it exceeds the regex size limit).
    pub fn new<I, S>(keys: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let pattern = if keys.is_empty() {
            None
        } else {
            let alternatives = keys
                .iter()
                .map(|key| regex::escape(key))
                .collect::<Vec<_>>()
                .join("|");
            // A quoted key and its colon; the value is found by `value_end`.
            Some(Regex::new(&format!(r#""({alternatives})"\s*:\s*"#))?)
        };
        Ok(Self { keys, pattern })
    }

    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Redacts `text`, borrowing it unchanged when nothing matches.
    #[must_use]
    pub fn redact<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let Some(pattern) = &self.pattern else {
            return Cow::Borrowed(text);
        };

        let mut out = String::new();
        let mut copied = 0;
        let mut search = 0;
        while let Some(caps) = pattern.captures_at(text, search) {
            let (Some(whole), Some(key)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let Some(end) = value_end(text, whole.end()) else {
                search = whole.end();
                continue;
            };
            out.push_str(&text[copied..whole.start()]);
            out.push('"');
            out.push_str(key.as_str());
            out.push_str("\":\"");
            out.push_str(FILTERED);
            out.push('"');
            copied = end;
            search = end;
        }

        if copied == 0 {
            return Cow::Borrowed(text);
        }
        out.push_str(&text[copied..]);
        Cow::Owned(out)
    }
}

/// Byte offset just past the JSON value starting at `start`.
fn value_end(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    match bytes.get(start)? {
        b'"' => string_end(bytes, start),
        b'{' | b'[' => {
            let mut depth = 0usize;
            let mut i = start;
            while i < bytes.len() {
                match bytes[i] {
                    b'"' => {
                        i = string_end(bytes, i)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some(i + 1);
                        }
                    }
                    _ => {}
                }
                i += 1;
            }
            None
        }
        _ => {
            let len = text[start..]
                .find(|ch: char| matches!(ch, ',' | '{' | '}' | '[' | ']') || ch.is_whitespace())
                .unwrap_or(text.len() - start);
            (len > 0).then_some(start + len)
        }
    }
}

/// Byte offset just past the closing quote of the string opening at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'"' => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

impl Capability for RedactionCapability {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn redact_for_logging(&self, params: String) -> String {
        match self.redact(&params) {
            Cow::Borrowed(_) => params,
            Cow::Owned(redacted) => redacted,
        }
    }
}
