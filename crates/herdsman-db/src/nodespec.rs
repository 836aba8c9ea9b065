//! Nodespec parsing and matching
//!
//! A nodespec is a comma-separated list of name patterns. `*` matches any
//! run of characters and `?` matches exactly one; bracket ranges are not
//! supported. A token without a `.` also matches the
//! host part of a fully-qualified name, so `node1` matches `node1.cluster`.

use std::fmt;

/// Parsed nodespec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSpec {
    raw: String,
    patterns: Vec<String>,
}

impl NodeSpec {
    /// Parse a nodespec string
    #[must_use]
    pub fn parse(spec: &str) -> Self {
        let mut patterns = Vec::new();

        for token in spec.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            patterns.push(token.to_string());

            if !token.contains('.') {
                patterns.push(format!("{token}.*"));
            }
        }

        Self {
            raw: spec.to_string(),
            patterns,
        }
    }

    /// Whether `name` is selected by this nodespec
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| wildcard_match(p.as_bytes(), name.as_bytes()))
    }

    /// Whether the nodespec selects nothing at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Short host name of a possibly fully qualified name
#[must_use]
pub fn host_part(name: &str) -> &str {
    name.split_once('.').map_or(name, |(host, _)| host)
}

impl fmt::Display for NodeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn wildcard_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // position of last '*' in pattern and the text index it was tried at
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == b'?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star, matched)) = backtrack {
            p = star + 1;
            t = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}
