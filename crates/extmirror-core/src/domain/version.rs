//! Version string parsing and precedence.
//!
//! Marketplaces do not always publish strict SemVer (`1.0`, `2023.3.1.2`),
//! so versions are parsed into a [`VersionKey`] that accepts any number of
//! numeric components and an optional SemVer pre-release suffix. Missing
//! components compare as zero.

use std::cmp::Ordering;

use semver::{Prerelease, Version, VersionReq};

/// Parsed, comparable form of a version string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionKey {
    numeric: Vec<u64>,
    pre: Prerelease,
}

impl VersionKey {
    /// Parse a version string leniently.
    ///
    /// Accepts an optional leading `v`, one or more dot-separated numeric
    /// components, an optional `-prerelease` and an ignored `+build`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let without_build = trimmed.split_once('+').map_or(trimmed, |(v, _)| v);
        let (core, pre) = without_build
            .split_once('-')
            .map_or((without_build, ""), |(c, p)| (c, p));

        if core.is_empty() {
            return None;
        }
        let numeric = core
            .split('.')
            .map(|part| {
                if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                    None
                } else {
                    part.parse::<u64>().ok()
                }
            })
            .collect::<Option<Vec<_>>>()?;
        let pre = Prerelease::new(pre).ok()?;

        Some(Self { numeric, pre })
    }

    /// Numeric component at `index`, zero when absent.
    fn component(&self, index: usize) -> u64 {
        self.numeric.get(index).copied().unwrap_or(0)
    }

    /// The closest strict SemVer version (first three components).
    #[must_use]
    pub fn to_semver(&self) -> Version {
        Version {
            major: self.component(0),
            minor: self.component(1),
            patch: self.component(2),
            pre: self.pre.clone(),
            build: semver::BuildMetadata::EMPTY,
        }
    }
}

impl Ord for VersionKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.numeric.len().max(other.numeric.len());
        (0..len)
            .map(|i| self.component(i).cmp(&other.component(i)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.pre.cmp(&other.pre))
    }
}

impl PartialOrd for VersionKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compare two raw version strings by precedence.
///
/// Parseable versions rank above unparseable ones; two unparseable strings
/// compare lexically so the order stays total.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (VersionKey::parse(a), VersionKey::parse(b)) {
        (Some(ka), Some(kb)) => ka.cmp(&kb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Outcome of checking an engine constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMatch {
    /// The engine version satisfies the constraint.
    Compatible,
    /// The engine version is outside the constraint.
    Incompatible,
    /// The constraint could not be parsed.
    InvalidConstraint,
}

/// Check an npm-style engine range against a version.
///
/// Accepts caret/tilde/comparator ranges with comparators separated by
/// spaces or commas, hyphen ranges (`1.2.0 - 1.4.0`) and `||` alternatives.
/// `*` and empty constraints match everything.
pub fn engine_matches(constraint: &str, engine: &Version) -> EngineMatch {
    let constraint = constraint.trim();
    if constraint.is_empty() || constraint == "*" {
        return EngineMatch::Compatible;
    }

    let mut verdict = EngineMatch::Incompatible;
    for alternative in constraint.split("||") {
        match npm_range(alternative) {
            Some(req) if req.matches(engine) => return EngineMatch::Compatible,
            Some(_) => {}
            None => verdict = EngineMatch::InvalidConstraint,
        }
    }
    verdict
}

/// Translate one npm range (no `||`) into a [`VersionReq`].
fn npm_range(range: &str) -> Option<VersionReq> {
    let tokens: Vec<&str> = range
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    let comparators = match tokens.as_slice() {
        [] | ["*"] => return Some(VersionReq::STAR),
        [low, "-", high] => format!(">={low}, <={high}"),
        _ => {
            // `>= 1.60.0` is one comparator written as two tokens.
            let mut merged: Vec<String> = Vec::with_capacity(tokens.len());
            let mut pending_op = String::new();
            for &token in &tokens {
                if token.chars().all(|c| matches!(c, '<' | '>' | '=' | '~' | '^')) {
                    pending_op.push_str(token);
                } else if pending_op.is_empty() && is_bare_version(token) {
                    // npm reads a bare version as an exact match, semver as caret.
                    merged.push(format!("={token}"));
                } else {
                    merged.push(format!("{pending_op}{token}"));
                    pending_op.clear();
                }
            }
            if !pending_op.is_empty() {
                return None;
            }
            merged.join(", ")
        }
    };
    VersionReq::parse(&comparators).ok()
}

fn is_bare_version(token: &str) -> bool {
    token.starts_with(|c: char| c.is_ascii_digit()) && !token.contains(['x', 'X', '*'])
}
