//! IDE build numbers and `since-build`/`until-build` compatibility.
//!
//! A build number is a product code followed by dot-separated components,
//! e.g. `IC-241.15989.150`. The product code is ignored. A `*` component
//! (or `SNAPSHOT`) matches everything from that position on. Missing
//! components count as zero.

use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Number(u64),
    Any,
}

/// A parsed IDE build number.
#[derive(Debug, Clone)]
pub struct BuildNumber(Vec<Component>);

impl BuildNumber {
    /// Parse a build number, or `None` when it has no numeric part.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let numeric = match raw.rsplit_once('-') {
            Some((product, rest)) if product.chars().all(|c| c.is_ascii_alphabetic()) => rest,
            _ => raw,
        };
        if numeric.is_empty() {
            return None;
        }

        let mut components = Vec::new();
        for part in numeric.split('.') {
            let component = match part {
                "*" | "SNAPSHOT" => Component::Any,
                digits => Component::Number(digits.parse().ok()?),
            };
            components.push(component);
            if component == Component::Any {
                break;
            }
        }
        Some(Self(components))
    }

    fn component(&self, i: usize) -> Component {
        match self.0.last() {
            Some(Component::Any) if i >= self.0.len() - 1 => Component::Any,
            _ => self.0.get(i).copied().unwrap_or(Component::Number(0)),
        }
    }
}

impl Ord for BuildNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());
        for i in 0..len {
            let ordering = match (self.component(i), other.component(i)) {
                (Component::Any, Component::Any) => return Ordering::Equal,
                (Component::Any, Component::Number(_)) => return Ordering::Greater,
                (Component::Number(_), Component::Any) => return Ordering::Less,
                (Component::Number(a), Component::Number(b)) => a.cmp(&b),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl PartialEq for BuildNumber {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BuildNumber {}

impl PartialOrd for BuildNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Whether `build` lies inside `[since, until]`.
///
/// An absent, blank or unparseable bound does not restrict. A wildcard in
/// `until` admits every build with the same leading components.
pub fn is_compatible(since: Option<&str>, until: Option<&str>, build: &BuildNumber) -> bool {
    let bound = |raw: Option<&str>| raw.and_then(BuildNumber::parse);

    if let Some(since) = bound(since) {
        if *build < since {
            return false;
        }
    }
    if let Some(until) = bound(until) {
        if *build > until {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(raw: &str) -> BuildNumber {
        BuildNumber::parse(raw).unwrap()
    }

    #[test]
    fn test_parse_strips_product_code() {
        assert_eq!(b("IC-241.15989.150"), b("241.15989.150"));
        assert_eq!(b("241"), b("241.0.0"));
        assert!(BuildNumber::parse("").is_none());
        assert!(BuildNumber::parse("n/a").is_none());
        assert!(BuildNumber::parse("IU-").is_none());
    }

    #[test]
    fn test_ordering() {
        assert!(b("233.11799") < b("241.1"));
        assert!(b("241.15989.150") > b("241.15989"));
        assert!(b("241.*") > b("241.99999.9"));
        assert!(b("241.*") < b("242.0"));
    }

    #[test]
    fn test_compatibility_window() {
        let build = b("IC-241.15989.150");
        let cases = [
            (Some("233.11799"), Some("241.*"), true),
            (Some("241.15989"), Some("241.15989.150"), true),
            (Some("242.0"), None, false),
            (None, Some("233.*"), false),
            (Some(""), Some("n/a"), true),
            (None, None, true),
        ];
        for (since, until, expected) in cases {
            assert_eq!(
                is_compatible(since, until, &build),
                expected,
                "since {since:?} until {until:?}"
            );
        }
    }
}
