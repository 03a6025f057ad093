//! Capability allow-list parsed from process configuration.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Set of account logins granted access to gated tools.
///
/// Parsed once per session from a comma-delimited configuration string.
/// Membership is an exact string match; an absent or empty configuration
/// yields an empty set, so gating fails closed.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AllowList(BTreeSet<String>);

impl AllowList {
    /// Parses an optional delimited configuration value.
    ///
    /// Tokens are split on commas, trimmed, and empty entries dropped.
    /// Missing configuration degrades to an empty set rather than failing,
    /// so session setup never crashes on unset environment.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        let entries = raw
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        Self(entries)
    }

    /// Returns whether the supplied login is a member.
    #[must_use]
    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    /// Returns the number of distinct entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns whether the allow-list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the entries in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl FromStr for AllowList {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(Some(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_drops_empty_entries() {
        let list = AllowList::parse(Some(" a, b ,,b"));
        assert_eq!(list.len(), 2);
        assert!(list.contains("a"));
        assert!(list.contains("b"));
        assert!(!list.contains(" a"));
    }

    #[test]
    fn parsing_is_idempotent() {
        let raw = "octocat, hubot ,octocat";
        let first = AllowList::parse(Some(raw));
        let second = AllowList::parse(Some(raw));
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn missing_configuration_degrades_to_empty() {
        assert!(AllowList::parse(None).is_empty());
        assert!(AllowList::parse(Some("")).is_empty());
        assert!(AllowList::parse(Some(" , ,")).is_empty());
    }

    #[test]
    fn membership_is_exact_match() {
        let list = AllowList::parse(Some("octocat"));
        assert!(list.contains("octocat"));
        assert!(!list.contains("octo"));
        assert!(!list.contains("octocat2"));
    }
}
