use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Reply to a lone `help` command.
pub const HELP_TEXT: &str = "summary/s: summarize the article\nbackup/b: back up the article";

/// A recognized command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Help,
    Summary,
    Backup,
}

impl Command {
    /// Map a single token to its command. Tokens are case-sensitive.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "help" => Some(Self::Help),
            "summary" | "s" => Some(Self::Summary),
            "backup" | "b" => Some(Self::Backup),
            _ => None,
        }
    }
}

/// The distinct tokens of a recognized command message.
///
/// Raw tokens are kept so `{s}` and `{summary}` stay distinguishable in logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSet {
    tokens: BTreeSet<String>,
}

impl CommandSet {
    /// Parse free text into a command set.
    ///
    /// Returns `None` for empty text or when any whitespace-separated token
    /// is outside the vocabulary.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let tokens: BTreeSet<String> = text.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() || tokens.iter().any(|t| Command::from_token(t).is_none()) {
            return None;
        }
        Some(Self { tokens })
    }

    /// `true` when the set is exactly `{help}`.
    #[must_use]
    pub fn is_help_only(&self) -> bool {
        self.tokens.len() == 1 && self.tokens.contains("help")
    }

    #[must_use]
    pub fn contains(&self, command: Command) -> bool {
        self.tokens
            .iter()
            .any(|t| Command::from_token(t) == Some(command))
    }

    #[must_use]
    pub fn wants_summary(&self) -> bool {
        self.contains(Command::Summary)
    }

    #[must_use]
    pub fn wants_backup(&self) -> bool {
        self.contains(Command::Backup)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }
}

impl std::fmt::Display for CommandSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined: Vec<&str> = self.tokens().collect();
        write!(f, "{{{}}}", joined.join(","))
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("s", true, false)]
    #[case("summary", true, false)]
    #[case("b", false, true)]
    #[case("  backup\t", false, true)]
    #[case("s b", true, true)]
    #[case("summary b s", true, true)]
    #[case("help s", true, false)]
    fn recognized(#[case] text: &str, #[case] summary: bool, #[case] backup: bool) {
        let set = CommandSet::parse(text).unwrap();
        assert_eq!(set.wants_summary(), summary);
        assert_eq!(set.wants_backup(), backup);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("hello")]
    #[case("s please")]
    #[case("S")]
    #[case("backup!")]
    fn rejected(#[case] text: &str) {
        assert!(CommandSet::parse(text).is_none());
    }

    #[test]
    fn help_only_ignores_repeats() {
        assert!(CommandSet::parse("help help").is_some_and(|c| c.is_help_only()));
        assert!(CommandSet::parse("help b").is_some_and(|c| !c.is_help_only()));
    }

    #[test]
    fn raw_tokens_are_preserved() {
        let short = CommandSet::parse("s").unwrap();
        let long = CommandSet::parse("summary").unwrap();
        assert_ne!(short, long);
        assert_eq!(short.to_string(), "{s}");
        assert_eq!(CommandSet::parse("s b s").unwrap().to_string(), "{b,s}");
    }
}
