//! Conventional Commits parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::{Commit, CommitType, RawCommit};

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<type>\w+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<subject>.+)$")
        .expect("invalid regex")
});

static BREAKING_FOOTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?ms)^BREAKING[ -]CHANGE:\s*(?P<message>.+)").expect("invalid regex")
});

/// Parses a raw commit.
///
/// Never fails: a header that does not follow the Conventional Commits
/// format yields a [`CommitType::Other`] commit whose subject is the whole
/// first line.
#[must_use]
pub fn parse(raw: &RawCommit) -> Commit {
    let title = raw.subject();
    let body = raw.body();

    let builder = match HEADER_RE.captures(title) {
        Some(captures) => {
            let r#type = CommitType::from_declared(&captures["type"]);
            let scope = captures.name("scope").map_or("", |m| m.as_str());
            Commit::builder(&raw.hash, r#type)
                .scope(scope)
                .subject(&captures["subject"])
                .breaking(captures.name("breaking").is_some())
        }
        None => Commit::builder(&raw.hash, CommitType::Other).subject(title),
    };

    let mut builder = builder
        .title(title)
        .pre_released(raw.pre_released)
        .author(&raw.author)
        .date(raw.date);

    if let Some(body) = body {
        if let Some(captures) = BREAKING_FOOTER_RE.captures(body) {
            builder = builder.breaking_message(captures["message"].trim());
        }
        builder = builder.body(body);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn make_raw(message: &str) -> RawCommit {
        RawCommit::new("abc1234567", message, "Test", "test@test.com", Utc::now())
    }

    #[test]
    fn test_simple_commit() {
        let parsed = parse(&make_raw("feat: add new feature"));

        assert_eq!(parsed.r#type, CommitType::Feat);
        assert!(parsed.scope.is_none());
        assert_eq!(parsed.subject, "add new feature");
        assert_eq!(parsed.title, "feat: add new feature");
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_with_scope() {
        let parsed = parse(&make_raw("fix(parser): handle edge case"));

        assert_eq!(parsed.r#type, CommitType::Fix);
        assert_eq!(parsed.scope.as_deref(), Some("parser"));
        assert_eq!(parsed.subject, "handle edge case");
    }

    #[test]
    fn test_breaking_bang() {
        let parsed = parse(&make_raw("feat(api)!: redesign endpoints"));

        assert_eq!(parsed.r#type, CommitType::Feat);
        assert!(parsed.breaking);
        assert!(parsed.breaking_message.is_none());
    }

    #[test]
    fn test_breaking_footer() {
        let parsed = parse(&make_raw(
            "refactor: drop legacy flags\n\nCleanup.\n\nBREAKING CHANGE: --old is gone\nuse --new",
        ));

        assert_eq!(parsed.r#type, CommitType::Refactor);
        assert!(parsed.breaking);
        assert_eq!(
            parsed.breaking_message.as_deref(),
            Some("--old is gone\nuse --new")
        );
        assert!(parsed.body.as_deref().unwrap().starts_with("Cleanup."));
    }

    #[test]
    fn test_breaking_footer_hyphenated() {
        let parsed = parse(&make_raw("fix: x\n\nBREAKING-CHANGE: y"));
        assert!(parsed.breaking);
        assert_eq!(parsed.breaking_message.as_deref(), Some("y"));
    }

    #[test]
    fn test_non_conventional_is_other() {
        let parsed = parse(&make_raw("random commit message"));

        assert_eq!(parsed.r#type, CommitType::Other);
        assert_eq!(parsed.subject, "random commit message");
        assert!(!parsed.breaking);
    }

    #[test]
    fn test_unknown_type_is_other() {
        let parsed = parse(&make_raw("ci: tweak pipeline"));

        assert_eq!(parsed.r#type, CommitType::Other);
        assert_eq!(parsed.subject, "tweak pipeline");
        assert_eq!(parsed.title, "ci: tweak pipeline");
    }

    #[test]
    fn test_pre_released_carried_over() {
        let raw = make_raw("fix: bug").with_pre_released(true);
        assert!(parse(&raw).pre_released);
    }

    #[test]
    fn test_missing_space_after_colon() {
        let parsed = parse(&make_raw("feat:no space"));
        assert_eq!(parsed.r#type, CommitType::Other);
    }
}
