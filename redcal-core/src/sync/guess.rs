use std::sync::LazyLock;

use regex::Regex;

static ISSUE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#?(?P<issue>\d+)").expect("issue number pattern is valid"));

/// Issue number at the very start of a subject, with or without a leading `#`.
pub fn guess_issue_id(subject: &str) -> Option<i64> {
    let captures = ISSUE_NUMBER.captures(subject)?;
    captures["issue"].parse().ok()
}
