use ghdb::Issue;

/// Case-insensitive substring match against the title followed directly by
/// the body. A missing body counts as empty.
pub(crate) fn matches(issue: &Issue, term: &str) -> bool {
    let haystack = format!("{}{}", issue.title, issue.body.as_deref().unwrap_or(""));
    haystack.to_lowercase().contains(&term.to_lowercase())
}

/// Keeps matching issues in their original order.
pub(crate) fn filter_issues(issues: Vec<Issue>, term: &str) -> Vec<Issue> {
    issues.into_iter().filter(|i| matches(i, term)).collect()
}
