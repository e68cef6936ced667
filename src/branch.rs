//! Branch names derived from the committer and the commit message.

/// Alphanumeric characters of the message that make it into the slug
const SLUG_ALNUM_LIMIT: usize = 20;

/// Build `<user>/<slug>` for a pull request branch.
///
/// Returns `None` if either part would be empty.
///
/// ```
/// use git_partial_pr::branch::branch_name;
///
/// assert_eq!(
///     branch_name("Alice", "Fix: the Bug!! In Parser").as_deref(),
///     Some("alice/fix-the-bug-in-parser")
/// );
/// assert_eq!(branch_name("alice", "!!!"), None);
/// ```
pub fn branch_name(username: &str, message: &str) -> Option<String> {
    let user = slugify(username, usize::MAX);
    let slug = slugify(message, SLUG_ALNUM_LIMIT);
    if user.is_empty() || slug.is_empty() {
        return None;
    }
    Some(format!("{user}/{slug}"))
}

/// Lowercase `input`, collapse every run of non-alphanumeric characters into a
/// single `-`, and stop after `limit` alphanumeric characters. The result never
/// starts or ends with `-`.
pub fn slugify(input: &str, limit: usize) -> String {
    let mut slug = String::new();
    let mut taken = 0;
    let mut pending_hyphen = false;

    for c in input.chars() {
        if taken == limit {
            break;
        }
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
            taken += 1;
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    #[test]
    fn collapses_punctuation_runs() {
        assert_eq!(slugify("Fix: the Bug!! In Parser", 20), "fix-the-bug-in-parser");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(slugify("  -- hello world --  ", 20), "hello-world");
    }

    #[test]
    fn stops_after_limit_alphanumerics() {
        assert_eq!(
            slugify("Add support for reading config files", 20),
            "add-support-for-reading"
        );
        assert_eq!(slugify("Refactor configuration loading", 20), "refactor-configuratio");
    }

    #[test]
    fn no_trailing_hyphen_at_limit_boundary() {
        assert_eq!(slugify("abcde fghij", 5), "abcde");
    }

    #[test]
    fn non_ascii_is_a_separator() {
        assert_eq!(slugify("café über", 20), "caf-ber");
    }

    #[test]
    fn branch_name_from_user_and_message() {
        assert_eq!(
            branch_name("Alice", "Fix: the Bug!! In Parser").as_deref(),
            Some("alice/fix-the-bug-in-parser")
        );
    }

    #[test]
    fn username_is_slugged_without_limit() {
        assert_eq!(
            branch_name("Jane Q. Developer-Smith", "wip").as_deref(),
            Some("jane-q-developer-smith/wip")
        );
    }

    #[test]
    fn empty_parts_yield_none() {
        assert_eq!(branch_name("", "Fix parser"), None);
        assert_eq!(branch_name("alice", "   "), None);
        assert_eq!(branch_name("alice", "?!"), None);
    }
}
