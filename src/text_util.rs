/// Return `true` if `term` starts a word somewhere in `haystack` and the
/// character after it does not satisfy `continues`.
///
/// Both inputs are expected in lower case. The character before the match
/// must not be a letter or digit.
pub fn contains_term_where<F>(haystack: &str, term: &str, continues: F) -> bool
where
    F: Fn(char) -> bool,
{
    if term.is_empty() {
        return false;
    }

    haystack.match_indices(term).any(|(start, _)| {
        let end = start + term.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric)
            && !after.is_some_and(&continues)
    })
}

/// `term` as a whole word: `ra` does not fire inside `randomized` or `ras`.
pub fn contains_term(haystack: &str, term: &str) -> bool {
    contains_term_where(haystack, term, char::is_alphanumeric)
}

/// `term` at the start of a word, any ending allowed: `tumor` fires inside
/// `tumors` but not inside `antitumor`.
pub fn contains_word_prefix(haystack: &str, term: &str) -> bool {
    contains_term_where(haystack, term, |_| false)
}

/// Truncate to at most `max` characters without splitting a code point.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
