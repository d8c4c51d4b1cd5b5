pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Recognize `$tag$` at `start`; returns the tag and the index of its closing `$`.
/// `$1` and friends are positional parameters, never tags.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    if bytes.get(start + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let mut idx = start + 1;
    while idx < bytes.len() && bytes[idx] != b'$' {
        let b = bytes[idx];
        if !(b.is_ascii_alphanumeric() || b == b'_') {
            return None;
        }
        idx += 1;
    }

    if idx < bytes.len() && bytes[idx] == b'$' {
        let tag = String::from_utf8(bytes[start + 1..idx].to_vec()).ok()?;
        Some((tag, idx))
    } else {
        None
    }
}

pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    let end = idx + 1 + tag.len();
    end < bytes.len()
        && bytes[idx + 1..=end].starts_with(tag.as_bytes())
        && bytes.get(end) == Some(&b'$')
}

pub(super) fn is_word_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

pub(super) fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_quote_tags() {
        assert_eq!(
            try_start_dollar_quote(b"$fn$ body $fn$", 0),
            Some(("fn".to_string(), 3))
        );
        assert_eq!(try_start_dollar_quote(b"$$ body $$", 0), Some((String::new(), 1)));
        assert_eq!(try_start_dollar_quote(b"$1 + $2", 0), None);
        assert_eq!(try_start_dollar_quote(b"$a b$", 0), None);
    }

    #[test]
    fn closing_tag_must_match() {
        let sql = b"$q$ x $r$ y $q$";
        assert!(!matches_tag(sql, 6, "q"));
        assert!(matches_tag(sql, 12, "q"));
    }
}
