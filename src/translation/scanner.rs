use std::ops::Range;

use super::parsers::{
    is_block_comment_end, is_block_comment_start, is_line_comment_start, is_word_byte,
    is_word_start, matches_tag, try_start_dollar_quote,
};

#[derive(Clone)]
enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum SegmentKind {
    /// Plain SQL: keywords, identifiers, operators, placeholders.
    Code,
    /// String literal, quoted identifier or dollar-quoted body, delimiters included.
    Literal,
    /// `--` or `/* */` comment, delimiters included.
    Comment,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Segment {
    pub(super) kind: SegmentKind,
    pub(super) range: Range<usize>,
}

fn close(out: &mut Vec<Segment>, kind: SegmentKind, range: Range<usize>) {
    if !range.is_empty() {
        out.push(Segment { kind, range });
    }
}

/// Split `sql` into contiguous code / literal / comment segments covering every byte.
///
/// An unterminated literal or comment runs to the end of the input.
pub(super) fn segments(sql: &str) -> Vec<Segment> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => {
                let opened = match b {
                    b'\'' => Some((State::SingleQuoted, idx + 1)),
                    b'"' => Some((State::DoubleQuoted, idx + 1)),
                    _ if is_line_comment_start(bytes, idx) => Some((State::LineComment, idx + 2)),
                    _ if is_block_comment_start(bytes, idx) => {
                        Some((State::BlockComment(1), idx + 2))
                    }
                    b'$' => try_start_dollar_quote(bytes, idx)
                        .map(|(tag, tag_end)| (State::DollarQuoted(tag), tag_end + 1)),
                    _ => None,
                };
                if let Some((next, resume)) = opened {
                    close(&mut out, SegmentKind::Code, start..idx);
                    start = idx;
                    state = next;
                    idx = resume;
                    continue;
                }
            }
            State::SingleQuoted | State::DoubleQuoted => {
                let quote = if matches!(state, State::SingleQuoted) {
                    b'\''
                } else {
                    b'"'
                };
                if b == quote {
                    if bytes.get(idx + 1) == Some(&quote) {
                        idx += 2; // escaped quote
                        continue;
                    }
                    close(&mut out, SegmentKind::Literal, start..idx + 1);
                    start = idx + 1;
                    state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    close(&mut out, SegmentKind::Comment, start..idx);
                    start = idx;
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 2;
                    continue;
                }
                if is_block_comment_end(bytes, idx) {
                    idx += 2;
                    if depth == 1 {
                        close(&mut out, SegmentKind::Comment, start..idx);
                        start = idx;
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    continue;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let end = idx + tag.len() + 2;
                    close(&mut out, SegmentKind::Literal, start..end);
                    start = end;
                    state = State::Normal;
                    idx = end;
                    continue;
                }
            }
        }
        idx += 1;
    }

    let tail = match state {
        State::Normal => SegmentKind::Code,
        State::LineComment | State::BlockComment(_) => SegmentKind::Comment,
        State::SingleQuoted | State::DoubleQuoted | State::DollarQuoted(_) => SegmentKind::Literal,
    };
    close(&mut out, tail, start..bytes.len());
    out
}

/// A bare word (keyword or unquoted identifier) found in code segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Word<'a> {
    pub(super) text: &'a str,
    pub(super) start: usize,
    pub(super) end: usize,
}

impl Word<'_> {
    pub(super) fn is(&self, keyword: &str) -> bool {
        self.text.eq_ignore_ascii_case(keyword)
    }
}

/// Words outside literals and comments, in order.
pub(super) fn words<'a>(sql: &'a str, segments: &[Segment]) -> Vec<Word<'a>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    for segment in segments.iter().filter(|s| s.kind == SegmentKind::Code) {
        let mut idx = segment.range.start;
        while idx < segment.range.end {
            let b = bytes[idx];
            if is_word_start(b) && (idx == 0 || !is_param_sigil(bytes[idx - 1])) {
                let start = idx;
                while idx < segment.range.end && is_word_byte(bytes[idx]) {
                    idx += 1;
                }
                out.push(Word {
                    text: &sql[start..idx],
                    start,
                    end: idx,
                });
            } else if is_word_byte(b) || is_param_sigil(b) {
                // digits, `$1`, `:name` and the tail of `?1` are not keywords
                idx += 1;
                while idx < segment.range.end && is_word_byte(bytes[idx]) {
                    idx += 1;
                }
            } else {
                idx += 1;
            }
        }
    }
    out
}

fn is_param_sigil(b: u8) -> bool {
    matches!(b, b'$' | b':' | b'@')
}

/// Byte offset right after the last meaningful token: trailing whitespace, `;` and
/// comments are left behind it.
pub(super) fn clause_end(sql: &str, segments: &[Segment]) -> usize {
    let bytes = sql.as_bytes();
    for segment in segments.iter().rev() {
        match segment.kind {
            SegmentKind::Comment => {}
            SegmentKind::Literal => return segment.range.end,
            SegmentKind::Code => {
                if let Some(pos) = bytes[segment.range.clone()]
                    .iter()
                    .rposition(|b| !(b.is_ascii_whitespace() || *b == b';'))
                {
                    return segment.range.start + pos + 1;
                }
            }
        }
    }
    0
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|digits| (idx, digits))
    }
}
