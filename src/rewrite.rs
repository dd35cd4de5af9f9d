//! Pattern-driven buffer rewriting.
//!
//! [`rewrite`] drives a [`CaptureScanner`](crate::scanner::CaptureScanner)
//! over a buffer and rebuilds it: bytes between matches are copied through
//! untouched, and each matched span is replaced by whatever the transform
//! writes into the output sink.
//!
//! ```text
//! buffer:  "see [[a]] and [[b]]"
//!           ^^^^       ^^^^^            copied
//!               ^^^^^       ^^^^^       transform(buffer, match, out)
//! ```
//!
//! The output depends only on the pattern, the buffer and the transform.

use crate::scanner::{self, Match, MatchError};
use regex::bytes::Regex;

/// Rewrite every match of `pattern` in `buffer` with the bytes `transform`
/// writes for it.
///
/// The transform receives the whole original buffer, so it can look at
/// context around the match, plus the match with absolute offsets.
pub fn rewrite<F, E>(pattern: &Regex, buffer: &[u8], mut transform: F) -> Result<Vec<u8>, E>
where
    F: FnMut(&[u8], &Match, &mut Vec<u8>) -> Result<(), E>,
    E: From<MatchError>,
{
    let mut out = Vec::with_capacity(buffer.len());
    let mut last_end: Option<usize> = None;

    for m in scanner::scan(pattern, buffer) {
        let m = m?;
        let from = last_end.unwrap_or(0);
        out.extend_from_slice(&buffer[from..m.start()]);
        transform(buffer, &m, &mut out)?;
        last_end = Some(m.end());
    }

    out.extend_from_slice(&buffer[last_end.unwrap_or(0)..]);
    Ok(out)
}

/// Transform that writes back exactly the matched span.
pub fn keep_match(buffer: &[u8], m: &Match, out: &mut Vec<u8>) -> Result<(), MatchError> {
    out.extend_from_slice(&buffer[m.start()..m.end()]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn upper(pattern: &str, input: &str) -> String {
        let re = Regex::new(pattern).unwrap();
        let out = rewrite(&re, input.as_bytes(), |buf, m, out| {
            out.extend(buf[m.start()..m.end()].to_ascii_uppercase());
            Ok::<(), MatchError>(())
        })
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn never_matching_pattern_is_identity() {
        for input in ["", "plain", "multi\nline\ntext", "[[unclosed"] {
            assert_eq!(upper("zzz+q", input), input);
        }
    }

    #[test]
    fn identity_transform_is_identity() {
        let inputs = ["", "abc", "aaa bbb aaa", "[[x]] and [[y|z]]"];
        let patterns = [r"a+", r"\[\[([^\]]+)\]\]", r"x*", r"\w+"];
        for pattern in patterns {
            let re = Regex::new(pattern).unwrap();
            for input in inputs {
                let out = rewrite(&re, input.as_bytes(), keep_match).unwrap();
                assert_eq!(out, input.as_bytes(), "pattern {pattern:?} on {input:?}");
            }
        }
    }

    #[test]
    fn replaces_each_match() {
        assert_eq!(upper("b+", "abbcabd"), "aBBcaBd");
    }

    #[test]
    fn match_at_start_and_end() {
        assert_eq!(upper("x", "xax"), "XaX");
    }

    #[test]
    fn transform_can_drop_match() {
        let re = Regex::new(r"<!--.*?-->").unwrap();
        let out = rewrite(&re, b"a<!-- c -->b", |_, _, _| Ok::<(), MatchError>(())).unwrap();
        assert_eq!(out, b"ab");
    }

    #[test]
    fn transform_sees_capture_groups() {
        let re = Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap();
        let out = rewrite(&re, b"[[a]] [[b|label]]", |buf, m, out| {
            let text = m.bytes(buf, 2).or(m.bytes(buf, 1)).unwrap_or_default();
            out.push(b'<');
            out.extend_from_slice(text);
            out.push(b'>');
            Ok::<(), MatchError>(())
        })
        .unwrap();
        assert_eq!(out, b"<a> <label>");
    }

    #[derive(Debug, PartialEq)]
    enum TestError {
        Match(MatchError),
        Boom,
    }

    impl From<MatchError> for TestError {
        fn from(e: MatchError) -> Self {
            TestError::Match(e)
        }
    }

    #[test]
    fn transform_error_aborts() {
        let re = Regex::new("b").unwrap();
        let result = rewrite(&re, b"abc", |_, _, _| Err(TestError::Boom));
        assert_eq!(result, Err(TestError::Boom));
    }

    #[test]
    fn no_state_between_calls() {
        assert_eq!(upper("a", "aXa"), upper("a", "aXa"));
    }
}
