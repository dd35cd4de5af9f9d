//! Iterative regex match driver with absolute offsets.
//!
//! [`CaptureScanner`] runs one match attempt at a time against the unread
//! tail of a buffer and reports every capture group relative to the start of
//! the *whole* buffer. Every rewrite pass is built on it, so an off-by-one
//! here corrupts every page silently; the arithmetic lives in one place.
//!
//! ## Progress rule
//!
//! After a match the cursor moves to the end of group 0. Matches therefore
//! never overlap and no span is visited twice in one scan. An empty match
//! moves the cursor one byte past its end, otherwise the next attempt would
//! find the same empty span again.

use regex::bytes::{CaptureLocations, Regex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("pattern produced a match without a whole-match group (group 0)")]
    MissingWholeMatch,
}

/// Byte span `(start, end)` in the scanned buffer.
pub type Span = (usize, usize);

/// One match with every declared capture group, in absolute offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    groups: Vec<Option<Span>>,
}

impl Match {
    /// Build a match from raw group spans. Group 0 must be present.
    pub fn from_groups(groups: Vec<Option<Span>>) -> Result<Self, MatchError> {
        match groups.first() {
            Some(Some(_)) => Ok(Self { groups }),
            _ => Err(MatchError::MissingWholeMatch),
        }
    }

    /// Span of the whole match.
    pub fn span(&self) -> Span {
        // from_groups guarantees group 0
        self.groups[0].unwrap_or_default()
    }

    pub fn start(&self) -> usize {
        self.span().0
    }

    pub fn end(&self) -> usize {
        self.span().1
    }

    pub fn is_empty(&self) -> bool {
        self.start() == self.end()
    }

    /// Number of declared groups, including group 0.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Span of group `i`, or `None` if it did not participate.
    pub fn group(&self, i: usize) -> Option<Span> {
        self.groups.get(i).copied().flatten()
    }

    /// Bytes of group `i` within `buffer`.
    pub fn bytes<'b>(&self, buffer: &'b [u8], i: usize) -> Option<&'b [u8]> {
        self.group(i).map(|(s, e)| &buffer[s..e])
    }

    /// Group `i` as UTF-8 text. `None` if absent or not valid UTF-8.
    pub fn text<'b>(&self, buffer: &'b [u8], i: usize) -> Option<&'b str> {
        self.bytes(buffer, i)
            .and_then(|b| std::str::from_utf8(b).ok())
    }
}

/// Lazy, non-restartable sequence of matches of `pattern` over `buffer`.
pub struct CaptureScanner<'r, 'b> {
    pattern: &'r Regex,
    buffer: &'b [u8],
    locations: CaptureLocations,
    offset: usize,
    finished: bool,
}

impl<'r, 'b> CaptureScanner<'r, 'b> {
    pub fn new(pattern: &'r Regex, buffer: &'b [u8]) -> Self {
        Self {
            pattern,
            buffer,
            locations: pattern.capture_locations(),
            offset: 0,
            finished: false,
        }
    }
}

/// Start a fresh scan.
pub fn scan<'r, 'b>(pattern: &'r Regex, buffer: &'b [u8]) -> CaptureScanner<'r, 'b> {
    CaptureScanner::new(pattern, buffer)
}

impl Iterator for CaptureScanner<'_, '_> {
    type Item = Result<Match, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.offset > self.buffer.len() {
            return None;
        }

        let tail = &self.buffer[self.offset..];
        if self.pattern.captures_read(&mut self.locations, tail).is_none() {
            self.finished = true;
            return None;
        }

        let offset = self.offset;
        let groups = (0..self.locations.len())
            .map(|i| self.locations.get(i).map(|(s, e)| (s + offset, e + offset)))
            .collect();

        match Match::from_groups(groups) {
            Ok(m) => {
                self.offset = if m.is_empty() { m.end() + 1 } else { m.end() };
                Some(Ok(m))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
