/// Incremental matcher for one literal byte pattern.
///
/// Tracks how many leading bytes of the pattern have been seen. A mismatching
/// byte restarts the match at 1 if it equals the first pattern byte, otherwise
/// at 0. This is exact for tag literals whose first byte (`<`) does not recur
/// inside the pattern, which is all this crate uses it for.
#[derive(Debug, Clone)]
pub struct TagMatcher {
    pattern: &'static [u8],
    matched: usize,
}

impl TagMatcher {
    pub const fn new(pattern: &'static [u8]) -> Self {
        assert!(!pattern.is_empty(), "tag pattern must not be empty");
        Self {
            pattern,
            matched: 0,
        }
    }

    /// Consume one byte. Returns `true` when it completes the pattern, after
    /// which the matcher starts over.
    pub fn feed(&mut self, byte: u8) -> bool {
        if byte == self.pattern[self.matched] {
            self.matched += 1;
            if self.matched == self.pattern.len() {
                self.matched = 0;
                return true;
            }
        } else if byte == self.pattern[0] {
            self.matched = 1;
        } else {
            self.matched = 0;
        }
        false
    }

    pub fn reset(&mut self) {
        self.matched = 0;
    }

    /// Number of pattern bytes matched so far.
    pub fn progress(&self) -> usize {
        self.matched
    }

    pub fn pattern(&self) -> &'static [u8] {
        self.pattern
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_matches(pattern: &'static [u8], input: &[u8]) -> usize {
        let mut matcher = TagMatcher::new(pattern);
        input.iter().filter(|&&b| matcher.feed(b)).count()
    }

    #[test]
    fn test_fires_on_last_byte() {
        let mut matcher = TagMatcher::new(b"<item");
        for &b in b"<ite" {
            assert!(!matcher.feed(b));
        }
        assert_eq!(matcher.progress(), 4);
        assert!(matcher.feed(b'm'));
        assert_eq!(matcher.progress(), 0);
    }

    #[test]
    fn test_restarts_on_first_byte() {
        // The second '<' restarts the match instead of dropping to zero
        assert_eq!(count_matches(b"<title>", b"<<title>"), 1);
        assert_eq!(count_matches(b"<title>", b"<tit<title>"), 1);
    }

    #[test]
    fn test_mismatch_resets() {
        assert_eq!(count_matches(b"</item>", b"</iten></item"), 0);
        assert_eq!(count_matches(b"</item>", b"a</item>b</item>"), 2);
    }

    #[test]
    fn test_single_byte_pattern() {
        assert_eq!(count_matches(b"<", b"a<b<<"), 3);
    }

    #[test]
    fn test_reset_discards_progress() {
        let mut matcher = TagMatcher::new(b"<title>");
        for &b in b"<tit" {
            matcher.feed(b);
        }
        matcher.reset();
        assert!(!matcher.feed(b'l'));
        assert_eq!(matcher.progress(), 0);
    }
}
