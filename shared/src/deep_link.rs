//! Deep links: a 1-based item index in the URL fragment, kept in sync with
//! the scroll position in both directions.

use url::{form_urlencoded, Url};

use crate::{FRAGMENT_INDEX_KEYS, MAX_LINKED_ITEM};

/// Parses a location fragment into a zero-based item index.
///
/// Accepts `"37"`, `"#37"`, `"i=37"`, `"#item=37&sort=new"` and full URLs
/// whose fragment has one of those shapes. Anything else, including `"0"`
/// and indices above [`MAX_LINKED_ITEM`], is `None`.
pub fn parse_fragment(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    let fragment = if raw.contains("://") {
        Url::parse(raw).ok()?.fragment()?.to_owned()
    } else {
        raw.to_owned()
    };
    let fragment = fragment.trim_start_matches('#').trim();

    let value = if fragment.contains('=') {
        form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| FRAGMENT_INDEX_KEYS.contains(&&**key))
            .map(|(_, value)| value.into_owned())?
    } else {
        fragment.to_owned()
    };

    let item = value.trim().parse::<usize>().ok()?;
    if item > MAX_LINKED_ITEM {
        return None;
    }
    item.checked_sub(1)
}

/// Fragment for a zero-based item index.
pub fn format_fragment(index: usize) -> String {
    (index + 1).to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeepLinkState {
    scroll_pending: bool,
    target: usize,
    /// Index of the fragment this engine last wrote or navigated to.
    last_fragment: Option<usize>,
}

impl DeepLinkState {
    /// True from the start of a fragment-driven navigation until the target
    /// has been scrolled into view. Scroll events in that window must not
    /// overwrite the target.
    pub fn is_scroll_pending(&self) -> bool {
        self.scroll_pending
    }

    pub fn pending_target(&self) -> Option<usize> {
        self.scroll_pending.then_some(self.target)
    }

    /// A fragment change that matches what we last wrote is the echo of our
    /// own write, not a navigation.
    pub fn is_echo(&self, raw: &str) -> bool {
        self.last_fragment.is_some() && self.last_fragment == parse_fragment(raw)
    }

    /// Starts a fragment-driven navigation. Returns the target item index.
    pub fn navigate(&mut self, raw: &str) -> usize {
        let target = parse_fragment(raw).unwrap_or(0);
        self.last_fragment = Some(target);
        self.begin_scroll(target);
        target
    }

    pub fn begin_scroll(&mut self, index: usize) {
        self.scroll_pending = true;
        self.target = index;
    }

    /// Clears the pending flag if `index` is the current target. Returns
    /// whether it was.
    pub fn finish_scroll(&mut self, index: usize) -> bool {
        if self.pending_target() == Some(index) {
            self.scroll_pending = false;
            true
        } else {
            false
        }
    }

    /// Drops a pending scroll whose target can never render, e.g. an index
    /// past the end of the result set.
    pub fn abandon_scroll(&mut self) -> Option<usize> {
        let target = self.pending_target()?;
        self.scroll_pending = false;
        Some(target)
    }

    /// Fragment to write after a user scroll settled on `index`, or `None`
    /// when nothing should be written.
    pub fn fragment_for_scroll(&mut self, index: usize) -> Option<String> {
        if self.scroll_pending || self.last_fragment == Some(index) {
            return None;
        }
        self.last_fragment = Some(index);
        Some(format_fragment(index))
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_hashed_indices() {
        assert_eq!(parse_fragment("37"), Some(36));
        assert_eq!(parse_fragment("#37"), Some(36));
        assert_eq!(parse_fragment("  #1 "), Some(0));
    }

    #[test]
    fn parses_keyed_fragments() {
        assert_eq!(parse_fragment("i=5"), Some(4));
        assert_eq!(parse_fragment("#sort=new&item=12"), Some(11));
        assert_eq!(parse_fragment("#sort=new"), None);
    }

    #[test]
    fn parses_full_urls() {
        assert_eq!(
            parse_fragment("https://maps.example.com/search?q=parks#21"),
            Some(20)
        );
        assert_eq!(parse_fragment("https://maps.example.com/search"), None);
    }

    #[test]
    fn rejects_zero_and_garbage() {
        assert_eq!(parse_fragment(""), None);
        assert_eq!(parse_fragment("0"), None);
        assert_eq!(parse_fragment("-3"), None);
        assert_eq!(parse_fragment("top"), None);
    }

    #[test]
    fn rejects_absurd_indices() {
        assert_eq!(parse_fragment("1000000"), Some(999_999));
        assert_eq!(parse_fragment("1000001"), None);
        assert_eq!(parse_fragment("18446744073709551615"), None);
    }

    #[test]
    fn navigation_marks_scroll_pending() {
        let mut state = DeepLinkState::default();
        assert_eq!(state.navigate("37"), 36);
        assert_eq!(state.pending_target(), Some(36));
        assert!(!state.finish_scroll(10));
        assert!(state.finish_scroll(36));
        assert!(!state.is_scroll_pending());
    }

    #[test]
    fn abandoned_scroll_allows_fragment_writes() {
        let mut state = DeepLinkState::default();
        state.navigate("900");
        assert_eq!(state.abandon_scroll(), Some(899));
        assert_eq!(state.abandon_scroll(), None);
        assert_eq!(state.fragment_for_scroll(24), Some("25".into()));
    }

    #[test]
    fn missing_fragment_targets_first_item() {
        let mut state = DeepLinkState::default();
        assert_eq!(state.navigate(""), 0);
    }

    #[test]
    fn no_fragment_writes_while_pending() {
        let mut state = DeepLinkState::default();
        state.navigate("40");
        assert_eq!(state.fragment_for_scroll(2), None);
        state.finish_scroll(39);
        assert_eq!(state.fragment_for_scroll(2), Some("3".into()));
        assert_eq!(state.fragment_for_scroll(2), None);
    }

    #[test]
    fn own_writes_are_echoes() {
        let mut state = DeepLinkState::default();
        assert!(!state.is_echo("5"));
        state.fragment_for_scroll(4);
        assert!(state.is_echo("5"));
        assert!(state.is_echo("#5"));
        assert!(!state.is_echo("6"));
    }
}
