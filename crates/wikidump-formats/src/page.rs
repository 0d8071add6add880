//! Page records and redirect stub detection

use crate::error::{FormatError, FormatResult};
use serde::{Deserialize, Serialize};

/// Redirect stubs are shorter than this many characters
pub const DEFAULT_REDIRECT_MAX_LEN: usize = 256;

/// Lowercase token marking a redirect stub
pub const DEFAULT_REDIRECT_MARKER: &str = "#redirect";

const LINK_OPEN: &str = "[[";
const LINK_CLOSE: &str = "]]";

/// Compact page extracted from the XML dump
///
/// `text` is the raw wikitext between the `<text>` tags. XML entities are
/// left as they appear in the dump.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Page {
    /// Page id
    pub id: u64,
    /// Page title
    pub title: String,
    /// Raw wikitext
    pub text: String,
}

impl Page {
    /// Create new page
    pub fn new(id: u64, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            text: text.into(),
        }
    }

    /// Whether the page is a redirect stub under the default rule
    pub fn is_redirect(&self) -> bool {
        RedirectRule::default().is_redirect(self)
    }

    /// Title the redirect stub points at, under the default rule
    pub fn redirect_target(&self) -> FormatResult<&str> {
        RedirectRule::default().target(self)
    }
}

/// Heuristic deciding which pages are redirect stubs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RedirectRule {
    /// Pages with at least this many characters are never redirects
    pub max_len: usize,
    /// Marker searched in the text, ignoring case
    pub marker: String,
}

impl Default for RedirectRule {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_REDIRECT_MAX_LEN,
            marker: DEFAULT_REDIRECT_MARKER.to_string(),
        }
    }
}

impl RedirectRule {
    /// Create a rule with a custom length limit and marker
    pub fn new(max_len: usize, marker: impl Into<String>) -> Self {
        Self {
            max_len,
            marker: marker.into().to_lowercase(),
        }
    }

    /// Whether `page` is a redirect stub
    ///
    /// The marker is compared case-insensitively however the rule was built.
    /// An empty marker never matches.
    pub fn is_redirect(&self, page: &Page) -> bool {
        if self.marker.is_empty() || page.text.chars().count() >= self.max_len {
            return false;
        }
        page.text
            .to_lowercase()
            .contains(self.marker.to_lowercase().as_str())
    }

    /// Extract the target title from a redirect stub
    ///
    /// The target is the text between the first `[[` and the next `]]`.
    pub fn target<'a>(&self, page: &'a Page) -> FormatResult<&'a str> {
        if !self.is_redirect(page) {
            return Err(not_a_redirect(page));
        }

        let start = page
            .text
            .find(LINK_OPEN)
            .map(|pos| pos + LINK_OPEN.len())
            .ok_or_else(|| not_a_redirect(page))?;
        let len = page.text[start..]
            .find(LINK_CLOSE)
            .ok_or_else(|| not_a_redirect(page))?;

        Ok(&page.text[start..start + len])
    }
}

fn not_a_redirect(page: &Page) -> FormatError {
    FormatError::NotARedirect {
        title: page.title.clone(),
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_detection() {
        let stub = Page::new(2, "Kitty", "#REDIRECT [[Cat]]");
        assert!(stub.is_redirect());
        assert_eq!(stub.redirect_target().expect("Test operation should succeed"), "Cat");

        let article = Page::new(1, "Cat", "The '''cat''' is a [[mammal]].");
        assert!(!article.is_redirect());
    }

    #[test]
    fn test_redirect_marker_case_insensitive() {
        let stub = Page::new(3, "Doggo", "#Redirect [[Dog]] {{R from slang}}");
        assert!(stub.is_redirect());
        assert_eq!(stub.redirect_target().unwrap(), "Dog");
    }

    #[test]
    fn test_long_text_is_never_redirect() {
        let rule = RedirectRule::default();
        let mut text = String::from("#REDIRECT [[Dog]]");
        text.push_str(&"x".repeat(rule.max_len - text.len()));
        assert_eq!(text.chars().count(), rule.max_len);

        let page = Page::new(4, "Long", text);
        assert!(!rule.is_redirect(&page));
        assert!(matches!(
            rule.target(&page),
            Err(FormatError::NotARedirect { .. })
        ));

        let mut shorter = page.clone();
        shorter.text.pop();
        assert!(rule.is_redirect(&shorter));
    }

    #[test]
    fn test_target_fails_for_regular_page() {
        let page = Page::new(5, "Cat", "Cats purr.");
        match page.redirect_target() {
            Err(FormatError::NotARedirect { title }) => assert_eq!(title, "Cat"),
            other => unreachable!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_target_requires_link() {
        let page = Page::new(6, "Broken", "#REDIRECT Dog");
        assert!(page.is_redirect());
        assert!(matches!(
            page.redirect_target(),
            Err(FormatError::NotARedirect { .. })
        ));
    }

    #[test]
    fn test_custom_marker() {
        let rule = RedirectRule::new(64, "#ПЕРЕНАПРАВЛЕНИЕ");
        let page = Page::new(7, "Кошка", "#перенаправление [[Кот]]");
        assert!(rule.is_redirect(&page));
        assert_eq!(rule.target(&page).unwrap(), "Кот");
        assert!(!page.is_redirect());
    }

    #[test]
    fn test_marker_case_ignored_without_constructor() {
        let rule = RedirectRule {
            max_len: 64,
            marker: "#REDIRECT".to_string(),
        };
        let stub = Page::new(8, "Kitty", "#redirect [[Cat]]");
        assert!(rule.is_redirect(&stub));
        assert_eq!(rule.target(&stub).unwrap(), "Cat");

        let deserialized: RedirectRule =
            serde_json::from_str(r##"{"marker": "#ReDiReCt"}"##).unwrap();
        assert!(deserialized.is_redirect(&Page::new(9, "Puppy", "#REDIRECT [[Dog]]")));
    }

    #[test]
    fn test_empty_marker_matches_nothing() {
        let rule = RedirectRule {
            max_len: 256,
            marker: String::new(),
        };
        assert!(!rule.is_redirect(&Page::new(10, "Cat", "Cats purr.")));
    }
}
