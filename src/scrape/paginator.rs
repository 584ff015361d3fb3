//! Review pager handling, both on raw HTML and in a live browser tab.

use crate::amazon::selectors::review;
use crate::amazon::Parser;
use crate::browser::BrowserSession;
use crate::error::Result;
use tracing::debug;

/// Whether the listing in `html` links to another page.
pub fn has_next(html: &str) -> bool {
    Parser::new().has_next_page(html)
}

/// Clicks the "Next page" control and waits for the navigation.
///
/// A missing control ends the listing and is reported as `Ok(false)`.
pub async fn advance(session: &mut dyn BrowserSession) -> Result<bool> {
    let clicked = session.click(review::NEXT_LINK_CSS).await?;
    if !clicked {
        debug!("No next-page control, listing finished");
    }
    Ok(clicked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::fake::{Calls, FakeLauncher};
    use crate::browser::BrowserLauncher;

    #[test]
    fn test_has_next() {
        assert!(has_next(r#"<ul class="a-pagination"><li class="a-last"><a href="?pageNumber=2">Next page</a></li></ul>"#));
        assert!(!has_next(r#"<ul class="a-pagination"><li class="a-disabled a-last">Next page</li></ul>"#));
        assert!(!has_next("<html><body>no pager</body></html>"));
    }

    #[tokio::test]
    async fn test_advance_until_control_missing() {
        let launcher = FakeLauncher::new(vec!["one".to_string(), "two".to_string()]);
        let mut session = launcher.launch().await.unwrap();

        assert!(advance(session.as_mut()).await.unwrap());
        assert_eq!(session.content().await.unwrap(), "two");
        assert!(!advance(session.as_mut()).await.unwrap());
        assert_eq!(Calls::get(&launcher.calls.clicks), 2);
    }
}
