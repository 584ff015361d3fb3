//! CSS selectors for Amazon HTML parsing.
//!
//! This file contains all CSS selectors used for parsing Amazon pages.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When parsing fails, capture HTML sample,
//! update selectors, and add a fixture under `tests/fixtures/`.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for review listing pages (`/product-reviews/{asin}/`).
pub mod review {
    use super::*;

    /// Review container, one per customer review.
    pub static CONTAINER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='review']").unwrap());

    /// Review title (a link on the US store, a span on others).
    pub static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='review-title']").unwrap());

    /// Star label nested inside some review titles; excluded from title text.
    pub static TITLE_STAR_LABEL: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("i[data-hook='review-star-rating'], i.review-rating, span.a-letter-space")
            .unwrap()
    });

    /// Review body text.
    pub static BODY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='review-body']").unwrap());

    /// Star rating ("4.0 out of 5 stars"); international reviews use the cmps hook.
    pub static RATING: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "[data-hook='review-star-rating'], \
             [data-hook='cmps-review-star-rating']",
        )
        .unwrap()
    });

    /// Review date line.
    pub static DATE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-hook='review-date']").unwrap());

    /// "Next page" list item in the review pager.
    pub static PAGER_LAST: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("li.a-last").unwrap());

    /// Clickable link inside the pager item; the browser clicks this.
    pub const NEXT_LINK_CSS: &str = "li.a-last a";

    /// Any link, scoped to a pager item.
    pub static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
}

/// Selectors for product detail pages (`/dp/{asin}`).
pub mod product {
    use super::*;

    /// Blocks that carry description text, in reading order.
    ///
    /// `#prodDetails` wraps the `#productDetails_*` tables on some layouts;
    /// the parser keeps only the outermost match.
    pub static DESCRIPTION_BLOCKS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "#productTitle, \
             #feature-bullets, \
             #productDescription, \
             #detailBullets_feature_div, \
             #productDetails_techSpec_section_1, \
             #productDetails_detailBullets_sections1, \
             #prodDetails",
        )
        .unwrap()
    });

    pub static BODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("body").unwrap());

    /// Elements whose text never counts as description.
    pub static NON_TEXT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("script, style, noscript, template").unwrap());
}

/// Selectors for search results pages.
pub mod search {
    use super::*;

    /// Product card container - main search result item.
    pub static RESULT: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("[data-component-type='s-search-result']").unwrap());

    /// ASIN attribute on result card.
    pub static ASIN_ATTR: &str = "data-asin";

    /// Next page link.
    pub static NEXT_PAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "a.s-pagination-next, \
             .s-pagination-item.s-pagination-next",
        )
        .unwrap()
    });

    /// Disabled "next" marker on the last search page.
    pub static NEXT_PAGE_DISABLED: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(".s-pagination-next.s-pagination-disabled").unwrap());
}

/// Selectors for detecting error/captcha pages.
pub mod errors {
    use super::*;

    /// CAPTCHA form.
    pub static CAPTCHA: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form[action*='validateCaptcha'], \
             img[src*='captcha']",
        )
        .unwrap()
    });

    /// Home link that only Amazon's 503 "dogs" page carries.
    pub static DOG_PAGE_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("a[href*='ref=cs_503_link']").unwrap());

    /// Dogs-of-Amazon picture; only counts together with [`DOG_PAGE_TEXT`].
    pub static DOG_PAGE_IMAGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "img[alt*='Dogs of Amazon'], \
             img[alt*='dogs of Amazon'], \
             img[alt*='dogs of amazon']",
        )
        .unwrap()
    });

    /// Apology headline on the 503 page.
    pub const DOG_PAGE_TEXT: &str = "Sorry! Something went wrong";
}
