//! HTML parser for Amazon review listings, product pages and search results.

use crate::amazon::models::{Asin, ProductInfo, Review};
use crate::amazon::selectors::{errors, product, review, search};
use crate::error::{Error, Result};
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, trace};

/// Parser for Amazon HTML pages.
#[derive(Debug, Default, Clone, Copy)]
pub struct Parser;

impl Parser {
    pub fn new() -> Self {
        Self
    }

    /// Extracts every review on a listing page, in document order.
    ///
    /// Each field is located independently; a missing element leaves that
    /// field `None` and never drops the review.
    pub fn parse_reviews(&self, html: &str) -> Vec<Review> {
        let document = Html::parse_document(html);

        let reviews: Vec<Review> =
            document.select(&review::CONTAINER).map(|c| self.parse_review(c)).collect();

        debug!("Parsed {} reviews from page", reviews.len());
        reviews
    }

    fn parse_review(&self, container: ElementRef) -> Review {
        let review = Review {
            title: container.select(&review::TITLE).next().and_then(title_text),
            body: first_text(container, &review::BODY),
            rating: first_text(container, &review::RATING),
            date: first_text(container, &review::DATE),
        };

        if review.missing_fields() > 0 {
            trace!(
                "Review {:?} is missing {} field(s)",
                container.value().id(),
                review.missing_fields()
            );
        }
        review
    }

    /// Whether the review pager offers another page.
    ///
    /// Absence of the pager is the normal end of a listing, not an error.
    pub fn has_next_page(&self, html: &str) -> bool {
        let document = Html::parse_document(html);

        document.select(&review::PAGER_LAST).any(|item| {
            let disabled = item.value().classes().any(|c| c == "a-disabled");
            !disabled && item.select(&review::LINK).next().is_some()
        })
    }

    /// Extracts description text from a product detail page.
    pub fn parse_product_info(&self, html: &str, url: &str) -> Result<ProductInfo> {
        let document = Html::parse_document(html);
        self.check_for_errors(&document)?;

        let matched: Vec<ElementRef> = document.select(&product::DESCRIPTION_BLOCKS).collect();
        let ids: Vec<_> = matched.iter().map(|e| e.id()).collect();

        let blocks: Vec<String> = matched
            .into_iter()
            .filter(|e| !e.ancestors().any(|a| ids.contains(&a.id())))
            .map(visible_text)
            .filter(|t| !t.is_empty())
            .collect();

        let text = if blocks.is_empty() {
            debug!("No description blocks found on {}, falling back to body text", url);
            document.select(&product::BODY).next().map(visible_text).unwrap_or_default()
        } else {
            blocks.join("\n")
        };

        Ok(ProductInfo { url: url.to_string(), text })
    }

    /// Extracts ASINs from a search results page, plus whether a next page exists.
    pub fn parse_search_asins(&self, html: &str) -> Result<(Vec<Asin>, bool)> {
        let document = Html::parse_document(html);
        self.check_for_errors(&document)?;

        let asins: Vec<Asin> = document
            .select(&search::RESULT)
            .filter_map(|card| card.value().attr(search::ASIN_ATTR))
            .filter_map(|raw| match Asin::parse(raw) {
                Ok(asin) => Some(asin),
                Err(_) => {
                    // Ad placeholders carry an empty data-asin
                    trace!("Skipping result card with ASIN '{}'", raw);
                    None
                }
            })
            .collect();

        let has_more = document.select(&search::NEXT_PAGE).next().is_some()
            && document.select(&search::NEXT_PAGE_DISABLED).next().is_none();

        Ok((asins, has_more))
    }

    /// Rejects CAPTCHA and error pages so they are never parsed as empty results.
    pub fn check_page(&self, html: &str) -> Result<()> {
        self.check_for_errors(&Html::parse_document(html))
    }

    /// Checks for CAPTCHA, error pages, or rate limiting.
    fn check_for_errors(&self, document: &Html) -> Result<()> {
        if document.select(&errors::CAPTCHA).next().is_some() {
            return Err(Error::Blocked(
                "CAPTCHA detected. Amazon is blocking requests. \
                Try using a proxy or waiting before retrying."
                    .to_string(),
            ));
        }

        if is_dog_page(document) {
            return Err(Error::Blocked(
                "Amazon error page detected (503). \
                The service may be temporarily unavailable."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Amazon's 503 page: its home link, or the dogs picture with the apology text.
///
/// An alt text that merely mentions dogs is a product photo, not an error.
fn is_dog_page(document: &Html) -> bool {
    if document.select(&errors::DOG_PAGE_LINK).next().is_some() {
        return true;
    }

    document.select(&errors::DOG_PAGE_IMAGE).next().is_some()
        && document.root_element().text().any(|t| t.contains(errors::DOG_PAGE_TEXT))
}

/// Trimmed text of the first match, `None` if absent or empty.
fn first_text(container: ElementRef, selector: &Selector) -> Option<String> {
    container.select(selector).next().map(visible_text).filter(|t| !t.is_empty())
}

/// Review title text without the star label some storefronts nest inside it.
fn title_text(title: ElementRef) -> Option<String> {
    let skipped: Vec<_> = title.select(&review::TITLE_STAR_LABEL).map(|e| e.id()).collect();

    let text = title
        .descendants()
        .filter(|node| !node.ancestors().any(|a| skipped.contains(&a.id())))
        .filter_map(|node| node.value().as_text().map(|t| (**t).to_string()))
        .collect::<String>();

    let text = collapse_whitespace(&text);
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Text of an element minus script/style content, whitespace collapsed.
fn visible_text(element: ElementRef) -> String {
    let skipped: Vec<_> = element.select(&product::NON_TEXT).map(|e| e.id()).collect();

    let text = element
        .descendants()
        .filter(|node| !node.ancestors().any(|a| skipped.contains(&a.id())))
        .filter_map(|node| node.value().as_text().map(|t| (**t).to_string()))
        .collect::<Vec<_>>()
        .join(" ");

    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
