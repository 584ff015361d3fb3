//! Output formatting for reviews and analysis results (table, JSON, markdown, CSV).

use crate::amazon::models::{sentinel, Asin, Review};
use crate::config::OutputFormat;
use serde::Serialize;

/// One line of an analysis report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRow {
    pub asin: Asin,
    pub state: RowState,
    /// `None` until analyzed (or when a legacy marker stored `null`).
    pub made_in_china: Option<bool>,
    /// Reviews scraped in this run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowState {
    /// Classified in this run.
    Analyzed,
    /// Classified by an earlier run.
    Cached,
    /// Never classified.
    Pending,
    Failed,
}

impl RowState {
    fn label(&self) -> &'static str {
        match self {
            RowState::Analyzed => "analyzed",
            RowState::Cached => "cached",
            RowState::Pending => "pending",
            RowState::Failed => "failed",
        }
    }
}

impl StatusRow {
    pub fn analyzed(asin: Asin, made_in_china: bool, reviews: usize) -> Self {
        Self {
            asin,
            state: RowState::Analyzed,
            made_in_china: Some(made_in_china),
            reviews: Some(reviews),
            error: None,
        }
    }

    pub fn cached(asin: Asin, made_in_china: Option<bool>) -> Self {
        Self { asin, state: RowState::Cached, made_in_china, reviews: None, error: None }
    }

    pub fn pending(asin: Asin) -> Self {
        Self { asin, state: RowState::Pending, made_in_china: None, reviews: None, error: None }
    }

    pub fn failed(asin: Asin, error: impl Into<String>) -> Self {
        Self {
            asin,
            state: RowState::Failed,
            made_in_china: None,
            reviews: None,
            error: Some(error.into()),
        }
    }

    fn verdict(&self) -> &'static str {
        match (self.state, self.made_in_china) {
            (RowState::Pending | RowState::Failed, _) => "-",
            (_, Some(true)) => "yes",
            // Legacy null markers read as "not made in China"
            (_, Some(false) | None) => "no",
        }
    }
}

/// Formats reviews and report rows for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the reviews scraped for one product.
    pub fn format_reviews(&self, asin: &Asin, reviews: &[Review]) -> String {
        if reviews.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::reviews_csv_header().to_string(),
                _ => format!("No reviews found for {}.", asin),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(reviews).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_reviews(asin, reviews),
            OutputFormat::Markdown => self.markdown_reviews(asin, reviews),
            OutputFormat::Csv => self.csv_reviews(reviews),
        }
    }

    /// Formats an analysis report.
    pub fn format_statuses(&self, rows: &[StatusRow]) -> String {
        if rows.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => Self::statuses_csv_header().to_string(),
                _ => "No products to report.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
            }
            OutputFormat::Table => self.table_statuses(rows),
            OutputFormat::Markdown => self.markdown_statuses(rows),
            OutputFormat::Csv => self.csv_statuses(rows),
        }
    }

    // Table formatting

    fn table_reviews(&self, asin: &Asin, reviews: &[Review]) -> String {
        let rating_width = 20;
        let date_width = 48;

        let mut lines = Vec::new();

        lines.push(format!("Reviews for {}", asin));
        lines.push(String::new());
        lines.push(format!(
            "{:>3}  {:<rating_width$}  {:<date_width$}  {}",
            "#", "Rating", "Date", "Title"
        ));
        lines.push(format!("{:-<3}  {:-<rating_width$}  {:-<date_width$}  {:-<40}", "", "", "", ""));

        for (i, review) in reviews.iter().enumerate() {
            lines.push(format!(
                "{:>3}  {:<rating_width$}  {:<date_width$}  {}",
                i + 1,
                truncate(review.rating.as_deref().unwrap_or("N/A"), rating_width),
                truncate(review.date.as_deref().unwrap_or("N/A"), date_width),
                truncate(review.title.as_deref().unwrap_or("N/A"), 60)
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} reviews", reviews.len()));

        lines.join("\n")
    }

    fn table_statuses(&self, rows: &[StatusRow]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("{:<10}  {:<8}  {:<13}  {:>7}  {}", "ASIN", "Status", "Made in China", "Reviews", "Note"));
        lines.push(format!("{:-<10}  {:-<8}  {:-<13}  {:->7}  {:-<20}", "", "", "", "", ""));

        for row in rows {
            let reviews = row.reviews.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
            lines.push(format!(
                "{:<10}  {:<8}  {:<13}  {:>7}  {}",
                row.asin,
                row.state.label(),
                row.verdict(),
                reviews,
                row.error.as_deref().unwrap_or("")
            ));
        }

        let flagged = rows.iter().filter(|r| r.made_in_china == Some(true)).count();
        lines.push(String::new());
        lines.push(format!("Total: {} products, {} made in China", rows.len(), flagged));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_reviews(&self, asin: &Asin, reviews: &[Review]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## Reviews for {}", asin));
        lines.push(String::new());

        for review in reviews {
            lines.push(format!("### {}", review.title.as_deref().unwrap_or(sentinel::TITLE)));
            lines.push(String::new());
            lines.push(format!("- **Rating:** {}", review.rating.as_deref().unwrap_or("N/A")));
            lines.push(format!("- **Date:** {}", review.date.as_deref().unwrap_or("N/A")));
            lines.push(String::new());
            lines.push(review.body.as_deref().unwrap_or(sentinel::BODY).to_string());
            lines.push(String::new());
        }

        lines.push(format!("*{} reviews*", reviews.len()));

        lines.join("\n")
    }

    fn markdown_statuses(&self, rows: &[StatusRow]) -> String {
        let mut lines = Vec::new();

        lines.push("| ASIN | Status | Made in China | Reviews |".to_string());
        lines.push("|------|--------|---------------|---------|".to_string());

        for row in rows {
            let verdict = match row.verdict() {
                "yes" => "✓",
                "no" => "✗",
                other => other,
            };
            let reviews = row.reviews.map(|n| n.to_string()).unwrap_or_default();
            lines.push(format!(
                "| [{}](https://www.amazon.com/dp/{}) | {} | {} | {} |",
                row.asin,
                row.asin,
                row.state.label(),
                verdict,
                reviews
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products*", rows.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn reviews_csv_header() -> &'static str {
        "title,rating,date,body"
    }

    fn statuses_csv_header() -> &'static str {
        "asin,status,made_in_china,reviews,error"
    }

    fn csv_reviews(&self, reviews: &[Review]) -> String {
        let mut lines = vec![Self::reviews_csv_header().to_string()];

        for review in reviews {
            lines.push(format!(
                "{},{},{},{}",
                Self::csv_escape(review.title.as_deref().unwrap_or_default()),
                Self::csv_escape(review.rating.as_deref().unwrap_or_default()),
                Self::csv_escape(review.date.as_deref().unwrap_or_default()),
                Self::csv_escape(review.body.as_deref().unwrap_or_default())
            ));
        }

        lines.join("\n")
    }

    fn csv_statuses(&self, rows: &[StatusRow]) -> String {
        let mut lines = vec![Self::statuses_csv_header().to_string()];

        for row in rows {
            lines.push(format!(
                "{},{},{},{},{}",
                row.asin,
                row.state.label(),
                row.made_in_china.map(|b| b.to_string()).unwrap_or_default(),
                row.reviews.map(|n| n.to_string()).unwrap_or_default(),
                Self::csv_escape(row.error.as_deref().unwrap_or_default())
            ));
        }

        lines.join("\n")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

/// Shortens `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
