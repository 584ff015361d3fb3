//! CLI command implementations.

pub mod analyze;
pub mod reviews;
pub mod search;
pub mod status;

pub use analyze::{AnalyzeCommand, Outcome, Pipeline};
pub use reviews::ReviewsCommand;
pub use search::SearchCommand;
pub use status::StatusCommand;

use crate::amazon::models::Asin;
use console::style;

/// Parses command-line ASINs, reporting and skipping invalid ones.
pub(crate) fn parse_asins(raw: &[String]) -> Vec<Asin> {
    raw.iter()
        .filter_map(|r| match Asin::parse(r) {
            Ok(asin) => Some(asin),
            Err(e) => {
                eprintln!("{} {}", style("Skipping").yellow().bold(), e);
                None
            }
        })
        .collect()
}
