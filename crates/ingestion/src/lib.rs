//! # Ingestion
//!
//! Turns the tabular input of a job into an ordered list of [`WorkItem`]s.
//!
//! - Papers: `Section,PaperName,Link`, one item per row with a link
//! - Nutrition: `Food,1 serving (g)`, one item per row with a positive serving
//!
//! Every failure here is fatal and happens before any task is submitted.

mod error;
mod ingredients;
mod papers;
mod reader;

use std::path::Path;

use contracts::{ContractError, Profile, WorkItem};

pub use error::{IngestionError, Result};
pub use ingredients::{IngredientReader, SERVING_PARAM};
pub use papers::{PaperReader, SECTION_PARAM};
pub use reader::{check_header, read_items, read_items_from, ReadOptions, Row, RowMapper};

/// Load the items of `profile` from `path`, keeping at most `limit`
pub fn load_items(
    profile: Profile,
    path: &Path,
    limit: Option<usize>,
) -> std::result::Result<Vec<WorkItem>, ContractError> {
    let options = ReadOptions { limit };
    let items = match profile {
        Profile::Papers => read_items(&PaperReader, path, options)?,
        Profile::Nutrition => read_items(&IngredientReader, path, options)?,
    };
    Ok(items)
}

/// Verify that the input of `profile` carries its required columns
pub fn check_input(profile: Profile, path: &Path) -> std::result::Result<Vec<String>, ContractError> {
    let headers = match profile {
        Profile::Papers => check_header::<PaperReader>(path)?,
        Profile::Nutrition => check_header::<IngredientReader>(path)?,
    };
    Ok(headers)
}

/// Required columns of `profile`
pub fn required_columns(profile: Profile) -> &'static [&'static str] {
    match profile {
        Profile::Papers => PaperReader::REQUIRED_COLUMNS,
        Profile::Nutrition => IngredientReader::REQUIRED_COLUMNS,
    }
}
