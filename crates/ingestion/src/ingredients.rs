//! IngredientReader - `Food,1 serving (g)` rows

use contracts::{Parameters, WorkItem};
use tracing::debug;

use crate::reader::{Row, RowMapper};

/// Parameter carrying the serving size in grams
pub const SERVING_PARAM: &str = "serving_g";

/// One work item per ingredient with a positive serving size
#[derive(Debug, Clone, Copy, Default)]
pub struct IngredientReader;

impl RowMapper for IngredientReader {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Food", "1 serving (g)"];

    fn map_row(&self, index: usize, row: &Row<'_>) -> Option<WorkItem> {
        let food = row.get("Food")?;
        let serving = row.get("1 serving (g)")?;
        match serving.parse::<f64>() {
            Ok(grams) if grams.is_finite() && grams > 0.0 => Some(WorkItem::new(
                index,
                food,
                Parameters::new().with(SERVING_PARAM, grams.to_string()),
            )),
            _ => {
                debug!(row = index, food, serving, "Serving is not a positive number");
                None
            }
        }
    }
}
