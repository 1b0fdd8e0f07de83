//! PaperReader - `Section,PaperName,Link` rows

use contracts::{Parameters, WorkItem, LABEL_PARAM};

use crate::reader::{Row, RowMapper};

/// Parameter carrying the paper's section heading
pub const SECTION_PARAM: &str = "section";

/// One work item per paper; the link is the identifier
#[derive(Debug, Clone, Copy, Default)]
pub struct PaperReader;

impl RowMapper for PaperReader {
    const REQUIRED_COLUMNS: &'static [&'static str] = &["Section", "PaperName", "Link"];

    fn map_row(&self, index: usize, row: &Row<'_>) -> Option<WorkItem> {
        let link = row.get("Link")?;
        let mut parameters = Parameters::new();
        if let Some(name) = row.get("PaperName") {
            parameters.insert(LABEL_PARAM, name);
        }
        if let Some(section) = row.get("Section") {
            parameters.insert(SECTION_PARAM, section);
        }
        Some(WorkItem::new(index, link, parameters))
    }
}
