//! Tabular input to WorkItems
//!
//! A [`RowMapper`] names the columns it needs and turns one header-keyed row
//! into a work item (or skips it). [`read_items`] handles the file, header
//! validation, empty-source rejection and the optional limit.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use contracts::WorkItem;
use tracing::{debug, info, instrument, warn};

use crate::error::{IngestionError, Result};

/// Header-keyed view of one CSV row
pub struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
}

impl<'a> Row<'a> {
    /// Trimmed value of `column`, `None` when absent or blank
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let position = *self.columns.get(column)?;
        self.record
            .get(position)
            .map(str::trim)
            .filter(|v| !v.is_empty())
    }
}

/// Row to WorkItem translation for one input format
pub trait RowMapper {
    /// Columns that must appear in the header
    const REQUIRED_COLUMNS: &'static [&'static str];

    /// Build the item for data row `index`; `None` skips the row
    fn map_row(&self, index: usize, row: &Row<'_>) -> Option<WorkItem>;
}

/// Read options
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Keep only the first `limit` items
    pub limit: Option<usize>,
}

/// Read all items from a CSV file
#[instrument(name = "read_items", skip(mapper, path, options), fields(path = %path.display()))]
pub fn read_items<M: RowMapper>(
    mapper: &M,
    path: &Path,
    options: ReadOptions,
) -> Result<Vec<WorkItem>> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| IngestionError::Open {
        source_name: source_name.clone(),
        source,
    })?;
    let items = read_items_from(mapper, &source_name, file, options)?;
    info!(items = items.len(), "Input loaded");
    Ok(items)
}

/// Read all items from any reader; `source_name` is used in errors
pub fn read_items_from<M: RowMapper, R: Read>(
    mapper: &M,
    source_name: &str,
    reader: R,
    options: ReadOptions,
) -> Result<Vec<WorkItem>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| IngestionError::malformed(source_name, &e))?
        .clone();
    let columns: HashMap<String, usize> = headers
        .iter()
        .enumerate()
        .map(|(i, name)| (name.trim_start_matches('\u{feff}').to_string(), i))
        .collect();

    let mut items = Vec::new();
    let mut rows = 0usize;
    let mut skipped = 0usize;
    let mut record = csv::StringRecord::new();

    loop {
        match rdr.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => return Err(IngestionError::malformed(source_name, &e)),
        }
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        // Header check happens on the first data row so that a header-only
        // file reports as empty.
        if rows == 0 {
            check_columns::<M>(source_name, &columns)?;
        }
        let index = rows;
        rows += 1;
        if limit_reached(options, items.len()) {
            break;
        }

        let row = Row {
            columns: &columns,
            record: &record,
        };
        match mapper.map_row(index, &row) {
            Some(item) => items.push(item),
            None => {
                skipped += 1;
                debug!(row = index, "Row skipped");
            }
        }

        if limit_reached(options, items.len()) {
            break;
        }
    }

    if rows == 0 {
        return Err(IngestionError::Empty {
            source_name: source_name.to_string(),
        });
    }
    if items.is_empty() && options.limit != Some(0) {
        return Err(IngestionError::NoUsableRows {
            source_name: source_name.to_string(),
            skipped,
        });
    }
    if skipped > 0 {
        warn!(skipped, "Rows without required values were skipped");
    }
    Ok(items)
}

fn limit_reached(options: ReadOptions, items: usize) -> bool {
    options.limit.is_some_and(|limit| items >= limit)
}

fn check_columns<M: RowMapper>(source_name: &str, columns: &HashMap<String, usize>) -> Result<()> {
    if M::REQUIRED_COLUMNS.iter().all(|c| columns.contains_key(*c)) {
        return Ok(());
    }
    Err(IngestionError::MissingColumns {
        source_name: source_name.to_string(),
        columns: M::REQUIRED_COLUMNS.to_vec(),
    })
}

/// Read only the header line and verify the required columns
pub fn check_header<M: RowMapper>(path: &Path) -> Result<Vec<String>> {
    let source_name = path.display().to_string();
    let file = File::open(path).map_err(|source| IngestionError::Open {
        source_name: source_name.clone(),
        source,
    })?;
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| IngestionError::malformed(&source_name, &e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let columns = headers
        .iter()
        .enumerate()
        .map(|(i, h)| (h.clone(), i))
        .collect();
    check_columns::<M>(&source_name, &columns)?;
    Ok(headers)
}
