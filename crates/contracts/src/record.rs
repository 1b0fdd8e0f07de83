//! Record - the unit of output written to sinks
//!
//! A record type fixes its column header once; every instance projects to an
//! ordered row matching that header.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Output row type
///
/// Implementors describe a fixed column layout (`HEADER`) and project each
/// instance into values in the same order.
pub trait Record: Clone + fmt::Debug + Send + Sync + 'static {
    /// Column names, written once as the first line of a fresh sink
    const HEADER: &'static [&'static str];

    /// Identifier of the work item this record was extracted from
    fn origin(&self) -> &str;

    /// Row values, one per header column
    fn values(&self) -> Vec<String>;

    /// Value of a single column by header name
    fn field(&self, column: &str) -> Option<String> {
        let position = Self::HEADER.iter().position(|c| *c == column)?;
        self.values().into_iter().nth(position)
    }

    /// Whether `column` is part of this record's header
    fn has_column(column: &str) -> bool {
        Self::HEADER.contains(&column)
    }
}

/// Author contact extracted from a research paper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorContact {
    pub name: String,
    pub nationality: String,
    pub linkedin: String,
    pub email: String,
    /// Back-reference to the paper link the author was found in
    pub paper_link: String,
    pub notes: String,
}

impl Record for AuthorContact {
    const HEADER: &'static [&'static str] = &[
        "Name",
        "Nationality",
        "LinkedIn",
        "Email",
        "Link to Paper",
        "Notes",
    ];

    fn origin(&self) -> &str {
        &self.paper_link
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.nationality.clone(),
            self.linkedin.clone(),
            self.email.clone(),
            self.paper_link.clone(),
            self.notes.clone(),
        ]
    }
}

/// One nutrient of one ingredient serving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientRecord {
    /// Back-reference to the ingredient name
    pub ingredient: String,
    pub serving_g: f64,
    #[serde(default)]
    pub calories: Option<f64>,
    pub nutrient: String,
    pub amount: f64,
    pub unit: String,
    /// Share of the recommended daily allowance, when known
    #[serde(default)]
    pub percent_rda: Option<u32>,
}

impl Record for NutrientRecord {
    const HEADER: &'static [&'static str] = &[
        "Ingredient",
        "Serving (g)",
        "Calories",
        "Nutrient",
        "Amount",
        "Unit",
        "% RDA",
    ];

    fn origin(&self) -> &str {
        &self.ingredient
    }

    fn values(&self) -> Vec<String> {
        vec![
            self.ingredient.clone(),
            self.serving_g.to_string(),
            self.calories.map(|c| c.to_string()).unwrap_or_default(),
            self.nutrient.clone(),
            self.amount.to_string(),
            self.unit.clone(),
            self.percent_rda.map(|p| p.to_string()).unwrap_or_default(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn author() -> AuthorContact {
        AuthorContact {
            name: "Ada Lovelace".into(),
            nationality: "British".into(),
            linkedin: "Not found".into(),
            email: "ada@example.org".into(),
            paper_link: "https://example.org/paper".into(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_values_match_header_width() {
        assert_eq!(author().values().len(), AuthorContact::HEADER.len());

        let nutrient = NutrientRecord {
            ingredient: "Spinach".into(),
            serving_g: 30.0,
            calories: Some(7.0),
            nutrient: "Iron".into(),
            amount: 0.8,
            unit: "mg".into(),
            percent_rda: Some(4),
        };
        assert_eq!(nutrient.values().len(), NutrientRecord::HEADER.len());
        assert_eq!(nutrient.values()[1], "30");
        assert_eq!(nutrient.values()[4], "0.8");
    }

    #[test]
    fn test_field_by_column_name() {
        let a = author();
        assert_eq!(a.field("Nationality").as_deref(), Some("British"));
        assert_eq!(a.field("Link to Paper").as_deref(), Some(a.origin()));
        assert_eq!(a.field("Shoe Size"), None);
        assert!(AuthorContact::has_column("Email"));
        assert!(!NutrientRecord::has_column("Email"));
    }

    #[test]
    fn test_missing_optional_nutrient_values_are_blank() {
        let n = NutrientRecord {
            ingredient: "Salt".into(),
            serving_g: 1.0,
            calories: None,
            nutrient: "Sodium".into(),
            amount: 387.0,
            unit: "mg".into(),
            percent_rda: None,
        };
        let values = n.values();
        assert_eq!(values[2], "");
        assert_eq!(values[6], "");
    }
}
