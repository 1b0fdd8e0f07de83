//! Nutrition run report: per-ingredient results and daily totals vs RDA.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use batch_engine::{BatchResult, TaskOutcome};
use chrono::Utc;
use contracts::NutrientRecord;
use lookup::rda::rda_for;
use lookup::rda_percentage;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientEntry {
    pub ingredient: String,
    pub serving: Option<f64>,
    pub calories: Option<f64>,
    pub nutrients: Vec<NutrientEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientEntry {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent_rda: Option<u32>,
}

/// One nutrient summed over every ingredient
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NutrientTotal {
    pub name: String,
    pub amount: f64,
    pub unit: String,
    pub percent_rda: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_calories: f64,
    /// First-seen order
    pub nutrients: Vec<NutrientTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NutritionReport {
    pub timestamp: String,
    pub results: Vec<IngredientEntry>,
    pub summary: ReportSummary,
}

impl NutritionReport {
    pub fn from_result(result: &BatchResult<NutrientRecord>) -> Self {
        let results: Vec<_> = result.outcomes().iter().map(entry_for).collect();
        let summary = summarize(&results);
        Self {
            timestamp: Utc::now().format("%Y-%m-%dT%H-%M-%S").to_string(),
            results,
            summary,
        }
    }

    /// Totals sorted by RDA coverage, highest first
    pub fn ranked_totals(&self) -> Vec<&NutrientTotal> {
        let mut totals: Vec<_> = self.summary.nutrients.iter().collect();
        totals.sort_by(|a, b| b.percent_rda.cmp(&a.percent_rda));
        totals
    }

    pub fn print(&self) {
        println!("\n=== DAILY TOTALS vs RDA ===\n");
        println!("Total Calories: {}", self.summary.total_calories);
        println!("\nNutrient Summary:");
        for total in self.ranked_totals() {
            let rda = rda_for(&total.name)
                .map(|(value, unit)| format!(" / {value} {unit}"))
                .unwrap_or_default();
            println!(
                "  {}: {:.2} {}{} ({}% RDA)",
                total.name, total.amount, total.unit, rda, total.percent_rda
            );
        }
    }

    /// Write `nutrition-analysis-<timestamp>.json` into `dir`
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        let path = dir.join(format!("nutrition-analysis-{}.json", self.timestamp));
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(path)
    }
}

fn entry_for(outcome: &TaskOutcome<NutrientRecord>) -> IngredientEntry {
    let first = outcome.records.first();
    let serving = first.map(|r| r.serving_g).or_else(|| {
        outcome
            .item
            .parameters
            .get(lookup::SERVING_PARAM)
            .and_then(|s| s.parse().ok())
    });
    IngredientEntry {
        ingredient: outcome.item.identifier.clone(),
        serving,
        calories: first.and_then(|r| r.calories),
        nutrients: outcome
            .records
            .iter()
            .map(|r| NutrientEntry {
                name: r.nutrient.clone(),
                amount: r.amount,
                unit: r.unit.clone(),
                percent_rda: r.percent_rda,
            })
            .collect(),
        error: outcome.failure.clone(),
    }
}

/// Sum calories and nutrients; a nutrient reported in a unit other than its
/// first-seen unit is left out of the total.
fn summarize(results: &[IngredientEntry]) -> ReportSummary {
    let mut total_calories = 0.0;
    let mut nutrients: Vec<NutrientTotal> = Vec::new();

    for entry in results.iter().filter(|e| e.error.is_none()) {
        total_calories += entry.calories.unwrap_or(0.0);

        for nutrient in &entry.nutrients {
            match nutrients.iter_mut().find(|t| t.name == nutrient.name) {
                Some(total) if total.unit == nutrient.unit => {
                    total.amount += nutrient.amount;
                    if let Some(percent) = rda_percentage(&total.name, total.amount, &total.unit) {
                        total.percent_rda = percent;
                    }
                }
                Some(_) => {}
                None => nutrients.push(NutrientTotal {
                    name: nutrient.name.clone(),
                    amount: nutrient.amount,
                    unit: nutrient.unit.clone(),
                    percent_rda: nutrient.percent_rda.unwrap_or(0),
                }),
            }
        }
    }

    ReportSummary {
        total_calories,
        nutrients,
    }
}
