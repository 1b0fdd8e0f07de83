//! NutritionLookup - ingredient serving to nutrient facts

use tracing::{debug, instrument};

use contracts::{Lookup, LookupError, NutrientRecord, WorkItem};

use crate::client::{ResponsesClient, ResponsesRequest, JSON_ONLY_SUFFIX};
use crate::decode::{decode_nutrition, RawNutrition};
use crate::rda::rda_percentage;

/// Parameter carrying the serving size in grams
pub const SERVING_PARAM: &str = "serving_g";

const INSTRUCTIONS: &str =
    "You are a nutritionist assistant that provides accurate nutritional data in JSON format.";

const NUTRIENT_LIST: &str = "Vitamins A, C, D, E, K, B1, B2, B3, B6, B12, Folate, Biotin, \
    Pantothenic Acid, Calcium, Iron, Magnesium, Phosphorus, Potassium, Sodium, Zinc, Copper, \
    Manganese, Selenium, Chromium, Molybdenum, Iodine";

/// Serving size of an ingredient item
pub fn serving_of(item: &WorkItem) -> Result<f64, LookupError> {
    let raw = item
        .parameters
        .get(SERVING_PARAM)
        .ok_or_else(|| LookupError::MissingParameter(SERVING_PARAM.to_string()))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|g| g.is_finite() && *g > 0.0)
        .ok_or_else(|| LookupError::Rejected(format!("invalid serving size '{raw}'")))
}

/// One record per reported nutrient, annotated with its RDA share
pub fn into_records(raw: RawNutrition, ingredient: &str, serving_g: f64) -> Vec<NutrientRecord> {
    raw.nutrients
        .into_iter()
        .map(|n| NutrientRecord {
            ingredient: ingredient.to_string(),
            serving_g,
            calories: raw.calories,
            percent_rda: rda_percentage(&n.name, n.amount, &n.unit),
            nutrient: n.name,
            amount: n.amount,
            unit: n.unit,
        })
        .collect()
}

/// Nutrient extraction via the Responses API
///
/// `item.identifier` is the ingredient name; the serving comes from the
/// `serving_g` parameter.
pub struct NutritionLookup<C> {
    client: C,
    model: String,
}

impl<C: ResponsesClient> NutritionLookup<C> {
    pub fn new(client: C, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(&self, ingredient: &str, serving_g: f64) -> ResponsesRequest {
        let input = format!(
            "Analyze the nutritional content of {serving_g}g of {ingredient}.\n\
             Provide the major vitamins and minerals with their amounts and units.\n\
             Format the response as a JSON object with the following structure:\n\
             {{\"calories\": number, \"nutrients\": [{{\"name\": \"Vitamin/Mineral name\", \"amount\": number, \"unit\": \"mg/mcg/g/IU\"}}]}}\n\
             Include these nutrients if present: {NUTRIENT_LIST}.{JSON_ONLY_SUFFIX}"
        );
        ResponsesRequest {
            model: self.model.clone(),
            instructions: INSTRUCTIONS.to_string(),
            input,
        }
    }
}

impl<C: ResponsesClient> Lookup for NutritionLookup<C> {
    type Record = NutrientRecord;

    fn name(&self) -> &str {
        "nutrition"
    }

    #[instrument(
        name = "nutrition_lookup",
        skip(self, item),
        fields(item = item.index, ingredient = %item.identifier)
    )]
    async fn lookup(&self, item: &WorkItem) -> Result<Vec<NutrientRecord>, LookupError> {
        let serving_g = serving_of(item)?;
        let text = self
            .client
            .respond(&self.request(&item.identifier, serving_g))
            .await?;
        let records = into_records(decode_nutrition(&text)?, &item.identifier, serving_g);
        debug!(nutrients = records.len(), "Nutrients decoded");
        Ok(records)
    }

    fn synthetic(&self, item: &WorkItem) -> Vec<NutrientRecord> {
        synthetic_nutrients(item)
    }
}

/// Fixed dry-run nutrient
pub fn synthetic_nutrients(item: &WorkItem) -> Vec<NutrientRecord> {
    let serving_g = serving_of(item).unwrap_or(100.0);
    vec![NutrientRecord {
        ingredient: item.identifier.clone(),
        serving_g,
        calories: Some(50.0),
        nutrient: "Vitamin C".into(),
        amount: 9.0,
        unit: "mg".into(),
        percent_rda: rda_percentage("Vitamin C", 9.0, "mg"),
    }]
}
