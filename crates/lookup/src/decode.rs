//! Strict decoding of model output into typed payloads
//!
//! Model text may be wrapped in markdown fences or surrounded by prose. The
//! JSON itself must match the expected shape; anything else is a
//! [`LookupError::Decode`].

use serde::de::DeserializeOwned;
use serde::Deserialize;

use contracts::LookupError;

/// Remove a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Outermost JSON object or array embedded in `text`
fn embedded_json(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c == '{' || c == '[')?;
    let close = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Parse `text` as `T`, falling back to the JSON embedded in surrounding prose
pub fn decode_json<T: DeserializeOwned>(text: &str) -> Result<T, LookupError> {
    let text = strip_code_fences(text);
    match serde_json::from_str(text) {
        Ok(value) => Ok(value),
        Err(first) => match embedded_json(text) {
            Some(inner) if inner.len() < text.len() => {
                serde_json::from_str(inner).map_err(|e| LookupError::decode(e.to_string()))
            }
            _ => Err(LookupError::decode(first.to_string())),
        },
    }
}

/// One author as returned by the model
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RawAuthor {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub nationality: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Either a bare array or `{ "authors": [...] }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AuthorsPayload {
    List(Vec<RawAuthor>),
    Wrapped { authors: Vec<RawAuthor> },
}

pub fn decode_authors(text: &str) -> Result<Vec<RawAuthor>, LookupError> {
    match decode_json::<AuthorsPayload>(text)? {
        AuthorsPayload::List(authors) | AuthorsPayload::Wrapped { authors } => Ok(authors),
    }
}

/// One nutrient as returned by the model
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawNutrient {
    pub name: String,
    pub amount: f64,
    pub unit: String,
}

/// Nutrition answer for one serving
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawNutrition {
    #[serde(default)]
    pub calories: Option<f64>,
    pub nutrients: Vec<RawNutrient>,
}

pub fn decode_nutrition(text: &str) -> Result<RawNutrition, LookupError> {
    decode_json(text)
}
