//! Recommended daily allowances and unit conversion

/// Adult RDA per nutrient: (name, value, unit)
pub const RDA_VALUES: &[(&str, f64, &str)] = &[
    ("Vitamin A", 900.0, "mcg"),
    ("Vitamin C", 90.0, "mg"),
    ("Vitamin D", 20.0, "mcg"),
    ("Vitamin E", 15.0, "mg"),
    ("Vitamin K", 120.0, "mcg"),
    ("Thiamin (B1)", 1.2, "mg"),
    ("Riboflavin (B2)", 1.3, "mg"),
    ("Niacin (B3)", 16.0, "mg"),
    ("Vitamin B6", 1.7, "mg"),
    ("Folate", 400.0, "mcg"),
    ("Vitamin B12", 2.4, "mcg"),
    ("Biotin", 30.0, "mcg"),
    ("Pantothenic Acid", 5.0, "mg"),
    ("Calcium", 1000.0, "mg"),
    ("Iron", 18.0, "mg"),
    ("Magnesium", 420.0, "mg"),
    ("Phosphorus", 700.0, "mg"),
    ("Potassium", 3400.0, "mg"),
    ("Sodium", 2300.0, "mg"),
    ("Zinc", 11.0, "mg"),
    ("Copper", 0.9, "mg"),
    ("Manganese", 2.3, "mg"),
    ("Selenium", 55.0, "mcg"),
    ("Chromium", 35.0, "mcg"),
    ("Molybdenum", 45.0, "mcg"),
    ("Iodine", 150.0, "mcg"),
];

/// RDA value and unit for an exact nutrient name
pub fn rda_for(nutrient: &str) -> Option<(f64, &'static str)> {
    RDA_VALUES
        .iter()
        .find(|(name, _, _)| *name == nutrient)
        .map(|&(_, value, unit)| (value, unit))
}

/// Convert `amount` between mass units; `None` when no conversion is known
pub fn convert(amount: f64, from: &str, to: &str) -> Option<f64> {
    if from == to {
        return Some(amount);
    }
    let factor = match (from, to) {
        ("g", "mg") => 1_000.0,
        ("g", "mcg") => 1_000_000.0,
        ("mg", "g") => 0.001,
        ("mg", "mcg") => 1_000.0,
        ("mcg", "g") => 0.000_001,
        ("mcg", "mg") => 0.001,
        ("IU", "mcg") => 0.025,
        _ => return None,
    };
    Some(amount * factor)
}

/// Rounded percentage of the RDA that `amount` covers
pub fn rda_percentage(nutrient: &str, amount: f64, unit: &str) -> Option<u32> {
    let (rda, rda_unit) = rda_for(nutrient)?;
    let amount = convert(amount, unit, rda_unit)?;
    let percent = (amount / rda * 100.0).round();
    (percent.is_finite() && percent >= 0.0).then_some(percent as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_unit() {
        assert_eq!(rda_percentage("Vitamin C", 45.0, "mg"), Some(50));
        assert_eq!(rda_percentage("Iron", 2.7, "mg"), Some(15));
    }

    #[test]
    fn test_converted_units() {
        // 0.5 g calcium = 500 mg of 1000 mg
        assert_eq!(rda_percentage("Calcium", 0.5, "g"), Some(50));
        // 400 IU vitamin D = 10 mcg of 20 mcg
        assert_eq!(rda_percentage("Vitamin D", 400.0, "IU"), Some(50));
        // 90 mcg vitamin C = 0.09 mg of 90 mg
        assert_eq!(rda_percentage("Vitamin C", 90.0, "mcg"), Some(0));
    }

    #[test]
    fn test_unknown_nutrient_or_unit() {
        assert_eq!(rda_percentage("Fiber", 3.0, "g"), None);
        assert_eq!(rda_percentage("Vitamin A", 100.0, "IU"), None);
        assert_eq!(convert(1.0, "kg", "g"), None);
    }
}
