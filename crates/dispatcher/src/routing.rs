//! Rule-based record routing

use contracts::{Classifier, Record, RouteRule, SinkConfig, SinkTarget};

/// Country and nationality fragments treated as Europe or the UK.
///
/// Matched as case-insensitive substrings of the trimmed value.
const EUROPEAN_OR_UK: &[&str] = &[
    "austria", "belgium", "bulgaria", "croatia", "cyprus", "czech republic", "czechia",
    "denmark", "estonia", "finland", "france", "germany", "german", "greece", "greek",
    "hungary", "ireland", "irish", "italy", "italian", "latvia", "lithuania", "luxembourg",
    "malta", "netherlands", "dutch", "poland", "polish", "portugal", "portuguese", "romania",
    "romanian", "slovakia", "slovenia", "spain", "spanish", "sweden", "swedish",
    "united kingdom", "uk", "british", "english", "scottish", "welsh", "northern irish",
    "swiss", "switzerland", "norway", "norwegian", "iceland", "liechtenstein", "ukraine",
    "ukrainian", "serbian", "serbia", "montenegro", "macedonian", "macedonia", "albanian",
    "albania", "bosnian", "bosnia", "croatian", "belgian", "finnish", "danish", "estonian",
    "hungarian", "latvian", "lithuanian", "slovakian", "slovenian",
];

/// Whether `value` names a European or UK country or nationality
pub fn is_european_or_uk(value: &str) -> bool {
    let normalized = value.trim().to_lowercase();
    EUROPEAN_OR_UK.iter().any(|c| normalized.contains(c))
}

/// Evaluate a rule against one record
pub trait RouteMatch {
    fn matches<R: Record>(&self, record: &R) -> bool;
}

impl RouteMatch for RouteRule {
    fn matches<R: Record>(&self, record: &R) -> bool {
        match self {
            RouteRule::All => true,
            RouteRule::Never => false,
            RouteRule::European { field } => record
                .field(field)
                .is_some_and(|v| is_european_or_uk(&v)),
            RouteRule::AnyOf { field, values } => record.field(field).is_some_and(|v| {
                let v = v.trim();
                values.iter().any(|allowed| allowed.eq_ignore_ascii_case(v))
            }),
        }
    }
}

/// Classifier built from `(target, rule)` pairs; output follows route order
#[derive(Debug, Clone, Default)]
pub struct RuleClassifier {
    routes: Vec<(SinkTarget, RouteRule)>,
}

impl RuleClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, target: impl Into<SinkTarget>, rule: RouteRule) -> Self {
        self.routes.push((target.into(), rule));
        self
    }

    /// One route per configured sink, in config order
    pub fn from_configs(configs: &[SinkConfig]) -> Self {
        configs.iter().fold(Self::new(), |classifier, config| {
            classifier.route(config.name.as_str(), config.route.clone())
        })
    }

    pub fn routes(&self) -> &[(SinkTarget, RouteRule)] {
        &self.routes
    }
}

impl<R: Record> Classifier<R> for RuleClassifier {
    fn classify(&self, record: &R) -> Vec<SinkTarget> {
        self.routes
            .iter()
            .filter(|(_, rule)| rule.matches(record))
            .map(|(target, _)| target.clone())
            .collect()
    }
}
