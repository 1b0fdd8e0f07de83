//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, JobBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<JobBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<JobBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<JobBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Profile, RouteRule, SinkType};

    #[test]
    fn test_parse_toml_full() {
        let content = r#"
[job]
profile = "papers"
input = "papers.csv"
concurrency = 5
dry_run = true
dry_run_delay_ms = 250
limit = 10

[lookup]
model = "o3"
request_timeout_secs = 60

[[sinks]]
name = "all_authors"
sink_type = "file"
path = "out/all_authors.csv"

[[sinks]]
name = "european_authors"
sink_type = "file"
path = "out/european_authors.csv"
route = { kind = "european", field = "Nationality" }
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.job.profile, Profile::Papers);
        assert_eq!(bp.job.concurrency, 5);
        assert!(bp.job.dry_run);
        assert_eq!(bp.job.limit, Some(10));
        assert_eq!(bp.model(), "o3");
        assert_eq!(bp.lookup.api_key_env, "OPENAI_API_KEY");
        assert_eq!(bp.sinks.len(), 2);
        assert_eq!(bp.sinks[0].route, RouteRule::All);
        assert_eq!(bp.sinks[1].route.field(), Some("Nationality"));
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "job": { "profile": "nutrition", "input": "food.csv" },
            "sinks": [{ "name": "log", "sink_type": "log" }]
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.job.concurrency, 3);
        assert_eq!(bp.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_unknown_profile_is_parse_error() {
        let content = "[job]\nprofile = \"recipes\"\ninput = \"x.csv\"\n";
        let err = parse_toml(content).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
