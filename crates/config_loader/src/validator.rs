//! 配置校验模块
//!
//! 校验规则：
//! - concurrency >= 1
//! - 至少一个 sink
//! - sink 名称非空且唯一
//! - file sink 必须有 path，且 path 唯一
//! - 路由字段必须是 profile 输出记录的列名
//! - request_timeout_secs > 0

use std::collections::HashSet;

use contracts::{ContractError, JobBlueprint, SinkType};

/// 校验 JobBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &JobBlueprint) -> Result<(), ContractError> {
    validate_job(blueprint)?;
    validate_lookup(blueprint)?;
    validate_sinks(blueprint)?;
    validate_routes(blueprint)?;
    Ok(())
}

/// 校验任务配置
fn validate_job(blueprint: &JobBlueprint) -> Result<(), ContractError> {
    let job = &blueprint.job;

    if job.concurrency == 0 {
        return Err(ContractError::config_validation(
            "job.concurrency",
            "concurrency must be >= 1",
        ));
    }

    if job.input.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "job.input",
            "input path cannot be empty",
        ));
    }

    if job.limit == Some(0) {
        return Err(ContractError::config_validation(
            "job.limit",
            "limit must be >= 1 when set",
        ));
    }

    Ok(())
}

/// 校验查询配置
fn validate_lookup(blueprint: &JobBlueprint) -> Result<(), ContractError> {
    if blueprint.lookup.request_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "lookup.request_timeout_secs",
            "request_timeout_secs must be > 0",
        ));
    }
    if blueprint.model().trim().is_empty() {
        return Err(ContractError::config_validation(
            "lookup.model",
            "model cannot be empty",
        ));
    }
    Ok(())
}

/// 校验 sink 配置 (名称、路径唯一性)
fn validate_sinks(blueprint: &JobBlueprint) -> Result<(), ContractError> {
    if blueprint.sinks.is_empty() {
        return Err(ContractError::config_validation(
            "sinks",
            "at least one sink is required",
        ));
    }

    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for (idx, sink) in blueprint.sinks.iter().enumerate() {
        if sink.name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("sinks[{}].name", idx),
                "sink name cannot be empty",
            ));
        }
        if !names.insert(sink.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("sinks[name={}]", sink.name),
                "duplicate sink name",
            ));
        }

        match (&sink.sink_type, &sink.path) {
            (SinkType::File, None) => {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].path", sink.name),
                    "file sink requires a path",
                ));
            }
            (SinkType::File, Some(path)) => {
                if !paths.insert(path) {
                    return Err(ContractError::config_validation(
                        format!("sinks[{}].path", sink.name),
                        format!("duplicate sink path '{}'", path.display()),
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

/// 校验路由字段属于 profile 的输出列
fn validate_routes(blueprint: &JobBlueprint) -> Result<(), ContractError> {
    let header = blueprint.job.profile.header();
    for sink in &blueprint.sinks {
        if let Some(field) = sink.route.field() {
            if !header.contains(&field) {
                return Err(ContractError::config_validation(
                    format!("sinks[{}].route.field", sink.name),
                    format!(
                        "'{field}' is not a {} column (expected one of: {})",
                        blueprint.job.profile,
                        header.join(", ")
                    ),
                ));
            }
        }
    }
    Ok(())
}
