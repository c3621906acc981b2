//! 错误类型

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TreeError {
    /// 配置不是 JSON 对象（null、数组、字符串等）
    #[error("invalid configuration: expected an object, got {0}")]
    NotAnObject(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),

    #[error("duplicate record id `{0}`")]
    DuplicateId(String),

    /// 记录是自己的祖先（直接或间接）
    #[error("cycle detected at record `{0}`")]
    CycleDetected(String),

    /// 嵌套导出超过深度上限
    #[error("tree depth {depth} exceeds the nested export limit of {limit}")]
    TooDeep { depth: usize, limit: usize },

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// JSON 值的类型名，用于错误信息
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
