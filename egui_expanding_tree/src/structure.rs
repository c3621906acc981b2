//! 数据结构模块
//!
//! 定义了树组件的输入记录：每条记录带有标识、显示文本和可空的父标识。

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// 记录字段访问器
///
/// 构建器和渲染器只通过这个 trait 读取记录，调用方可以为任意类型实现它。
pub trait TreeRecord {
    /// 记录标识。没有标识的记录无法被引用，构建时会被跳过。
    fn id(&self) -> Option<Cow<'_, str>>;

    /// 父记录标识，`None` 表示根节点
    fn parent_id(&self) -> Option<Cow<'_, str>>;

    /// 显示文本
    fn label(&self) -> Cow<'_, str>;
}

/// 强类型的扁平记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlatRecord {
    pub id: String,
    pub label: String,
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<String>,
    /// 其余字段原样保留
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FlatRecord {
    pub fn new(id: impl Into<String>, label: impl Into<String>, parent_id: Option<&str>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent_id: parent_id.map(str::to_string),
            extra: Map::new(),
        }
    }

    /// 转换为 JSON 对象，可直接放入配置的 `data`
    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        object.insert("label".to_string(), Value::String(self.label.clone()));
        object.insert(
            "parentId".to_string(),
            self.parent_id.clone().map_or(Value::Null, Value::String),
        );
        Value::Object(object)
    }
}

impl TreeRecord for FlatRecord {
    fn id(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed(&self.id))
    }

    fn parent_id(&self) -> Option<Cow<'_, str>> {
        self.parent_id.as_deref().map(Cow::Borrowed)
    }

    fn label(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.label)
    }
}

/// 动态 JSON 记录使用的字段名
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldKeys<'a> {
    pub id: &'a str,
    pub label: &'a str,
    pub parent: &'a str,
    pub children: &'a str,
}

impl Default for FieldKeys<'static> {
    fn default() -> Self {
        Self {
            id: "id",
            label: "label",
            parent: "parentId",
            children: "children",
        }
    }
}

/// JSON 对象 + 字段名映射
#[derive(Clone, Copy, Debug)]
pub struct KeyedRecord<'a> {
    pub value: &'a Value,
    pub keys: FieldKeys<'a>,
}

impl<'a> KeyedRecord<'a> {
    pub fn new(value: &'a Value, keys: FieldKeys<'a>) -> Self {
        Self { value, keys }
    }

    /// 为一组 JSON 值套上同一份字段映射
    pub fn wrap_all(values: &'a [Value], keys: FieldKeys<'a>) -> Vec<Self> {
        values.iter().map(|value| Self::new(value, keys)).collect()
    }
}

/// 字符串和数字都可作为标识；null、缺失和其他类型视为无值
fn identifier(value: Option<&Value>) -> Option<Cow<'_, str>> {
    match value? {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

impl TreeRecord for KeyedRecord<'_> {
    fn id(&self) -> Option<Cow<'_, str>> {
        identifier(self.value.get(self.keys.id))
    }

    fn parent_id(&self) -> Option<Cow<'_, str>> {
        identifier(self.value.get(self.keys.parent))
    }

    fn label(&self) -> Cow<'_, str> {
        match self.value.get(self.keys.label) {
            Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
            Some(Value::Null) | None => Cow::Borrowed(""),
            Some(other) => Cow::Owned(other.to_string()),
        }
    }
}
