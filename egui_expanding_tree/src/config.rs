//! 配置模块
//!
//! 组件配置在创建时取默认值，之后每次 `configure` 做一次浅合并。

use crate::error::{json_kind, TreeError};
use crate::structure::FieldKeys;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// HTML 输出使用的 class 名
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassNames {
    pub container: String,
    pub item: String,
    pub item_label: String,
    pub item_actions: String,
    pub item_children: String,
    pub item_children_hidden: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            container: "expanding-tree".to_string(),
            item: "expanding-tree-item".to_string(),
            item_label: "expanding-tree-item-label".to_string(),
            item_actions: "expanding-tree-item-actions".to_string(),
            item_children: "expanding-tree-item-children".to_string(),
            item_children_hidden: "expanding-tree-item-children-hidden".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeConfig {
    pub data: Vec<Value>,
    /// 目前不影响渲染
    pub modifiable: bool,
    pub children_key: String,
    pub label_key: String,
    pub id_key: String,
    pub parent_key: String,
    pub classes: ClassNames,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            modifiable: false,
            children_key: "children".to_string(),
            label_key: "label".to_string(),
            id_key: "id".to_string(),
            parent_key: "parentId".to_string(),
            classes: ClassNames::default(),
        }
    }
}

impl TreeConfig {
    pub fn field_keys(&self) -> FieldKeys<'_> {
        FieldKeys {
            id: &self.id_key,
            label: &self.label_key,
            parent: &self.parent_key,
            children: &self.children_key,
        }
    }

    /// 浅合并：补丁中出现的字段覆盖当前值，`classes` 再向下合并一层
    pub fn merged(&self, patch: TreeConfigPatch) -> Self {
        let mut next = self.clone();
        if let Some(data) = patch.data {
            next.data = data;
        }
        if let Some(modifiable) = patch.modifiable {
            next.modifiable = modifiable;
        }
        if let Some(key) = patch.children_key {
            next.children_key = key;
        }
        if let Some(key) = patch.label_key {
            next.label_key = key;
        }
        if let Some(key) = patch.id_key {
            next.id_key = key;
        }
        if let Some(key) = patch.parent_key {
            next.parent_key = key;
        }
        if let Some(classes) = patch.classes {
            classes.apply(&mut next.classes);
        }
        next
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassNamesPatch {
    pub container: Option<String>,
    pub item: Option<String>,
    pub item_label: Option<String>,
    pub item_actions: Option<String>,
    pub item_children: Option<String>,
    pub item_children_hidden: Option<String>,
}

impl ClassNamesPatch {
    fn apply(self, classes: &mut ClassNames) {
        let fields = [
            (self.container, &mut classes.container),
            (self.item, &mut classes.item),
            (self.item_label, &mut classes.item_label),
            (self.item_actions, &mut classes.item_actions),
            (self.item_children, &mut classes.item_children),
            (self.item_children_hidden, &mut classes.item_children_hidden),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }
}

/// 配置补丁，所有字段可选；未知字段被忽略
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeConfigPatch {
    pub data: Option<Vec<Value>>,
    pub modifiable: Option<bool>,
    pub children_key: Option<String>,
    pub label_key: Option<String>,
    pub id_key: Option<String>,
    pub parent_key: Option<String>,
    pub classes: Option<ClassNamesPatch>,
}

impl TreeConfigPatch {
    pub fn with_data(data: Vec<Value>) -> Self {
        Self {
            data: Some(data),
            ..Self::default()
        }
    }

    /// 从 JSON 值解析；只接受对象
    pub fn from_value(value: Value) -> Result<Self, TreeError> {
        if !value.is_object() {
            return Err(TreeError::NotAnObject(json_kind(&value)));
        }
        Ok(serde_json::from_value(value)?)
    }

    /// 从 JSON 文件加载
    pub fn load_from_path(path: &Path) -> Result<Self, TreeError> {
        let content = fs::read_to_string(path)?;
        let value: Value = serde_json::from_str(&content)?;
        Self::from_value(value)
    }
}
