//! # egui_expanding_tree
//!
//! 一个把扁平记录列表显示为可折叠树的egui组件库。
//!
//! ## 功能特性
//!
//! - **扁平转树**：按父标识把记录组织成森林，保持输入顺序
//! - **展开/折叠**：每个节点是独立的折叠项
//! - **字段映射**：`idKey`、`labelKey`、`parentKey`、`childrenKey` 可配置
//! - **主题同步**：宿主通过通道把亮/暗主题推送给每个组件
//! - **HTML 导出**：输出嵌套的 `<details>` 结构，标签会被转义
//!
//! ## 基本使用
//!
//! ```rust,ignore
//! use egui_expanding_tree::{ExpandingTree, ThemeBroadcaster, Theme};
//! use serde_json::json;
//!
//! let mut themes = ThemeBroadcaster::new(Theme::Light);
//! let mut tree = ExpandingTree::from_config(json!({
//!     "data": [
//!         { "id": "1", "label": "Root", "parentId": null },
//!         { "id": "2", "label": "Child", "parentId": "1" }
//!     ]
//! }))?;
//! tree.attach_theme(themes.subscribe());
//!
//! // 在 egui UI 中使用
//! for event in tree.ui(ui) {
//!     log::info!("{:?}", event);
//! }
//!
//! // 切换主题
//! themes.toggle();
//! ```

pub mod builder;
pub mod config;
pub mod description;
pub mod error;
pub mod markup;
pub mod structure;
pub mod theme;
mod tree;

pub use builder::{build_forest, TreeNode};
pub use config::{ClassNames, ClassNamesPatch, TreeConfig, TreeConfigPatch};
pub use description::{describe, Disclosure, NodeAction};
pub use error::TreeError;
pub use structure::{FieldKeys, FlatRecord, KeyedRecord, TreeRecord};
pub use theme::{Theme, ThemeBroadcaster, ThemeReceiver};
pub use tree::{ExpandingTree, ExpandingTreeEvent};
