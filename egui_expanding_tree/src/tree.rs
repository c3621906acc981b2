//! 树组件实现

use crate::builder::{build_forest, TreeNode};
use crate::config::{TreeConfig, TreeConfigPatch};
use crate::description::{describe, Disclosure};
use crate::error::TreeError;
use crate::markup::render_html;
use crate::structure::KeyedRecord;
use crate::theme::{Theme, ThemeReceiver};
use egui::collapsing_header::CollapsingState;
use egui::*;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};

static TREE_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// 嵌套 JSON 导出的最大深度，与 serde_json 解析时的递归上限一致
pub const NESTED_JSON_MAX_DEPTH: usize = 128;

/// 树组件事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandingTreeEvent {
    /// 折叠项被点击展开或收起
    NodeToggled { id: String, open: bool },
    /// 新主题已应用到组件
    ThemeApplied { theme: Theme },
}

/// 可折叠树组件
pub struct ExpandingTree {
    instance: u64,
    config: TreeConfig,
    /// 每次成功配置后重新生成
    forest: Vec<Disclosure>,
    /// 配置代数，参与折叠项 id 的计算，重新配置后展开状态不保留
    generation: u64,
    theme: Theme,
    theme_receiver: Option<ThemeReceiver>,
    pending_events: Vec<ExpandingTreeEvent>,
}

impl ExpandingTree {
    /// 使用默认配置创建空树
    pub fn new() -> Self {
        Self {
            instance: TREE_ID_COUNTER.fetch_add(1, Ordering::Relaxed),
            config: TreeConfig::default(),
            forest: Vec::new(),
            generation: 0,
            theme: Theme::default(),
            theme_receiver: None,
            pending_events: Vec::new(),
        }
    }

    /// 创建并立即应用配置
    pub fn from_config(patch: Value) -> Result<Self, TreeError> {
        let mut tree = Self::new();
        tree.configure(patch)?;
        Ok(tree)
    }

    /// 重新配置
    ///
    /// 非对象（包括 null）会被拒绝并记录日志，之前的配置和渲染结果保持不变。
    pub fn configure(&mut self, patch: Value) -> Result<(), TreeError> {
        match TreeConfigPatch::from_value(patch) {
            Ok(patch) => self.configure_with(patch),
            Err(e) => {
                log::error!("Rejected tree configuration: {}", e);
                Err(e)
            }
        }
    }

    /// 强类型的重新配置：浅合并后整体重建
    pub fn configure_with(&mut self, patch: TreeConfigPatch) -> Result<(), TreeError> {
        let next = self.config.merged(patch);
        let forest = match describe_records(&next) {
            Ok(forest) => forest,
            Err(e) => {
                log::error!("Failed to build tree, keeping previous one: {}", e);
                return Err(e);
            }
        };

        self.config = next;
        self.forest = forest;
        self.generation += 1;
        log::debug!(
            "tree {} rebuilt (generation {}): {} roots",
            self.instance,
            self.generation,
            self.forest.len()
        );
        Ok(())
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn forest(&self) -> &[Disclosure] {
        &self.forest
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// 显式设置主题，不影响树内容和展开状态
    pub fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.pending_events
                .push(ExpandingTreeEvent::ThemeApplied { theme });
        }
    }

    /// 接入宿主的主题通道
    pub fn attach_theme(&mut self, receiver: ThemeReceiver) {
        self.theme_receiver = Some(receiver);
        self.sync_theme();
    }

    /// 取出通道中最新的主题并应用，返回主题是否变化
    pub fn sync_theme(&mut self) -> bool {
        let latest = self
            .theme_receiver
            .as_ref()
            .and_then(ThemeReceiver::latest);
        match latest {
            Some(theme) if theme != self.theme => {
                self.set_theme(theme);
                true
            }
            _ => false,
        }
    }

    pub fn take_events(&mut self) -> Vec<ExpandingTreeEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// 导出 HTML
    pub fn to_html(&self) -> String {
        render_html(&self.forest, self.theme, &self.config.classes)
    }

    /// 导出嵌套 JSON：每条记录浅拷贝，子节点放在 `childrenKey` 字段下
    ///
    /// 深度超过 [`NESTED_JSON_MAX_DEPTH`] 时返回 [`TreeError::TooDeep`]。
    pub fn to_nested_json(&self) -> Result<Value, TreeError> {
        let keys = self.config.field_keys();
        let records = KeyedRecord::wrap_all(&self.config.data, keys);
        let forest = build_forest(&records)?;

        let depth = forest_depth(&forest);
        if depth > NESTED_JSON_MAX_DEPTH {
            return Err(TreeError::TooDeep {
                depth,
                limit: NESTED_JSON_MAX_DEPTH,
            });
        }

        // 深度已受限，递归是安全的
        fn nest(node: &TreeNode<'_, KeyedRecord<'_>>, children_key: &str) -> Value {
            let mut object = match node.record.value {
                Value::Object(object) => object.clone(),
                _ => Map::new(),
            };
            let children = node
                .children
                .iter()
                .map(|child| nest(child, children_key))
                .collect();
            object.insert(children_key.to_string(), Value::Array(children));
            Value::Object(object)
        }

        Ok(Value::Array(
            forest
                .iter()
                .map(|root| nest(root, keys.children))
                .collect(),
        ))
    }

    /// 展开指定节点
    pub fn expand_node(&self, ctx: &Context, node_id: &str) {
        self.store_open(ctx, node_id, true);
    }

    /// 折叠指定节点
    pub fn collapse_node(&self, ctx: &Context, node_id: &str) {
        self.store_open(ctx, node_id, false);
    }

    /// 节点在当前配置代数下是否展开
    pub fn is_expanded(&self, ctx: &Context, node_id: &str) -> bool {
        CollapsingState::load_with_default_open(ctx, self.header_id(node_id), false).is_open()
    }

    fn store_open(&self, ctx: &Context, node_id: &str, open: bool) {
        let mut state = CollapsingState::load_with_default_open(ctx, self.header_id(node_id), false);
        state.set_open(open);
        state.store(ctx);
    }

    fn header_id(&self, node_id: &str) -> Id {
        header_id((self.instance, self.generation), node_id)
    }

    /// 渲染 UI 并返回事件列表
    pub fn ui(&mut self, ui: &mut Ui) -> Vec<ExpandingTreeEvent> {
        self.sync_theme();

        let theme = self.theme;
        let salt = (self.instance, self.generation);
        let forest = &self.forest;
        let events = &mut self.pending_events;

        // 主题只作用于组件自身的作用域
        ui.scope(|ui| {
            ui.style_mut().visuals = theme.visuals();
            Frame::none()
                .fill(ui.visuals().panel_fill)
                .inner_margin(Margin::same(4.0))
                .show(ui, |ui| {
                    for node in forest {
                        render_disclosure(ui, node, salt, events);
                    }
                });
        });

        std::mem::take(&mut self.pending_events)
    }
}

impl Default for ExpandingTree {
    fn default() -> Self {
        Self::new()
    }
}

fn describe_records(config: &TreeConfig) -> Result<Vec<Disclosure>, TreeError> {
    let records = KeyedRecord::wrap_all(&config.data, config.field_keys());
    let forest = build_forest(&records)?;
    Ok(describe(&forest))
}

/// 森林的最大深度（根为 1）
fn forest_depth<R>(forest: &[TreeNode<'_, R>]) -> usize {
    let mut stack: Vec<(&TreeNode<'_, R>, usize)> = forest.iter().map(|root| (root, 1)).collect();
    let mut deepest = 0;
    while let Some((node, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(node.children.iter().map(|child| (child, depth + 1)));
    }
    deepest
}

/// 折叠项的状态 id 只由组件实例、配置代数和节点标识决定，与所在 Ui 无关
fn header_id(salt: (u64, u64), node_id: &str) -> Id {
    Id::new(("expanding_tree", salt.0, salt.1, node_id))
}

/// 渲染折叠项（递归）
///
/// 只有展开的节点才会继续向下渲染。
fn render_disclosure(
    ui: &mut Ui,
    node: &Disclosure,
    salt: (u64, u64),
    events: &mut Vec<ExpandingTreeEvent>,
) {
    let id = header_id(salt, &node.id);
    let state = CollapsingState::load_with_default_open(ui.ctx(), id, false);
    let was_open = state.is_open();

    let (toggle, header, _) = state
        .show_header(ui, |ui| ui.selectable_label(false, node.label.as_str()))
        .body(|ui| {
            ui.horizontal(|ui| {
                for action in node.actions() {
                    // 仅展示
                    let _ = ui
                        .small_button(action.icon())
                        .on_hover_text(action.title());
                }
            });
            for child in &node.children {
                render_disclosure(ui, child, salt, events);
            }
        });

    // 点击标签与点击箭头效果相同
    let label_clicked = header.inner.clicked();
    if label_clicked {
        let mut state = CollapsingState::load_with_default_open(ui.ctx(), id, false);
        state.toggle(ui);
        state.store(ui.ctx());
    }

    if toggle.clicked() || label_clicked {
        events.push(ExpandingTreeEvent::NodeToggled {
            id: node.id.clone(),
            open: !was_open,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::NodeAction;
    use crate::structure::FlatRecord;
    use crate::theme::ThemeBroadcaster;
    use serde_json::json;

    fn sample_data() -> Vec<Value> {
        [
            ("1", None),
            ("2", Some("1")),
            ("3", Some("2")),
            ("4", Some("3")),
            ("5", Some("3")),
            ("6", Some("2")),
            ("7", Some("6")),
            ("8", Some("1")),
            ("9", Some("8")),
        ]
        .iter()
        .map(|(id, parent)| {
            let mut record = FlatRecord::new(*id, format!("Node {}", id), *parent);
            record
                .extra
                .insert("title".to_string(), json!(format!("Title {}", id)));
            record.to_value()
        })
        .collect()
    }

    fn sample_tree() -> ExpandingTree {
        ExpandingTree::from_config(json!({ "data": sample_data() })).unwrap()
    }

    fn run_frame(tree: &mut ExpandingTree) -> Vec<ExpandingTreeEvent> {
        let ctx = Context::default();
        let mut events = Vec::new();
        let _ = ctx.run(RawInput::default(), |ctx| {
            CentralPanel::default().show(ctx, |ui| {
                events = tree.ui(ui);
            });
        });
        events
    }

    /// 运行一帧，返回所有文本及其位置
    fn frame_texts(ctx: &Context, tree: &mut ExpandingTree) -> Vec<(String, Pos2)> {
        let output = ctx.run(RawInput::default(), |ctx| {
            CentralPanel::default().show(ctx, |ui| {
                let _ = tree.ui(ui);
            });
        });
        let mut texts = Vec::new();
        let mut shapes: Vec<&Shape> = output.shapes.iter().map(|clipped| &clipped.shape).collect();
        while let Some(shape) = shapes.pop() {
            match shape {
                Shape::Vec(inner) => shapes.extend(inner.iter()),
                Shape::Text(text) => texts.push((text.galley.text().to_string(), text.pos)),
                _ => {}
            }
        }
        texts
    }

    fn count_text(texts: &[(String, Pos2)], needle: &str) -> usize {
        texts.iter().filter(|(text, _)| text == needle).count()
    }

    fn text_x(texts: &[(String, Pos2)], needle: &str) -> f32 {
        texts
            .iter()
            .find(|(text, _)| text == needle)
            .map(|(_, pos)| pos.x)
            .unwrap_or_else(|| panic!("`{}` was not rendered", needle))
    }

    fn chain_data(depth: usize) -> Vec<Value> {
        (0..depth)
            .map(|i| {
                let parent = i.checked_sub(1);
                json!({ "id": i, "label": format!("Level {}", i), "parentId": parent })
            })
            .collect()
    }

    #[test]
    fn configure_builds_forest() {
        let tree = sample_tree();
        assert_eq!(tree.generation(), 1);
        assert_eq!(tree.forest().len(), 1);
        let root = &tree.forest()[0];
        let ids: Vec<_> = root.children.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["2", "8"]);
        assert_eq!(root.label, "Node 1");
    }

    #[test]
    fn rejected_configuration_keeps_previous_tree() {
        let mut tree = sample_tree();
        let before = tree.forest().to_vec();
        let config_before = tree.config().clone();

        assert!(matches!(tree.configure(Value::Null), Err(TreeError::NotAnObject("null"))));
        assert!(tree.configure(json!("not an object")).is_err());
        assert_eq!(tree.forest(), before.as_slice());
        assert_eq!(tree.config(), &config_before);
        assert_eq!(tree.generation(), 1);
    }

    #[test]
    fn failed_build_keeps_previous_tree() {
        let mut tree = sample_tree();
        let before = tree.forest().to_vec();
        let cyclic = json!({ "data": [
            { "id": "a", "label": "A", "parentId": "a" }
        ]});
        assert!(matches!(tree.configure(cyclic), Err(TreeError::CycleDetected(_))));
        assert_eq!(tree.forest(), before.as_slice());
        assert_eq!(tree.config().data.len(), 9);
    }

    #[test]
    fn label_key_remaps_displayed_text() {
        let mut tree = sample_tree();
        tree.configure(json!({ "labelKey": "title" })).unwrap();
        assert_eq!(tree.forest()[0].label, "Title 1");
        assert_eq!(tree.forest()[0].children[1].label, "Title 8");
        assert_eq!(tree.generation(), 2);
    }

    #[test]
    fn id_and_parent_keys_are_remappable() {
        let tree = ExpandingTree::from_config(json!({
            "idKey": "key",
            "parentKey": "owner",
            "data": [
                { "key": 10, "label": "Ten", "owner": null },
                { "key": 11, "label": "Eleven", "owner": 10 }
            ]
        }))
        .unwrap();
        assert_eq!(tree.forest()[0].id, "10");
        assert_eq!(tree.forest()[0].children[0].label, "Eleven");
    }

    #[test]
    fn theme_reaches_every_live_tree() {
        let mut broadcaster = ThemeBroadcaster::new(Theme::Light);
        let mut first = sample_tree();
        let mut second = sample_tree();
        first.attach_theme(broadcaster.subscribe());
        second.attach_theme(broadcaster.subscribe());
        let content = first.forest().to_vec();

        broadcaster.set(Theme::Dark);
        assert!(first.sync_theme());
        assert!(second.sync_theme());

        assert_eq!(first.theme(), Theme::Dark);
        assert_eq!(second.theme(), Theme::Dark);
        assert_eq!(first.forest(), content.as_slice());
        assert_eq!(first.generation(), 1);
        assert_eq!(
            first.take_events(),
            vec![ExpandingTreeEvent::ThemeApplied { theme: Theme::Dark }]
        );
    }

    #[test]
    fn ui_applies_pending_theme() {
        let mut broadcaster = ThemeBroadcaster::new(Theme::Light);
        let mut tree = sample_tree();
        tree.attach_theme(broadcaster.subscribe());
        broadcaster.set(Theme::Dark);

        let events = run_frame(&mut tree);
        assert_eq!(tree.theme(), Theme::Dark);
        assert!(events.contains(&ExpandingTreeEvent::ThemeApplied { theme: Theme::Dark }));
        assert!(run_frame(&mut tree).is_empty());
    }

    #[test]
    fn html_reflects_theme_and_content() {
        let mut tree = sample_tree();
        tree.set_theme(Theme::Dark);
        let html = tree.to_html();
        assert!(html.contains("data-theme=\"dark\""));
        assert_eq!(html.matches("<details").count(), 9);
    }

    #[test]
    fn nested_json_uses_children_key() {
        let mut tree = sample_tree();
        tree.configure(json!({ "childrenKey": "kids" })).unwrap();
        let nested = tree.to_nested_json().unwrap();

        let root = &nested[0];
        assert_eq!(root["id"], json!("1"));
        assert_eq!(root["title"], json!("Title 1"));
        assert_eq!(root["kids"][0]["id"], json!("2"));
        assert_eq!(root["kids"][1]["kids"][0]["id"], json!("9"));
        assert_eq!(root["kids"][0]["kids"][0]["kids"][1]["id"], json!("5"));
    }

    #[test]
    fn expanded_nodes_render_actions_and_nest() {
        let ctx = Context::default();
        let mut tree = sample_tree();
        for id in ["1", "2", "3", "4", "5", "6", "7", "8", "9"] {
            tree.expand_node(&ctx, id);
        }
        let texts = frame_texts(&ctx, &mut tree);

        for action in NodeAction::ALL {
            assert_eq!(count_text(&texts, action.icon()), 9);
        }
        assert!(text_x(&texts, "Node 1") < text_x(&texts, "Node 2"));
        assert!(text_x(&texts, "Node 2") < text_x(&texts, "Node 3"));
        assert!(text_x(&texts, "Node 3") < text_x(&texts, "Node 4"));
        assert!(text_x(&texts, "Node 6") < text_x(&texts, "Node 7"));
        assert!((text_x(&texts, "Node 2") - text_x(&texts, "Node 8")).abs() < 0.5);
        assert!((text_x(&texts, "Node 4") - text_x(&texts, "Node 5")).abs() < 0.5);
    }

    #[test]
    fn collapsed_nodes_hide_their_body() {
        let ctx = Context::default();
        let mut tree = sample_tree();
        tree.expand_node(&ctx, "1");
        let texts = frame_texts(&ctx, &mut tree);

        assert_eq!(count_text(&texts, NodeAction::Edit.icon()), 1);
        assert_eq!(count_text(&texts, "Node 2"), 1);
        assert_eq!(count_text(&texts, "Node 3"), 0);
    }

    #[test]
    fn theme_keeps_and_reconfigure_resets_expansion() {
        let ctx = Context::default();
        let mut tree = sample_tree();
        let id = header_id((tree.instance, tree.generation), "2");
        let mut state = CollapsingState::load_with_default_open(&ctx, id, false);
        state.set_open(true);
        state.store(&ctx);
        tree.expand_node(&ctx, "1");

        let mut before: Vec<String> = frame_texts(&ctx, &mut tree).into_iter().map(|(t, _)| t).collect();
        tree.set_theme(Theme::Dark);
        let mut after: Vec<String> = frame_texts(&ctx, &mut tree).into_iter().map(|(t, _)| t).collect();
        before.sort();
        after.sort();

        assert!(tree.is_expanded(&ctx, "1"));
        assert!(tree.is_expanded(&ctx, "2"));
        assert_eq!(before, after);
        assert_eq!(count_text(&frame_texts(&ctx, &mut tree), NodeAction::Add.icon()), 2);

        tree.configure(json!({})).unwrap();
        assert!(!tree.is_expanded(&ctx, "1"));
        assert!(!tree.is_expanded(&ctx, "2"));
        let texts = frame_texts(&ctx, &mut tree);
        assert_eq!(count_text(&texts, NodeAction::Add.icon()), 0);
        assert_eq!(count_text(&texts, "Node 1"), 1);
        assert_eq!(count_text(&texts, "Node 2"), 0);
    }

    #[test]
    fn collapse_node_closes_an_expanded_node() {
        let ctx = Context::default();
        let tree = sample_tree();
        tree.expand_node(&ctx, "8");
        assert!(tree.is_expanded(&ctx, "8"));
        tree.collapse_node(&ctx, "8");
        assert!(!tree.is_expanded(&ctx, "8"));
    }

    #[test]
    fn deep_chain_configures_without_overflow() {
        let depth = 100_000;
        let mut tree = ExpandingTree::from_config(json!({ "data": chain_data(depth) })).unwrap();

        assert_eq!(tree.forest().len(), 1);
        let deepest = depth - 1;
        let leaf = crate::description::find(tree.forest(), &deepest.to_string()).unwrap();
        assert_eq!(leaf.label, format!("Level {}", deepest));
        assert_eq!(tree.to_html().matches("<details").count(), depth);

        // 重新配置会丢弃整棵深树
        tree.configure(json!({ "data": sample_data() })).unwrap();
        assert_eq!(tree.forest()[0].children.len(), 2);
    }

    #[test]
    fn nested_json_refuses_trees_beyond_limit() {
        let tree = ExpandingTree::from_config(json!({
            "data": chain_data(NESTED_JSON_MAX_DEPTH + 1)
        }))
        .unwrap();
        match tree.to_nested_json() {
            Err(TreeError::TooDeep { depth, limit }) => {
                assert_eq!(depth, NESTED_JSON_MAX_DEPTH + 1);
                assert_eq!(limit, NESTED_JSON_MAX_DEPTH);
            }
            other => panic!("expected depth error, got {:?}", other.map(|_| ())),
        }

        let within = ExpandingTree::from_config(json!({
            "data": chain_data(NESTED_JSON_MAX_DEPTH)
        }))
        .unwrap();
        assert!(within.to_nested_json().is_ok());
    }
}
