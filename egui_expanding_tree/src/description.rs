//! 渲染描述
//!
//! 森林 → 与渲染介质无关的折叠项描述树。egui 和 HTML 两种输出都只读这棵树。

use crate::builder::TreeNode;

/// 每个折叠项上的操作按钮，仅用于展示，没有绑定任何行为
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeAction {
    Add,
    Edit,
    Delete,
}

impl NodeAction {
    pub const ALL: [NodeAction; 3] = [NodeAction::Add, NodeAction::Edit, NodeAction::Delete];

    pub fn icon(self) -> &'static str {
        match self {
            NodeAction::Add => "➕",
            NodeAction::Edit => "✏",
            NodeAction::Delete => "🗑",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            NodeAction::Add => "Add",
            NodeAction::Edit => "Edit",
            NodeAction::Delete => "Delete",
        }
    }
}

/// 一个折叠项
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Disclosure {
    pub id: String,
    pub label: String,
    pub children: Vec<Disclosure>,
}

impl Disclosure {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn actions(&self) -> &'static [NodeAction] {
        &NodeAction::ALL
    }

    /// 深度优先查找
    pub fn find(&self, id: &str) -> Option<&Disclosure> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
        }
        None
    }
}

impl Drop for Disclosure {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

pub fn describe<R>(forest: &[TreeNode<'_, R>]) -> Vec<Disclosure> {
    forest.iter().map(describe_node).collect()
}

fn shell<R>(node: &TreeNode<'_, R>) -> Disclosure {
    Disclosure {
        id: node.id.clone(),
        label: node.label.clone(),
        children: Vec::with_capacity(node.children.len()),
    }
}

/// 与构建器相同的显式栈组装
fn describe_node<R>(root: &TreeNode<'_, R>) -> Disclosure {
    let mut stack = Vec::new();
    let mut current = (shell(root), root.children.iter());
    loop {
        match current.1.next() {
            Some(child) => {
                let next = (shell(child), child.children.iter());
                stack.push(std::mem::replace(&mut current, next));
            }
            None => match stack.pop() {
                Some(mut parent) => {
                    parent.0.children.push(current.0);
                    current = parent;
                }
                None => return current.0,
            },
        }
    }
}

/// 在森林中查找
pub fn find<'a>(forest: &'a [Disclosure], id: &str) -> Option<&'a Disclosure> {
    forest.iter().find_map(|root| root.find(id))
}
