//! 扁平记录 → 树（森林）
//!
//! 两遍扫描：先按标识建立索引，再按输入顺序把每条记录挂到父节点或根列表上。
//! 整体 O(n)。

use crate::error::TreeError;
use crate::structure::TreeRecord;
use std::borrow::Cow;
use std::collections::HashMap;

/// 树节点：借用原始记录，附带有序的子节点
#[derive(Debug)]
pub struct TreeNode<'a, R> {
    pub record: &'a R,
    pub id: String,
    pub label: String,
    pub children: Vec<TreeNode<'a, R>>,
}

impl<R> TreeNode<'_, R> {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// 子树中的节点总数（含自身）
    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        let mut stack = vec![self];
        let mut total = 0;
        while let Some(node) = stack.pop() {
            total += 1;
            stack.extend(node.children.iter());
        }
        total
    }
}

// 深层链路下默认的递归析构会耗尽栈空间
impl<R> Drop for TreeNode<'_, R> {
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    Unvisited,
    InProgress,
    Done,
}

/// 构建森林
///
/// - 根节点和兄弟节点的顺序与输入中的相对顺序一致
/// - 父标识指向不存在的记录时，该记录（及其后代）被静默丢弃
/// - 没有标识的记录被跳过
/// - 重复标识返回 [`TreeError::DuplicateId`]，环返回 [`TreeError::CycleDetected`]
pub fn build_forest<R: TreeRecord>(records: &[R]) -> Result<Vec<TreeNode<'_, R>>, TreeError> {
    // 第一遍：索引必须完整建立后才能链接，子节点可能出现在父节点之前
    let mut index: HashMap<Cow<'_, str>, usize> = HashMap::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        if let Some(id) = record.id() {
            if index.contains_key(id.as_ref()) {
                return Err(TreeError::DuplicateId(id.into_owned()));
            }
            index.insert(id, position);
        }
    }

    // 第二遍：按输入顺序链接
    let mut roots = Vec::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut parent_of: Vec<Option<usize>> = vec![None; records.len()];
    let mut dropped = 0usize;
    for (position, record) in records.iter().enumerate() {
        if record.id().is_none() {
            dropped += 1;
            continue;
        }
        match record.parent_id() {
            None => roots.push(position),
            Some(parent) => match index.get(parent.as_ref()) {
                Some(&parent_position) => {
                    children[parent_position].push(position);
                    parent_of[position] = Some(parent_position);
                }
                None => dropped += 1,
            },
        }
    }

    if let Some(position) = find_cycle(&parent_of) {
        let id = records[position].id().map(Cow::into_owned).unwrap_or_default();
        return Err(TreeError::CycleDetected(id));
    }

    let forest: Vec<_> = roots
        .into_iter()
        .map(|position| materialize(records, &children, position))
        .collect();

    log::debug!(
        "built forest: {} records, {} roots, {} skipped",
        records.len(),
        forest.len(),
        dropped
    );
    Ok(forest)
}

/// 沿父链向上检查；返回环上任意一个节点的位置
fn find_cycle(parent_of: &[Option<usize>]) -> Option<usize> {
    let mut state = vec![Visit::Unvisited; parent_of.len()];
    let mut chain = Vec::new();

    for start in 0..parent_of.len() {
        let mut current = Some(start);
        while let Some(position) = current {
            match state[position] {
                Visit::Done => break,
                Visit::InProgress => return Some(position),
                Visit::Unvisited => {
                    state[position] = Visit::InProgress;
                    chain.push(position);
                    current = parent_of[position];
                }
            }
        }
        for position in chain.drain(..) {
            state[position] = Visit::Done;
        }
    }
    None
}

fn new_node<R: TreeRecord>(record: &R, child_count: usize) -> TreeNode<'_, R> {
    TreeNode {
        record,
        id: record.id().map(Cow::into_owned).unwrap_or_default(),
        label: record.label().into_owned(),
        children: Vec::with_capacity(child_count),
    }
}

/// 自底向上组装子树，使用显式栈，深度不受调用栈限制
fn materialize<'a, R: TreeRecord>(
    records: &'a [R],
    children: &[Vec<usize>],
    root: usize,
) -> TreeNode<'a, R> {
    let mut stack = Vec::new();
    let mut current = (
        new_node(&records[root], children[root].len()),
        children[root].iter(),
    );
    loop {
        match current.1.next() {
            Some(&child) => {
                let next = (
                    new_node(&records[child], children[child].len()),
                    children[child].iter(),
                );
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
