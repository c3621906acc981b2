//! HTML 导出
//!
//! 把折叠项描述输出为嵌套的 `<details>` 元素。标签、标识和 class 名在插入前都会转义。

use crate::config::ClassNames;
use crate::description::Disclosure;
use crate::theme::Theme;

fn html_escape(value: &str) -> String {
    v_htmlescape::escape(value).to_string()
}

pub fn render_html(forest: &[Disclosure], theme: Theme, classes: &ClassNames) -> String {
    let mut html = String::new();
    html.push_str(&format!(
        "<div class=\"{}\" data-theme=\"{}\">\n",
        html_escape(&classes.container),
        theme.as_str()
    ));
    for root in forest {
        render_disclosure(&mut html, root, classes);
    }
    html.push_str("</div>\n");
    html
}

/// 深度优先输出；开标签在入栈时写入，闭标签在出栈时写入
fn render_disclosure(html: &mut String, root: &Disclosure, classes: &ClassNames) {
    open_disclosure(html, root, classes);
    let mut stack = vec![(root, root.children.iter())];
    while let Some((node, pending)) = stack.last_mut() {
        let node = *node;
        match pending.next() {
            Some(child) => {
                open_disclosure(html, child, classes);
                stack.push((child, child.children.iter()));
            }
            None => {
                close_disclosure(html, node);
                stack.pop();
            }
        }
    }
}

fn open_disclosure(html: &mut String, node: &Disclosure, classes: &ClassNames) {
    html.push_str(&format!(
        "<details class=\"{}\" data-id=\"{}\">\n",
        html_escape(&classes.item),
        html_escape(&node.id)
    ));
    html.push_str(&format!(
        "<summary class=\"{}\">{}</summary>\n",
        html_escape(&classes.item_label),
        html_escape(&node.label)
    ));

    html.push_str(&format!("<div class=\"{}\">", html_escape(&classes.item_actions)));
    for action in node.actions() {
        html.push_str(&format!(
            "<button type=\"button\" title=\"{}\">{}</button>",
            action.title(),
            action.icon()
        ));
    }
    html.push_str("</div>\n");

    if node.is_leaf() {
        html.push_str(&format!(
            "<div class=\"{} {}\"></div>\n",
            html_escape(&classes.item_children),
            html_escape(&classes.item_children_hidden)
        ));
    } else {
        html.push_str(&format!(
            "<div class=\"{}\">\n",
            html_escape(&classes.item_children)
        ));
    }
}

fn close_disclosure(html: &mut String, node: &Disclosure) {
    if !node.is_leaf() {
        html.push_str("</div>\n");
    }
    html.push_str("</details>\n");
}
