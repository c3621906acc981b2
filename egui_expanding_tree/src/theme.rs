//! 主题同步
//!
//! 宿主持有一个 [`ThemeBroadcaster`]，每个树组件通过 [`ThemeReceiver`] 接收主题变化。
//! 组件被丢弃后对应的发送端会在下一次广播时被清理。

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            Theme::Light => egui::Visuals::light(),
            Theme::Dark => egui::Visuals::dark(),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme `{0}`")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// 主题广播（宿主侧）
pub struct ThemeBroadcaster {
    current: Theme,
    subscribers: Vec<Sender<Theme>>,
}

impl ThemeBroadcaster {
    pub fn new(initial: Theme) -> Self {
        Self {
            current: initial,
            subscribers: Vec::new(),
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    /// 新的接收端会立即收到当前主题
    pub fn subscribe(&mut self) -> ThemeReceiver {
        let (sender, receiver) = unbounded();
        let _ = sender.send(self.current);
        self.subscribers.push(sender);
        ThemeReceiver { receiver }
    }

    /// 广播主题，返回仍然存活的订阅者数量
    pub fn set(&mut self, theme: Theme) -> usize {
        self.current = theme;
        let before = self.subscribers.len();
        self.subscribers.retain(|sender| sender.send(theme).is_ok());
        let pruned = before - self.subscribers.len();
        if pruned > 0 {
            log::debug!("theme broadcaster dropped {} disconnected subscribers", pruned);
        }
        log::info!("theme set to {}", theme);
        self.subscribers.len()
    }

    pub fn toggle(&mut self) -> Theme {
        let next = self.current.toggled();
        self.set(next);
        next
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Default for ThemeBroadcaster {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

/// 主题接收端（组件侧）
pub struct ThemeReceiver {
    receiver: Receiver<Theme>,
}

impl ThemeReceiver {
    /// 取出所有待处理的主题，只返回最后一个
    pub fn latest(&self) -> Option<Theme> {
        self.receiver.try_iter().last()
    }
}
