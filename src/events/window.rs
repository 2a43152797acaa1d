use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Идентификатор окна оконного менеджера (в sway - con_id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

impl WindowId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Индекс монитора в диапазоне [0, monitor_count)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MonitorIndex(pub usize);

impl MonitorIndex {
    pub fn value(&self) -> usize {
        self.0
    }

    pub fn is_valid_for(&self, monitor_count: usize) -> bool {
        self.0 < monitor_count
    }
}

impl fmt::Display for MonitorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "monitor {}", self.0)
    }
}

/// Индекс рабочего стола в порядке, который сообщает оконный менеджер
pub type WorkspaceIndex = usize;

/// Тип окна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WindowType {
    #[default]
    Normal,
    Dialog,
    Utility,
    Desktop,
    Dock,
    Splash,
    Other,
}

impl WindowType {
    /// Разбор X11-типа окна (`_NET_WM_WINDOW_TYPE` без префикса)
    pub fn from_x11_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "normal" => Self::Normal,
            "dialog" => Self::Dialog,
            "utility" | "toolbar" | "menu" => Self::Utility,
            "desktop" => Self::Desktop,
            "dock" => Self::Dock,
            "splash" => Self::Splash,
            _ => Self::Other,
        }
    }

    /// Окна, попадающие в обычный список переключения (Alt+Tab)
    pub fn in_tab_list(&self) -> bool {
        matches!(self, Self::Normal | Self::Dialog | Self::Utility)
    }
}

/// Строки, идентифицирующие приложение окна
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppIdentity {
    pub app_id: Option<String>,
    pub wm_class: Option<String>,
    pub wm_class_instance: Option<String>,
}

impl AppIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_wm_class(mut self, class: impl Into<String>) -> Self {
        self.wm_class = Some(class.into());
        self
    }

    #[allow(dead_code)]
    pub fn with_wm_class_instance(mut self, instance: impl Into<String>) -> Self {
        self.wm_class_instance = Some(instance.into());
        self
    }

    /// Нормализованные (trim + lowercase) непустые идентификаторы
    pub fn normalized(&self) -> SmallVec<[String; 3]> {
        [&self.app_id, &self.wm_class, &self.wm_class_instance]
            .into_iter()
            .flatten()
            .map(|id| id.trim().to_lowercase())
            .filter(|id| !id.is_empty())
            .collect()
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids = self.normalized();
        if ids.is_empty() {
            write!(f, "unknown")
        } else {
            write!(f, "{}", ids.join("/"))
        }
    }
}

/// Информация об окне, прочитанная из оконного менеджера
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: String,
    pub monitor: MonitorIndex,
    pub workspace: Option<WorkspaceIndex>,
    pub window_type: WindowType,
    pub fullscreen: bool,
    pub minimized: bool,
    pub identity: AppIdentity,
}

impl WindowInfo {
    pub fn new(id: WindowId, monitor: MonitorIndex) -> Self {
        Self {
            id,
            title: String::new(),
            monitor,
            workspace: None,
            window_type: WindowType::Normal,
            fullscreen: false,
            minimized: false,
            identity: AppIdentity::default(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_workspace(mut self, workspace: WorkspaceIndex) -> Self {
        self.workspace = Some(workspace);
        self
    }

    pub fn with_type(mut self, window_type: WindowType) -> Self {
        self.window_type = window_type;
        self
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    #[allow(dead_code)]
    pub fn with_minimized(mut self, minimized: bool) -> Self {
        self.minimized = minimized;
        self
    }

    pub fn with_identity(mut self, identity: AppIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn is_desktop(&self) -> bool {
        self.window_type == WindowType::Desktop
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.title.is_empty() {
            write!(f, "{} ({})", self.id, self.identity)
        } else {
            write!(f, "{} \"{}\" ({})", self.id, self.title, self.identity)
        }
    }
}
