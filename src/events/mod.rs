pub mod desktop;
pub mod window;

use std::fmt;

pub use desktop::{DesktopSnapshot, Workspace};
pub use window::{AppIdentity, MonitorIndex, WindowId, WindowInfo, WindowType, WorkspaceIndex};

/// Уведомление оконного менеджера, запускающее цикл debounce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    /// Сменилось окно в фокусе
    FocusChanged,
    /// Изменился порядок окон (перемещение, новое/закрытое окно, смена рабочего стола)
    StackingChanged,
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostEvent::FocusChanged => write!(f, "focus-changed"),
            HostEvent::StackingChanged => write!(f, "stacking-changed"),
        }
    }
}
