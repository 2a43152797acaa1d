use super::window::{MonitorIndex, WindowId, WindowInfo, WorkspaceIndex};
use std::collections::HashMap;

/// Рабочий стол и его окна в порядке «сверху вниз» (последнее сфокусированное первым)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Workspace {
    pub name: String,
    /// Монитор, которому принадлежит стол. None - стол растянут на все мониторы
    pub monitor: Option<MonitorIndex>,
    /// Показан сейчас на своём мониторе
    pub visible: bool,
    pub windows: Vec<WindowId>,
}

/// Согласованный снимок состояния оконного менеджера.
///
/// Снимок читается один раз на каждую оценку или попытку перемещения и никогда
/// не кэшируется между ними: количество и порядок мониторов могут измениться
/// в любой момент.
#[derive(Debug, Clone, Default)]
pub struct DesktopSnapshot {
    pub focused: Option<WindowId>,
    pub primary_monitor: MonitorIndex,
    pub monitor_count: usize,
    pub active_workspace: WorkspaceIndex,
    /// Рабочие столы в порядке индексов
    pub workspaces: Vec<Workspace>,
    pub windows: HashMap<WindowId, WindowInfo>,
}

impl DesktopSnapshot {
    pub fn window(&self, id: WindowId) -> Option<&WindowInfo> {
        self.windows.get(&id)
    }

    pub fn focused_window(&self) -> Option<&WindowInfo> {
        self.focused.and_then(|id| self.window(id))
    }

    pub fn monitor_of(&self, id: WindowId) -> Option<MonitorIndex> {
        self.window(id).map(|w| w.monitor)
    }

    /// То, что пользователь видит как «рабочий стол»: сам стол и, если он
    /// принадлежит одному монитору, видимые столы остальных мониторов
    pub fn desktop_view(&self, workspace: WorkspaceIndex) -> Vec<WorkspaceIndex> {
        let Some(ws) = self.workspaces.get(workspace) else {
            return Vec::new();
        };

        let mut view = vec![workspace];
        if let Some(monitor) = ws.monitor {
            view.extend(
                self.workspaces
                    .iter()
                    .enumerate()
                    .filter(|(idx, other)| {
                        *idx != workspace
                            && other.visible
                            && other.monitor.is_some_and(|m| m != monitor)
                    })
                    .map(|(idx, _)| idx),
            );
        }
        view
    }

    /// Окна из списка переключения для `desktop_view`, стол за столом в порядке стека
    pub fn view_tab_list(&self, workspace: WorkspaceIndex) -> Vec<&WindowInfo> {
        self.desktop_view(workspace)
            .into_iter()
            .flat_map(|ws| self.tab_list(ws))
            .collect()
    }

    /// Окна рабочего стола из списка переключения, в порядке стека
    pub fn tab_list(&self, workspace: WorkspaceIndex) -> Vec<&WindowInfo> {
        let Some(ws) = self.workspaces.get(workspace) else {
            return Vec::new();
        };

        ws.windows
            .iter()
            .filter_map(|id| self.window(*id))
            .filter(|w| w.window_type.in_tab_list())
            .collect()
    }
}

/// Построитель снимков для тестов
#[cfg(test)]
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    snapshot: DesktopSnapshot,
}

#[cfg(test)]
impl SnapshotBuilder {
    pub fn new(monitor_count: usize) -> Self {
        Self {
            snapshot: DesktopSnapshot {
                monitor_count,
                ..DesktopSnapshot::default()
            },
        }
    }

    pub fn primary(mut self, primary: MonitorIndex) -> Self {
        self.snapshot.primary_monitor = primary;
        self
    }

    /// Стол, растянутый на все мониторы
    pub fn workspace(mut self, name: impl Into<String>) -> Self {
        self.snapshot.workspaces.push(Workspace {
            name: name.into(),
            ..Workspace::default()
        });
        self
    }

    /// Стол одного монитора, как в sway
    pub fn output_workspace(
        mut self,
        name: impl Into<String>,
        monitor: MonitorIndex,
        visible: bool,
    ) -> Self {
        self.snapshot.workspaces.push(Workspace {
            name: name.into(),
            monitor: Some(monitor),
            visible,
            windows: Vec::new(),
        });
        self
    }

    pub fn active(mut self, workspace: WorkspaceIndex) -> Self {
        self.snapshot.active_workspace = workspace;
        self
    }

    /// Добавляет окно в конец стека его рабочего стола
    pub fn window(mut self, window: WindowInfo) -> Self {
        if let Some(ws) = window
            .workspace
            .and_then(|idx| self.snapshot.workspaces.get_mut(idx))
        {
            ws.windows.push(window.id);
        }
        self.snapshot.windows.insert(window.id, window);
        self
    }

    pub fn focused(mut self, id: WindowId) -> Self {
        self.snapshot.focused = Some(id);
        self
    }

    pub fn build(self) -> DesktopSnapshot {
        self.snapshot
    }
}
