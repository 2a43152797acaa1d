use crate::events::{
    AppIdentity, DesktopSnapshot, MonitorIndex, WindowId, WindowInfo, WindowType, Workspace,
    WorkspaceIndex,
};
use serde::Deserialize;
use std::collections::HashMap;

/// Служебный выход sway, на котором живёт scratchpad
const SCRATCH_OUTPUT: &str = "__i3";

/// Ответ `swaymsg -t get_outputs`
#[derive(Debug, Clone, Deserialize)]
pub struct SwayOutput {
    pub name: String,
    #[serde(default)]
    pub active: bool,
}

/// Ответ `swaymsg -t get_workspaces`
#[derive(Debug, Clone, Deserialize)]
pub struct SwayWorkspace {
    pub name: String,
    #[serde(default)]
    pub focused: bool,
    /// Показан на своём выходе (у каждого выхода ровно один видимый стол)
    #[serde(default)]
    pub visible: bool,
}

/// Ответ на `swaymsg <command>`
#[derive(Debug, Clone, Deserialize)]
pub struct CommandReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowProperties {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub window_type: Option<String>,
}

/// Узел дерева `swaymsg -t get_tree`
#[derive(Debug, Clone, Deserialize)]
pub struct SwayNode {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub focused: bool,
    /// Дочерние id в порядке фокуса (последний сфокусированный первым)
    #[serde(default)]
    pub focus: Vec<u64>,
    #[serde(default)]
    pub nodes: Vec<SwayNode>,
    #[serde(default)]
    pub floating_nodes: Vec<SwayNode>,
    #[serde(default)]
    pub fullscreen_mode: u8,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub pid: Option<u32>,
    #[serde(default)]
    pub window_properties: Option<WindowProperties>,
}

impl SwayNode {
    /// Лист дерева с клиентом (wayland или xwayland)
    fn is_window(&self) -> bool {
        self.nodes.is_empty()
            && self.floating_nodes.is_empty()
            && matches!(self.node_type.as_str(), "con" | "floating_con")
            && (self.app_id.is_some() || self.window_properties.is_some() || self.pid.is_some())
    }

    /// Дочерние узлы в порядке фокуса; не упомянутые в `focus` идут в конце
    fn children_by_focus(&self) -> Vec<&SwayNode> {
        let children: Vec<&SwayNode> = self.nodes.iter().chain(self.floating_nodes.iter()).collect();

        let mut ordered: Vec<&SwayNode> = self
            .focus
            .iter()
            .filter_map(|id| children.iter().copied().find(|child| child.id == *id))
            .collect();

        for child in children {
            if !self.focus.contains(&child.id) {
                ordered.push(child);
            }
        }

        ordered
    }

    fn to_window_info(&self, monitor: MonitorIndex, workspace: WorkspaceIndex) -> WindowInfo {
        let props = self.window_properties.clone().unwrap_or_default();

        let mut identity = AppIdentity::new();
        identity.app_id = self.app_id.clone();
        identity.wm_class = props.class;
        identity.wm_class_instance = props.instance;

        let window_type = props
            .window_type
            .as_deref()
            .map(WindowType::from_x11_name)
            .unwrap_or(WindowType::Normal);

        WindowInfo::new(WindowId(self.id), monitor)
            .with_title(self.name.clone().unwrap_or_default())
            .with_workspace(workspace)
            .with_type(window_type)
            .with_fullscreen(self.fullscreen_mode != 0)
            .with_identity(identity)
    }
}

/// Сборка снимка из трёх ответов swaymsg.
///
/// Индексы мониторов - позиции активных выходов в порядке `get_outputs`.
/// Основной монитор - выход `primary_output`, если он активен, иначе индекс 0.
/// Каждый стол привязан к своему выходу; стол без окон в дереве может остаться без монитора.
pub fn build_snapshot(
    outputs: &[SwayOutput],
    workspaces: &[SwayWorkspace],
    tree: &SwayNode,
    primary_output: &str,
) -> DesktopSnapshot {
    let output_names: Vec<&str> = outputs
        .iter()
        .filter(|o| o.active)
        .map(|o| o.name.as_str())
        .collect();

    let primary_monitor = output_names
        .iter()
        .position(|name| !primary_output.is_empty() && *name == primary_output)
        .map(MonitorIndex)
        .unwrap_or_default();

    let mut snapshot = DesktopSnapshot {
        focused: None,
        primary_monitor,
        monitor_count: output_names.len(),
        active_workspace: workspaces.iter().position(|ws| ws.focused).unwrap_or(0),
        workspaces: workspaces
            .iter()
            .map(|ws| Workspace {
                name: ws.name.clone(),
                monitor: None,
                visible: ws.visible,
                windows: Vec::new(),
            })
            .collect(),
        windows: HashMap::new(),
    };

    let workspace_index: HashMap<&str, WorkspaceIndex> = workspaces
        .iter()
        .enumerate()
        .map(|(idx, ws)| (ws.name.as_str(), idx))
        .collect();

    for output in tree.nodes.iter().filter(|n| n.node_type == "output") {
        let output_name = output.name.as_deref().unwrap_or_default();
        if output_name == SCRATCH_OUTPUT {
            continue;
        }
        let Some(monitor) = output_names.iter().position(|name| *name == output_name) else {
            continue;
        };

        for ws_node in output.nodes.iter().filter(|n| n.node_type == "workspace") {
            let Some(&ws_idx) = ws_node
                .name
                .as_deref()
                .and_then(|name| workspace_index.get(name))
            else {
                continue;
            };

            snapshot.workspaces[ws_idx].monitor = Some(MonitorIndex(monitor));

            let mut stack = Vec::new();
            collect_windows(ws_node, &mut stack);

            for node in stack {
                if node.focused {
                    snapshot.focused = Some(WindowId(node.id));
                }
                snapshot.workspaces[ws_idx].windows.push(WindowId(node.id));
                snapshot
                    .windows
                    .insert(WindowId(node.id), node.to_window_info(MonitorIndex(monitor), ws_idx));
            }
        }
    }

    snapshot
}

/// Обход в глубину с учётом порядка фокуса в каждом контейнере
fn collect_windows<'a>(node: &'a SwayNode, out: &mut Vec<&'a SwayNode>) {
    for child in node.children_by_focus() {
        if child.is_window() {
            out.push(child);
        } else {
            collect_windows(child, out);
        }
    }
}
