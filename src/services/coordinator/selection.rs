use crate::config::{Config, ScopeMode, SwapMode, TargetMonitorMode};
use crate::events::{DesktopSnapshot, MonitorIndex, WindowId, WindowInfo};
use crate::services::debouncer::EvaluationSerial;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Почему оценка завершилась без перемещения
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoFocusedWindow,
    DesktopWindow,
    Fullscreen,
    Blocklisted,
    AlreadyOnTarget,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SkipReason::NoFocusedWindow => "нет окна в фокусе",
            SkipReason::DesktopWindow => "окно рабочего стола",
            SkipReason::Fullscreen => "полноэкранное окно",
            SkipReason::Blocklisted => "приложение в blocklist",
            SkipReason::AlreadyOnTarget => "окно уже на целевом мониторе",
        };
        write!(f, "{}", text)
    }
}

/// Всё, что нужно цепочке попыток; фиксируется в момент оценки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPlan {
    pub serial: EvaluationSerial,
    pub incoming: WindowId,
    pub outgoing: Option<WindowId>,
    /// Монитор, с которого пришло окно в фокусе; сюда уезжает резидент
    pub incoming_monitor: MonitorIndex,
    pub target: MonitorIndex,
    pub mode: SwapMode,
    pub retry_count: u32,
    pub retry_delay: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Skip(SkipReason),
    Move(SwapPlan),
}

/// Целевой монитор. Фиксированный индекс вне диапазона молча заменяется основным
pub fn resolve_target(config: &Config, snapshot: &DesktopSnapshot) -> MonitorIndex {
    if config.swap.target_monitor == TargetMonitorMode::Fixed {
        let fixed = MonitorIndex(config.swap.fixed_target_monitor);
        if fixed.is_valid_for(snapshot.monitor_count) {
            return fixed;
        }
    }
    snapshot.primary_monitor
}

/// Точное совпадение без учёта регистра с app id, классом или экземпляром класса
pub fn is_blocklisted(config: &Config, window: &WindowInfo) -> bool {
    if !config.has_blocklist() {
        return false;
    }
    window
        .identity
        .normalized()
        .iter()
        .any(|id| config.is_blocklisted_id(id))
}

/// Кандидаты в резиденты в порядке приоритета согласно `scope`.
///
/// Рабочий стол здесь - `desktop_view`: если столы принадлежат отдельным
/// мониторам, к столу добавляются видимые столы остальных мониторов.
pub fn candidate_windows<'a>(
    config: &Config,
    snapshot: &'a DesktopSnapshot,
    focused: &WindowInfo,
) -> Vec<&'a WindowInfo> {
    match config.swap.scope {
        ScopeMode::FocusedWorkspace => {
            let workspace = focused
                .workspace
                .filter(|ws| *ws < snapshot.workspaces.len())
                .unwrap_or(snapshot.active_workspace);
            snapshot.view_tab_list(workspace)
        }
        ScopeMode::ActiveWorkspace => snapshot.view_tab_list(snapshot.active_workspace),
        ScopeMode::AllWorkspaces => {
            let all = 0..snapshot.workspaces.len();
            let visible = all.clone().filter(|ws| snapshot.workspaces[*ws].visible);
            let hidden = all.filter(|ws| !snapshot.workspaces[*ws].visible);

            // Активный стол, затем видимые, затем скрытые
            let mut seen = HashSet::new();
            let mut windows = Vec::new();
            for workspace in snapshot
                .desktop_view(snapshot.active_workspace)
                .into_iter()
                .chain(visible)
                .chain(hidden)
            {
                for window in snapshot.tab_list(workspace) {
                    if seen.insert(window.id) {
                        windows.push(window);
                    }
                }
            }

            windows
        }
    }
}

/// Первый подходящий резидент целевого монитора
pub fn select_resident<'a>(
    config: &Config,
    snapshot: &'a DesktopSnapshot,
    focused: &WindowInfo,
    target: MonitorIndex,
) -> Option<&'a WindowInfo> {
    candidate_windows(config, snapshot, focused)
        .into_iter()
        .find(|w| {
            w.monitor == target
                && w.id != focused.id
                && !w.minimized
                && !w.is_desktop()
                && !(config.swap.ignore_fullscreen && w.fullscreen)
                && !is_blocklisted(config, w)
        })
}

pub fn plan_swap(config: &Config, snapshot: &DesktopSnapshot, serial: EvaluationSerial) -> Decision {
    let Some(focused) = snapshot.focused_window() else {
        return Decision::Skip(SkipReason::NoFocusedWindow);
    };

    if focused.is_desktop() {
        return Decision::Skip(SkipReason::DesktopWindow);
    }

    if config.swap.ignore_fullscreen && focused.fullscreen {
        return Decision::Skip(SkipReason::Fullscreen);
    }

    if is_blocklisted(config, focused) {
        return Decision::Skip(SkipReason::Blocklisted);
    }

    let target = resolve_target(config, snapshot);
    if focused.monitor == target {
        return Decision::Skip(SkipReason::AlreadyOnTarget);
    }

    let outgoing = match config.swap.mode {
        SwapMode::Push => None,
        SwapMode::Swap => select_resident(config, snapshot, focused, target).map(|w| w.id),
    };

    Decision::Move(SwapPlan {
        serial,
        incoming: focused.id,
        outgoing,
        incoming_monitor: focused.monitor,
        target,
        mode: config.swap.mode,
        retry_count: config.timing.retry_count,
        retry_delay: config.retry_delay(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::desktop::SnapshotBuilder;
    use crate::events::{AppIdentity, WindowType};

    const FOCUSED: WindowId = WindowId(1);
    const RESIDENT: WindowId = WindowId(2);

    fn win(id: u64, monitor: usize, workspace: usize) -> WindowInfo {
        WindowInfo::new(WindowId(id), MonitorIndex(monitor)).with_workspace(workspace)
    }

    fn two_monitor_desktop() -> DesktopSnapshot {
        SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 1, 0))
            .window(win(2, 0, 0))
            .focused(FOCUSED)
            .build()
    }

    fn plan(config: &Config, snapshot: &DesktopSnapshot) -> Decision {
        plan_swap(config, snapshot, EvaluationSerial(1))
    }

    fn expect_move(decision: Decision) -> SwapPlan {
        match decision {
            Decision::Move(plan) => plan,
            Decision::Skip(reason) => panic!("ожидалось перемещение, получено: {}", reason),
        }
    }

    #[test]
    fn test_swap_selects_resident_on_target() {
        let plan = expect_move(plan(&Config::default(), &two_monitor_desktop()));

        assert_eq!(plan.incoming, FOCUSED);
        assert_eq!(plan.outgoing, Some(RESIDENT));
        assert_eq!(plan.incoming_monitor, MonitorIndex(1));
        assert_eq!(plan.target, MonitorIndex(0));
        assert_eq!(plan.retry_count, 2);
        assert_eq!(plan.retry_delay, Duration::from_millis(120));
    }

    #[test]
    fn test_push_mode_has_no_outgoing() {
        let mut config = Config::default();
        config.swap.mode = SwapMode::Push;

        let plan = expect_move(plan(&config, &two_monitor_desktop()));
        assert_eq!(plan.outgoing, None);
        assert_eq!(plan.mode, SwapMode::Push);
    }

    #[test]
    fn test_already_on_target_is_noop() {
        let snapshot = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 0, 0))
            .focused(FOCUSED)
            .build();

        assert_eq!(
            plan(&Config::default(), &snapshot),
            Decision::Skip(SkipReason::AlreadyOnTarget)
        );
    }

    #[test]
    fn test_rejected_focused_windows() {
        let config = Config::default();

        let empty = SnapshotBuilder::new(2).workspace("1").build();
        assert_eq!(plan(&config, &empty), Decision::Skip(SkipReason::NoFocusedWindow));

        let desktop = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 1, 0).with_type(WindowType::Desktop))
            .focused(FOCUSED)
            .build();
        assert_eq!(plan(&config, &desktop), Decision::Skip(SkipReason::DesktopWindow));

        let fullscreen = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 1, 0).with_fullscreen(true))
            .focused(FOCUSED)
            .build();
        assert_eq!(plan(&config, &fullscreen), Decision::Skip(SkipReason::Fullscreen));

        let mut allow_fullscreen = Config::default();
        allow_fullscreen.swap.ignore_fullscreen = false;
        assert!(matches!(plan(&allow_fullscreen, &fullscreen), Decision::Move(_)));
    }

    #[test]
    fn test_blocklist_is_case_insensitive() {
        let config = Config::from_toml_str(
            r#"
            [swap]
            app_blocklist = ["OBS", "org.gnome.Terminal.desktop"]
            "#,
        )
        .unwrap();

        for identity in [
            AppIdentity::new().with_app_id("obs"),
            AppIdentity::new().with_wm_class("Obs"),
            AppIdentity::new().with_wm_class_instance("ORG.GNOME.TERMINAL.DESKTOP"),
        ] {
            let snapshot = SnapshotBuilder::new(2)
                .workspace("1")
                .window(win(1, 1, 0).with_identity(identity))
                .focused(FOCUSED)
                .build();
            assert_eq!(plan(&config, &snapshot), Decision::Skip(SkipReason::Blocklisted));
        }

        // подстрока не считается совпадением
        let snapshot = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 1, 0).with_identity(AppIdentity::new().with_app_id("obs-studio")))
            .focused(FOCUSED)
            .build();
        assert!(matches!(plan(&config, &snapshot), Decision::Move(_)));
    }

    #[test]
    fn test_fixed_target_falls_back_to_primary() {
        let mut config = Config::default();
        config.swap.target_monitor = TargetMonitorMode::Fixed;
        config.swap.fixed_target_monitor = 5;

        let snapshot = SnapshotBuilder::new(2)
            .primary(MonitorIndex(1))
            .workspace("1")
            .build();
        assert_eq!(resolve_target(&config, &snapshot), MonitorIndex(1));

        config.swap.fixed_target_monitor = 0;
        assert_eq!(resolve_target(&config, &snapshot), MonitorIndex(0));

        config.swap.target_monitor = TargetMonitorMode::Primary;
        assert_eq!(resolve_target(&config, &snapshot), MonitorIndex(1));
    }

    #[test]
    fn test_resident_filters() {
        let snapshot = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(3, 0, 0).with_minimized(true))
            .window(win(4, 0, 0).with_fullscreen(true))
            .window(win(5, 0, 0).with_type(WindowType::Dock))
            .window(win(6, 0, 0).with_identity(AppIdentity::new().with_app_id("vlc")))
            .window(win(1, 1, 0))
            .window(win(7, 0, 0))
            .focused(FOCUSED)
            .build();

        let mut config = Config::from_toml_str(
            r#"
            [swap]
            app_blocklist = ["vlc"]
            "#,
        )
        .unwrap();

        let chosen = expect_move(plan(&config, &snapshot));
        assert_eq!(chosen.outgoing, Some(WindowId(7)));

        config.swap.ignore_fullscreen = false;
        let chosen = expect_move(plan(&config, &snapshot));
        assert_eq!(chosen.outgoing, Some(WindowId(4)));
    }

    #[test]
    fn test_no_resident_means_push() {
        let snapshot = SnapshotBuilder::new(2)
            .workspace("1")
            .window(win(1, 1, 0))
            .window(win(2, 1, 0))
            .focused(FOCUSED)
            .build();

        let plan = expect_move(plan(&Config::default(), &snapshot));
        assert_eq!(plan.outgoing, None);
        assert_eq!(plan.mode, SwapMode::Swap);
    }

    fn three_workspaces() -> DesktopSnapshot {
        // Окно в фокусе на рабочем столе 0, активен рабочий стол 1,
        // единственный резидент целевого монитора - на рабочем столе 2
        SnapshotBuilder::new(2)
            .workspace("1")
            .workspace("2")
            .workspace("3")
            .active(1)
            .window(win(1, 1, 0))
            .window(win(10, 1, 1))
            .window(win(20, 0, 2))
            .focused(FOCUSED)
            .build()
    }

    #[test]
    fn test_active_workspace_scope_ignores_other_workspaces() {
        let mut config = Config::default();
        config.swap.scope = ScopeMode::ActiveWorkspace;

        let plan = expect_move(plan(&config, &three_workspaces()));
        assert_eq!(plan.outgoing, None);
    }

    #[test]
    fn test_focused_workspace_scope() {
        let mut config = Config::default();
        config.swap.scope = ScopeMode::FocusedWorkspace;
        let snapshot = three_workspaces();

        let ids: Vec<WindowId> = candidate_windows(&config, &snapshot, snapshot.focused_window().unwrap())
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![FOCUSED]);

        // окно без рабочего стола - берётся активный
        let orphan = win(99, 1, 0);
        let orphan = WindowInfo { workspace: None, ..orphan };
        let ids: Vec<WindowId> = candidate_windows(&config, &snapshot, &orphan)
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![WindowId(10)]);
    }

    #[test]
    fn test_all_workspaces_scope_order_and_dedup() {
        let mut config = Config::default();
        config.swap.scope = ScopeMode::AllWorkspaces;

        let mut snapshot = three_workspaces();
        // «липкое» окно, присутствующее на двух рабочих столах
        snapshot.workspaces[0].windows.push(WindowId(10));

        let ids: Vec<WindowId> = candidate_windows(&config, &snapshot, snapshot.focused_window().unwrap())
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![WindowId(10), FOCUSED, WindowId(20)]);

        let plan = expect_move(plan(&config, &snapshot));
        assert_eq!(plan.outgoing, Some(WindowId(20)));
    }

    /// Столы отдельных мониторов: «1» (монитор 0, скрыт), «2» (монитор 1, в фокусе),
    /// «3» (монитор 0, виден). Окно в фокусе на «2», резиденты на «1» и «3»
    fn per_output_workspaces() -> DesktopSnapshot {
        SnapshotBuilder::new(2)
            .output_workspace("1", MonitorIndex(0), false)
            .output_workspace("2", MonitorIndex(1), true)
            .output_workspace("3", MonitorIndex(0), true)
            .active(1)
            .window(win(11, 0, 0))
            .window(win(1, 1, 1))
            .window(win(31, 0, 2))
            .focused(FOCUSED)
            .build()
    }

    #[test]
    fn test_per_output_workspaces_swap_with_visible_resident() {
        let snapshot = per_output_workspaces();

        for scope in [
            ScopeMode::FocusedWorkspace,
            ScopeMode::ActiveWorkspace,
            ScopeMode::AllWorkspaces,
        ] {
            let mut config = Config::default();
            config.swap.scope = scope;

            let chosen = expect_move(plan(&config, &snapshot));
            assert_eq!(chosen.outgoing, Some(WindowId(31)), "scope {:?}", scope);
        }
    }

    #[test]
    fn test_all_workspaces_puts_hidden_last() {
        let mut config = Config::default();
        config.swap.scope = ScopeMode::AllWorkspaces;
        let snapshot = per_output_workspaces();

        let ids: Vec<WindowId> = candidate_windows(&config, &snapshot, snapshot.focused_window().unwrap())
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![FOCUSED, WindowId(31), WindowId(11)]);

        // скрытые столы в область стола в фокусе не входят
        config.swap.scope = ScopeMode::FocusedWorkspace;
        let mut hidden = snapshot.clone();
        hidden.workspaces[2].visible = false;
        assert_eq!(expect_move(plan(&config, &hidden)).outgoing, None);
    }
}
