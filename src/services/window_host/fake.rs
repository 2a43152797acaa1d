//! In-memory desktop used by the coordinator tests.

use crate::error::Result;
use crate::events::{DesktopSnapshot, MonitorIndex, WindowId};
use crate::swap_error;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use super::r#trait::{WindowMover, WindowQuery};

#[derive(Debug, Default)]
struct FakeState {
    snapshot: DesktopSnapshot,
    moves: Vec<(WindowId, MonitorIndex)>,
    activations: Vec<WindowId>,
    // Окна, которые «чужой» менеджер раскладки сразу возвращает на место
    pinned: HashMap<WindowId, MonitorIndex>,
    fail_moves: bool,
}

#[derive(Debug, Default)]
pub struct FakeDesktop {
    state: Mutex<FakeState>,
}

impl FakeDesktop {
    pub fn new(snapshot: DesktopSnapshot) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(FakeState {
                snapshot,
                ..FakeState::default()
            }),
        })
    }

    pub fn moves(&self) -> Vec<(WindowId, MonitorIndex)> {
        self.state.lock().moves.clone()
    }

    pub fn moves_of(&self, window: WindowId) -> usize {
        self.state
            .lock()
            .moves
            .iter()
            .filter(|(id, _)| *id == window)
            .count()
    }

    pub fn activations(&self) -> Vec<WindowId> {
        self.state.lock().activations.clone()
    }

    pub fn focused(&self) -> Option<WindowId> {
        self.state.lock().snapshot.focused
    }

    pub fn monitor_of(&self, window: WindowId) -> Option<MonitorIndex> {
        self.state.lock().snapshot.monitor_of(window)
    }

    pub fn set_focus(&self, window: WindowId) {
        self.state.lock().snapshot.focused = Some(window);
    }

    pub fn pin(&self, window: WindowId, monitor: MonitorIndex) {
        self.state.lock().pinned.insert(window, monitor);
    }

    pub fn set_fail_moves(&self, fail: bool) {
        self.state.lock().fail_moves = fail;
    }
}

impl WindowQuery for FakeDesktop {
    fn snapshot(&self) -> Result<DesktopSnapshot> {
        Ok(self.state.lock().snapshot.clone())
    }
}

impl WindowMover for FakeDesktop {
    fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        let mut state = self.state.lock();
        state.moves.push((window, monitor));

        if state.fail_moves {
            return Err(swap_error!(host, "перемещение {} отклонено", window));
        }

        let settled = state.pinned.get(&window).copied().unwrap_or(monitor);
        match state.snapshot.windows.get_mut(&window) {
            Some(info) => {
                info.monitor = settled;
                Ok(())
            }
            None => Err(swap_error!(window_not_found, "{}", window)),
        }
    }

    fn activate(&self, window: WindowId) -> Result<()> {
        let mut state = self.state.lock();
        state.activations.push(window);
        state.snapshot.focused = Some(window);
        Ok(())
    }
}
