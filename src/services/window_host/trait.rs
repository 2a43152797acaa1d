use crate::config::Config;
use crate::error::Result;
use crate::events::{DesktopSnapshot, HostEvent, MonitorIndex, WindowId};
use crate::services::SwapLock;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::sway::SwayHost;
use super::sway_events::SwayEventSource;

/// Чтение состояния оконного менеджера
pub trait WindowQuery: Send + Sync {
    /// Согласованный снимок мониторов, рабочих столов и окон
    fn snapshot(&self) -> Result<DesktopSnapshot>;
}

/// Изменения состояния оконного менеджера
pub trait WindowMover: Send + Sync {
    fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()>;

    /// Вернуть окну фокус ввода
    fn activate(&self, window: WindowId) -> Result<()>;
}

pub trait WindowHost: WindowQuery + WindowMover {}

impl<T: WindowQuery + WindowMover> WindowHost for T {}

/// Источник уведомлений о фокусе и порядке окон
#[async_trait::async_trait]
pub trait HostEventSource {
    /// Пересылает уведомления до остановки источника.
    /// Пока `swap_lock` захвачен, уведомления отбрасываются.
    async fn run(
        self: Box<Self>,
        events: mpsc::UnboundedSender<HostEvent>,
        swap_lock: SwapLock,
    ) -> Result<()>;
}

/// Создание адаптера sway и источника его событий
pub fn create_window_host(
    config: &Config,
    dry_run: bool,
) -> Result<(Arc<dyn WindowHost>, Box<dyn HostEventSource + Send>)> {
    let host = SwayHost::new(&config.sway, dry_run);
    host.check_ipc()?;

    Ok((
        Arc::new(host),
        Box::new(SwayEventSource::new(&config.sway)),
    ))
}
