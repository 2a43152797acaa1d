use crate::config::SwayConfig;
use crate::error::Result;
use crate::events::HostEvent;
use crate::services::SwapLock;
use crate::{swap_error, trace_if_enabled};
use serde::Deserialize;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use super::r#trait::HostEventSource;

const SUBSCRIBED_EVENTS: &str = r#"["window","workspace"]"#;
const RESTART_DELAY: Duration = Duration::from_secs(10);

/// Событие из потока `swaymsg -t subscribe -m`
#[derive(Debug, Clone, Default, Deserialize)]
struct RawEvent {
    #[serde(default)]
    change: Option<String>,
    /// Есть только у событий окна
    #[serde(default)]
    container: Option<serde_json::Value>,
    /// Есть только у событий рабочего стола
    #[serde(default)]
    current: Option<serde_json::Value>,
    /// Первый ответ на саму подписку
    #[serde(default)]
    success: Option<bool>,
}

/// Сопоставление события sway с уведомлением для координатора
fn classify(event: &RawEvent) -> Option<HostEvent> {
    let change = event.change.as_deref()?;

    if event.container.is_some() {
        return match change {
            "focus" => Some(HostEvent::FocusChanged),
            "new" | "close" | "move" | "floating" | "fullscreen_mode" => {
                Some(HostEvent::StackingChanged)
            }
            _ => None,
        };
    }

    if event.current.is_some() {
        return match change {
            "focus" | "move" | "init" | "empty" => Some(HostEvent::StackingChanged),
            _ => None,
        };
    }

    None
}

/// Разбор потока JSON-значений, пришедшего произвольными кусками.
/// swaymsg может печатать одно событие в несколько строк.
#[derive(Debug, Default)]
struct EventStreamDecoder {
    buffer: Vec<u8>,
}

impl EventStreamDecoder {
    /// Возвращает все события, завершённые этим куском; хвост остаётся в буфере
    fn push(&mut self, chunk: &[u8]) -> Result<Vec<RawEvent>> {
        self.buffer.extend_from_slice(chunk);

        let mut decoded = Vec::new();
        let consumed = {
            let mut stream =
                serde_json::Deserializer::from_slice(&self.buffer).into_iter::<RawEvent>();
            let mut consumed = 0;
            loop {
                match stream.next() {
                    Some(Ok(raw)) => {
                        consumed = stream.byte_offset();
                        decoded.push(raw);
                    }
                    Some(Err(e)) if e.is_eof() => break,
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        consumed = stream.byte_offset();
                        break;
                    }
                }
            }
            consumed
        };

        self.buffer.drain(..consumed);
        Ok(decoded)
    }
}

pub struct SwayEventSource {
    swaymsg: String,
}

impl SwayEventSource {
    pub fn new(config: &SwayConfig) -> Self {
        Self {
            swaymsg: config.swaymsg.clone(),
        }
    }

    async fn run_impl(
        self,
        events: mpsc::UnboundedSender<HostEvent>,
        swap_lock: SwapLock,
    ) -> Result<()> {
        info!("Подписка на события sway: {}", SUBSCRIBED_EVENTS);

        loop {
            match self.subscribe_once(&events, &swap_lock).await {
                Ok(()) => warn!("Подписка swaymsg завершилась"),
                Err(e) => error!("Ошибка подписки swaymsg: {}", e),
            }

            if events.is_closed() {
                info!("Координатор остановлен, подписка больше не нужна");
                return Ok(());
            }

            warn!(
                "Переподключаемся к sway через {} секунд",
                RESTART_DELAY.as_secs()
            );
            sleep(RESTART_DELAY).await;
        }
    }

    async fn subscribe_once(
        &self,
        events: &mpsc::UnboundedSender<HostEvent>,
        swap_lock: &SwapLock,
    ) -> Result<()> {
        let mut child = Command::new(&self.swaymsg)
            .args(["-r", "-m", "-t", "subscribe", SUBSCRIBED_EVENTS])
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| swap_error!(internal, "stdout swaymsg недоступен"))?;

        let mut decoder = EventStreamDecoder::default();
        let mut chunk = [0u8; 8192];

        loop {
            let read = stdout.read(&mut chunk).await?;
            if read == 0 {
                return Ok(());
            }

            for raw in decoder.push(&chunk[..read])? {
                self.forward(&raw, events, swap_lock)?;
            }
        }
    }

    fn forward(
        &self,
        raw: &RawEvent,
        events: &mpsc::UnboundedSender<HostEvent>,
        swap_lock: &SwapLock,
    ) -> Result<()> {
        if let Some(success) = raw.success {
            if !success {
                return Err(swap_error!(host, "sway отклонил подписку"));
            }
            debug!("Подписка на события sway подтверждена");
            return Ok(());
        }

        let Some(event) = classify(raw) else {
            return Ok(());
        };

        if swap_lock.is_held() {
            trace_if_enabled!("Событие {} во время перемещения - пропускаем", event);
            return Ok(());
        }

        events
            .send(event)
            .map_err(|_| swap_error!(internal, "Канал событий координатора закрыт"))
    }
}

#[async_trait::async_trait]
impl HostEventSource for SwayEventSource {
    async fn run(
        self: Box<Self>,
        events: mpsc::UnboundedSender<HostEvent>,
        swap_lock: SwapLock,
    ) -> Result<()> {
        (*self).run_impl(events, swap_lock).await
    }
}
