pub mod selection;

use crate::config::{Config, SwapMode};
use crate::error::Result;
use crate::events::HostEvent;
use crate::services::debouncer::{Debouncer, EvaluationSerial};
use crate::services::swap_lock::SwapLock;
use crate::services::timers::{PendingTimers, TimerFired};
use crate::services::window_host::WindowHost;
use crate::{debug_if_enabled, trace_if_enabled};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use self::selection::{plan_swap, Decision, SwapPlan};

/// Отложенные действия координатора
#[derive(Debug)]
enum CoordinatorTimer {
    Debounce { serial: EvaluationSerial },
    Retry { plan: SwapPlan, attempt: u32 },
}

/// Держит окно в фокусе на целевом мониторе.
///
/// Работает как одна задача tokio: события оконного менеджера, срабатывания
/// таймеров, смена конфигурации и завершение обрабатываются строго по
/// очереди, так что ни один обработчик не прерывается другим.
pub struct SwapCoordinator {
    host: Arc<dyn WindowHost>,
    config: Arc<Config>,
    config_rx: watch::Receiver<Arc<Config>>,
    swap_lock: SwapLock,
    debouncer: Debouncer,
    timers: PendingTimers<CoordinatorTimer>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired<CoordinatorTimer>>,
}

impl SwapCoordinator {
    pub fn new(host: Arc<dyn WindowHost>, config_rx: watch::Receiver<Arc<Config>>) -> Self {
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let config = config_rx.borrow().clone();

        Self {
            host,
            config,
            config_rx,
            swap_lock: SwapLock::new(),
            debouncer: Debouncer::new(),
            timers: PendingTimers::new(timer_tx),
            timer_rx,
        }
    }

    /// Общий флаг перемещения - источник событий отбрасывает сигналы, пока он взведён
    pub fn swap_lock(&self) -> SwapLock {
        self.swap_lock.clone()
    }

    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<HostEvent>,
        mut shutdown: oneshot::Receiver<()>,
    ) -> Result<()> {
        info!(
            "SwapCoordinator запущен (режим: {:?}, цель: {:?}, scope: {:?})",
            self.config.swap.mode, self.config.swap.target_monitor, self.config.swap.scope
        );

        let mut events_open = true;
        let mut config_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("SwapCoordinator получил сигнал завершения");
                    break;
                }
                event = events.recv(), if events_open => match event {
                    Some(event) => self.on_focus_signal(event),
                    None => {
                        warn!("Источник событий закрыл канал, новых оценок не будет");
                        events_open = false;
                    }
                },
                Some(fired) = self.timer_rx.recv() => self.on_timer(fired),
                changed = self.config_rx.changed(), if config_open => match changed {
                    Ok(()) => self.reload_config(),
                    Err(_) => {
                        debug!("Наблюдатель конфигурации остановлен");
                        config_open = false;
                    }
                },
            }
        }

        self.shutdown();
        Ok(())
    }

    fn on_focus_signal(&mut self, event: HostEvent) {
        let delay = self.config.settle_delay();
        let serial = self
            .debouncer
            .signal(&mut self.timers, delay, |serial| CoordinatorTimer::Debounce { serial });

        trace_if_enabled!("{}: оценка {} через {:?}", event, serial, delay);
    }

    fn on_timer(&mut self, fired: TimerFired<CoordinatorTimer>) {
        // Сообщение от таймера, отменённого уже после отправки
        if !self.timers.complete(fired.id) {
            trace_if_enabled!("Таймер {} отменён, пропускаем", fired.id);
            return;
        }

        match fired.payload {
            CoordinatorTimer::Debounce { serial } => {
                if self.debouncer.fire(fired.id, serial) {
                    self.evaluate(serial);
                } else {
                    debug_if_enabled!(
                        "Оценка {} устарела (текущая {})",
                        serial,
                        self.debouncer.current()
                    );
                }
            }
            CoordinatorTimer::Retry { plan, attempt } => self.attempt(plan, attempt),
        }
    }

    fn evaluate(&mut self, serial: EvaluationSerial) {
        if self.swap_lock.is_held() {
            debug!("Оценка {}: идёт перемещение, пропускаем", serial);
            return;
        }

        let snapshot = match self.host.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Оценка {}: не удалось прочитать состояние окон: {}", serial, e);
                return;
            }
        };

        if let Some(focused) = snapshot.focused_window() {
            let workspace = focused
                .workspace
                .and_then(|ws| snapshot.workspaces.get(ws))
                .map_or("?", |ws| ws.name.as_str());
            debug_if_enabled!("Оценка {}: в фокусе {} (рабочий стол {})", serial, focused, workspace);
        }

        match plan_swap(&self.config, &snapshot, serial) {
            Decision::Skip(reason) => {
                debug_if_enabled!("Оценка {}: без перемещения ({})", serial, reason);
            }
            Decision::Move(plan) => {
                match plan.outgoing {
                    Some(outgoing) => info!(
                        "Оценка {}: окно {} -> {}, окно {} -> {}",
                        serial, plan.incoming, plan.target, outgoing, plan.incoming_monitor
                    ),
                    None => info!(
                        "Оценка {}: окно {} -> {}",
                        serial, plan.incoming, plan.target
                    ),
                }
                self.attempt(plan, 0);
            }
        }
    }

    /// Одна попытка цепочки. После неё, если лимит не исчерпан, ставится следующая
    fn attempt(&mut self, plan: SwapPlan, attempt: u32) {
        if !self.debouncer.is_current(plan.serial) {
            debug_if_enabled!(
                "Цепочка {} прервана: есть более новая оценка {}",
                plan.serial,
                self.debouncer.current()
            );
            return;
        }

        match self.host.snapshot() {
            Ok(snapshot) => {
                if snapshot.focused != Some(plan.incoming) {
                    debug_if_enabled!(
                        "Цепочка {} прервана: фокус ушёл с окна {}",
                        plan.serial,
                        plan.incoming
                    );
                    return;
                }

                match snapshot.monitor_of(plan.incoming) {
                    None => {
                        debug!("Цепочка {} прервана: окно {} исчезло", plan.serial, plan.incoming);
                        return;
                    }
                    Some(monitor) if monitor == plan.target => {
                        debug_if_enabled!(
                            "Цепочка {}: окно {} на месте после {} попыток",
                            plan.serial,
                            plan.incoming,
                            attempt
                        );
                        return;
                    }
                    Some(_) => self.execute(&plan, attempt),
                }
            }
            Err(e) => warn!(
                "Цепочка {}: попытка {} пропущена, состояние окон недоступно: {}",
                plan.serial, attempt, e
            ),
        }

        if attempt >= plan.retry_count {
            debug_if_enabled!("Цепочка {}: попытки исчерпаны ({})", plan.serial, attempt + 1);
            return;
        }

        let delay = plan.retry_delay;
        self.timers.schedule(
            delay,
            CoordinatorTimer::Retry {
                plan,
                attempt: attempt + 1,
            },
        );
    }

    fn execute(&self, plan: &SwapPlan, attempt: u32) {
        let Some(_guard) = self.swap_lock.try_acquire() else {
            debug!("Цепочка {}: перемещение уже идёт", plan.serial);
            return;
        };

        if attempt > 0 {
            info!(
                "Цепочка {}: повторная попытка {} для окна {}",
                plan.serial, attempt, plan.incoming
            );
        }

        if let Err(e) = self.perform_moves(plan) {
            error!(
                "Цепочка {}: попытка {} не удалась: {}",
                plan.serial, attempt, e
            );
        }
    }

    fn perform_moves(&self, plan: &SwapPlan) -> Result<()> {
        self.host.move_to_monitor(plan.incoming, plan.target)?;

        if plan.mode == SwapMode::Swap {
            if let Some(outgoing) = plan.outgoing {
                self.host.move_to_monitor(outgoing, plan.incoming_monitor)?;
            }
        }

        // Перемещение может отобрать фокус
        self.host.activate(plan.incoming)
    }

    fn reload_config(&mut self) {
        let config = self.config_rx.borrow_and_update().clone();
        info!(
            "Конфигурация обновлена (режим: {:?}, цель: {:?}, scope: {:?})",
            config.swap.mode, config.swap.target_monitor, config.swap.scope
        );
        self.config = config;
    }

    fn shutdown(&mut self) {
        let cancelled = self.timers.cancel_all();
        info!("SwapCoordinator остановлен, отменено таймеров: {}", cancelled);
    }
}
