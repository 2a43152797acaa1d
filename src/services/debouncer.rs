use super::timers::{PendingTimers, TimerId};
use std::fmt;
use std::time::Duration;

/// Порядковый номер оценки; растёт монотонно на каждый сигнал фокуса
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EvaluationSerial(pub u64);

impl fmt::Display for EvaluationSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Схлопывает серию сигналов фокуса в одну отложенную оценку.
///
/// Каждый сигнал увеличивает serial, отменяет ещё не сработавший таймер и
/// ставит новый. Сработавший таймер действителен, только если захваченный им
/// serial совпадает с текущим.
#[derive(Debug, Default)]
pub struct Debouncer {
    serial: EvaluationSerial,
    pending: Option<TimerId>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> EvaluationSerial {
        self.serial
    }

    pub fn is_current(&self, serial: EvaluationSerial) -> bool {
        self.serial == serial
    }

    #[allow(dead_code)]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn signal<T: Send + 'static>(
        &mut self,
        timers: &mut PendingTimers<T>,
        delay: Duration,
        payload: impl FnOnce(EvaluationSerial) -> T,
    ) -> EvaluationSerial {
        self.serial = EvaluationSerial(self.serial.0 + 1);

        if let Some(previous) = self.pending.take() {
            timers.cancel(previous);
        }

        self.pending = Some(timers.schedule(delay, payload(self.serial)));
        self.serial
    }

    /// Обработка сработавшего таймера. true - можно запускать оценку
    pub fn fire(&mut self, timer: TimerId, serial: EvaluationSerial) -> bool {
        if self.pending == Some(timer) {
            self.pending = None;
        }
        self.is_current(serial)
    }
}
