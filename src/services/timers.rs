use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::debug;

pub type TimerId = u64;

/// Сообщение о сработавшем таймере, доставляется в канал владельца
#[derive(Debug)]
pub struct TimerFired<T> {
    pub id: TimerId,
    pub payload: T,
}

/// Набор отложенных одноразовых таймеров.
///
/// Каждый таймер - отдельная задача tokio, которая после задержки отправляет
/// `TimerFired` в канал владельца. Отмена прерывает задачу по её handle.
/// Сработавший таймер считается действительным, только если `complete()`
/// нашёл его в наборе: так сообщение от уже отменённого таймера, успевшее
/// попасть в канал, отбрасывается.
pub struct PendingTimers<T> {
    next_id: TimerId,
    handles: HashMap<TimerId, JoinHandle<()>>,
    tx: mpsc::UnboundedSender<TimerFired<T>>,
}

impl<T: Send + 'static> PendingTimers<T> {
    pub fn new(tx: mpsc::UnboundedSender<TimerFired<T>>) -> Self {
        Self {
            next_id: 0,
            handles: HashMap::new(),
            tx,
        }
    }

    pub fn schedule(&mut self, delay: Duration, payload: T) -> TimerId {
        self.next_id += 1;
        let id = self.next_id;
        let tx = self.tx.clone();

        let handle = tokio::spawn(async move {
            sleep(delay).await;
            // Получатель мог быть уже закрыт при завершении работы
            let _ = tx.send(TimerFired { id, payload });
        });

        self.handles.insert(id, handle);
        id
    }

    /// Отменить таймер. Возвращает false, если он уже сработал или отменён
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.handles.remove(&id) {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }

    /// Отметить таймер как сработавший. Возвращает false для отменённых таймеров
    pub fn complete(&mut self, id: TimerId) -> bool {
        self.handles.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.handles.len();
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
        if count > 0 {
            debug!("Отменено {} отложенных таймеров", count);
        }
        count
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl<T> Drop for PendingTimers<T> {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}
