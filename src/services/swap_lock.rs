use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Флаг «идёт перемещение окон».
///
/// Удерживается только на время одного синхронного вызова перемещения и
/// никогда не переживает задержки между попытками. Сигналы фокуса, пришедшие
/// пока флаг взведён, отбрасываются (не ставятся в очередь).
#[derive(Debug, Clone, Default)]
pub struct SwapLock {
    flag: Arc<AtomicBool>,
}

/// Снимает флаг при выходе из области видимости, в том числе при ошибке
#[derive(Debug)]
pub struct SwapGuard {
    flag: Arc<AtomicBool>,
}

impl SwapLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn try_acquire(&self) -> Option<SwapGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| SwapGuard {
                flag: Arc::clone(&self.flag),
            })
    }
}

impl Drop for SwapGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
