use crate::config::Config;
use crate::error::Result;
use crate::swap_error;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Редакторы генерируют несколько событий на одно сохранение (временный файл, rename)
const CONFIG_DEBOUNCE: Duration = Duration::from_millis(200);

/// Следит за файлом конфигурации и публикует новые снимки в `watch`-канал.
///
/// Наблюдается родительский каталог, чтобы не потерять файл при замене через rename.
/// Фоновый поток завершается, когда наблюдатель уничтожается.
pub struct ConfigWatcher {
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    pub fn spawn(path: impl AsRef<Path>, tx: watch::Sender<Arc<Config>>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file_name = path
            .file_name()
            .map(OsStr::to_os_string)
            .ok_or_else(|| swap_error!(internal, "Некорректный путь к конфигурации: {:?}", path))?;

        let watch_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (event_tx, event_rx) = channel();
        let mut watcher = notify::recommended_watcher(event_tx)?;
        watcher.watch(&watch_dir, RecursiveMode::NonRecursive)?;

        let thread_path = path.clone();
        std::thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || watch_loop(thread_path, file_name, event_rx, tx))?;

        info!("Отслеживаем изменения конфигурации: {:?}", path);
        Ok(Self { _watcher: watcher })
    }
}

fn watch_loop(
    path: PathBuf,
    file_name: OsString,
    events: Receiver<notify::Result<Event>>,
    tx: watch::Sender<Arc<Config>>,
) {
    while let Ok(result) = events.recv() {
        match result {
            Ok(event) if affects(&event, &file_name) => {
                // Ждём конца серии событий, чтобы прочитать файл уже целиком
                while events.recv_timeout(CONFIG_DEBOUNCE).is_ok() {}

                if tx.is_closed() {
                    break;
                }
                reload_into(&path, &tx);
            }
            Ok(_) => {}
            Err(e) => warn!("Ошибка наблюдения за конфигурацией: {}", e),
        }
    }

    debug!("Наблюдатель конфигурации завершён");
}

fn affects(event: &Event, file_name: &OsStr) -> bool {
    event
        .paths
        .iter()
        .any(|p| p.file_name().is_some_and(|name| name == file_name))
}

/// Перечитать конфигурацию. При ошибке остаётся прежний снимок
pub fn reload_into(path: &Path, tx: &watch::Sender<Arc<Config>>) -> bool {
    match Config::load(path) {
        Ok(config) => {
            info!("Конфигурация перечитана из {:?}", path);
            tx.send_replace(Arc::new(config));
            true
        }
        Err(e) => {
            warn!("Конфигурация не применена, оставляем прежнюю: {:#}", e);
            false
        }
    }
}
