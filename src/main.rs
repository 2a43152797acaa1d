use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_window_host, ConfigWatcher, SwapCoordinator};

#[derive(Parser, Debug)]
#[command(name = "focus-swap")]
#[command(about = "Перемещает окно в фокусе на целевой монитор, меняя его местами с окном-резидентом")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "focus-swap.toml")]
    config: PathBuf,

    /// Режим сухого запуска (состояние читается, окна не перемещаются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (по умолчанию - из конфигурации)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации до логирования: уровень и формат берутся из неё
    let config_exists = args.config.exists();
    let config = Config::load(&args.config)?;

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.logging.level.clone());
    init_tracing(&level, &config.logging.format)?;

    info!("Запуск focus-swap v{}", env!("CARGO_PKG_VERSION"));

    if config_exists {
        info!("Конфигурация загружена из: {:?}", args.config);
    } else {
        info!(
            "Файл {:?} не найден, используются значения по умолчанию",
            args.config
        );
    }

    if args.dry_run {
        warn!("Режим сухого запуска - окна перемещаться не будут");
    }

    utils::check_session();

    let (host, event_source) = create_window_host(&config, args.dry_run)?;

    let (config_tx, config_rx) = watch::channel(Arc::new(config));
    let _config_watcher = match ConfigWatcher::spawn(&args.config, config_tx) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!("Изменения конфигурации отслеживаться не будут: {}", e);
            None
        }
    };

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let coordinator = SwapCoordinator::new(host, config_rx);
    let swap_lock = coordinator.swap_lock();

    info!("Все компоненты инициализированы");

    let coordinator_handle = tokio::spawn(async move {
        if let Err(e) = coordinator.run(events_rx, shutdown_rx).await {
            error!("Ошибка в SwapCoordinator: {}", e);
        }
    });
    let events_handle = tokio::spawn(async move {
        if let Err(e) = event_source.run(events_tx, swap_lock).await {
            error!("Ошибка в источнике событий: {}", e);
        }
    });

    info!("Все сервисы запущены");

    // Ожидание сигнала завершения
    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Получен сигнал завершения (Ctrl+C)");
        }
        Err(err) => {
            error!("Ошибка при ожидании сигнала завершения: {}", err);
        }
    }

    info!("Завершение работы...");

    // Сначала координатор отменяет таймеры, затем снимается подписка на события
    if shutdown_tx.send(()).is_err() {
        warn!("SwapCoordinator уже остановлен");
    }

    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        let _ = coordinator_handle.await;
        // Прерывание задачи убивает дочерний swaymsg (kill_on_drop)
        events_handle.abort();
        let _ = events_handle.await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("focus-swap завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "full" => registry.with(tracing_subscriber::fmt::layer()).init(),
        _ => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .init(),
    }

    Ok(())
}
