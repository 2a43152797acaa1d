use std::env;
use tracing::{info, warn};

/// Признаки того, что демон запущен не там, где ожидается
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionIssue {
    NoSwaySocket,
    NotWayland(String),
    RunningAsRoot,
}

/// Проверить окружение сессии. Ничего не запрещает, только предупреждает:
/// окончательный ответ даёт проверка swaymsg при создании хоста
pub fn check_session() {
    info!("Проверка окружения сессии...");

    let swaysock = env::var("SWAYSOCK").ok();
    let session_type = env::var("XDG_SESSION_TYPE").ok();
    let user = env::var("USER").ok();

    let issues = inspect(swaysock.as_deref(), session_type.as_deref(), user.as_deref());
    for issue in &issues {
        match issue {
            SessionIssue::NoSwaySocket => {
                warn!("SWAYSOCK не задан - swaymsg может не найти сокет sway");
            }
            SessionIssue::NotWayland(session) => {
                warn!("Тип сессии '{}', ожидается wayland", session);
            }
            SessionIssue::RunningAsRoot => {
                warn!("⚠️  Приложение запущено от имени root!");
                warn!("   Демону нужен только доступ к IPC sway текущего пользователя");
            }
        }
    }

    if issues.is_empty() {
        info!("Окружение сессии в порядке");
    }
}

fn inspect(
    swaysock: Option<&str>,
    session_type: Option<&str>,
    user: Option<&str>,
) -> Vec<SessionIssue> {
    let mut issues = Vec::new();

    if swaysock.map_or(true, |s| s.trim().is_empty()) {
        issues.push(SessionIssue::NoSwaySocket);
    }

    if let Some(session) = session_type {
        if !session.eq_ignore_ascii_case("wayland") {
            issues.push(SessionIssue::NotWayland(session.to_string()));
        }
    }

    if user == Some("root") {
        issues.push(SessionIssue::RunningAsRoot);
    }

    issues
}
