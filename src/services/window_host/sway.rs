use crate::config::SwayConfig;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{DesktopSnapshot, MonitorIndex, WindowId};
use crate::swap_error;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use std::process::Command;
use tracing::{debug, info};

use super::r#trait::{WindowMover, WindowQuery};
use super::sway_tree::{build_snapshot, CommandReply, SwayNode, SwayOutput, SwayWorkspace};

const NO_MATCHING_NODE: &str = "No matching node";

pub struct SwayHost {
    swaymsg: String,
    primary_output: String,
    dry_run: bool,
    // Имена активных выходов из последнего снимка: индекс монитора -> имя для команды move
    output_names: RwLock<Vec<String>>,
}

impl SwayHost {
    pub fn new(config: &SwayConfig, dry_run: bool) -> Self {
        info!(
            "Инициализация SwayHost (swaymsg: {}, dry_run: {})",
            config.swaymsg, dry_run
        );

        Self {
            swaymsg: config.swaymsg.clone(),
            primary_output: config.primary_output.trim().to_string(),
            dry_run,
            output_names: RwLock::new(Vec::new()),
        }
    }

    /// Проверка, что sway отвечает на IPC
    pub fn check_ipc(&self) -> Result<()> {
        debug!("=== Проверяем swaymsg ===");

        let output = Command::new(&self.swaymsg)
            .args(["-r", "-t", "get_version"])
            .output()
            .map_err(|e| swap_error!(service_unavailable, "{} не найден: {}", self.swaymsg, e))?;

        if !output.status.success() {
            return Err(swap_error!(
                service_unavailable,
                "sway не отвечает: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        debug!("=== swaymsg работает ===");
        Ok(())
    }

    fn query<T: DeserializeOwned>(&self, message_type: &str) -> Result<T> {
        let output = Command::new(&self.swaymsg)
            .args(["-r", "-t", message_type])
            .output()
            .map_err(|e| swap_error!(host, "swaymsg -t {} не запустился: {}", message_type, e))?;

        if !output.status.success() {
            return Err(swap_error!(
                host,
                "swaymsg -t {} вернул ошибку: {}",
                message_type,
                String::from_utf8_lossy(&output.stderr).trim()
            ));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }

    fn run_command(&self, command: &str) -> Result<()> {
        if self.dry_run {
            info!("[DRY RUN] swaymsg {}", command);
            return Ok(());
        }

        debug_if_enabled!("swaymsg {}", command);

        let output = Command::new(&self.swaymsg)
            .args(["-r", "--", command])
            .output()
            .map_err(|e| swap_error!(host, "swaymsg не запустился: {}", e))?;

        let replies: Vec<CommandReply> = serde_json::from_slice(&output.stdout)
            .map_err(|e| swap_error!(host, "Непонятный ответ на '{}': {}", command, e))?;

        check_replies(command, &replies)
    }

    fn output_name(&self, monitor: MonitorIndex) -> Result<String> {
        self.output_names
            .read()
            .get(monitor.value())
            .cloned()
            .ok_or_else(|| swap_error!(host, "Неизвестный {}", monitor))
    }
}

/// Разбор ответа sway на команду: по одному ответу на каждую часть команды
fn check_replies(command: &str, replies: &[CommandReply]) -> Result<()> {
    match replies.iter().find(|reply| !reply.success) {
        // Окно закрылось между снимком и командой
        Some(failed) if failed.error.as_deref().is_some_and(|e| e.starts_with(NO_MATCHING_NODE)) => {
            Err(swap_error!(window_not_found, "{}", command))
        }
        Some(failed) => Err(swap_error!(
            host,
            "'{}' не выполнена: {}",
            command,
            failed.error.as_deref().unwrap_or("без описания")
        )),
        None if replies.is_empty() => Err(swap_error!(host, "Пустой ответ на '{}'", command)),
        None => Ok(()),
    }
}

impl WindowQuery for SwayHost {
    fn snapshot(&self) -> Result<DesktopSnapshot> {
        let outputs: Vec<SwayOutput> = self.query("get_outputs")?;
        let workspaces: Vec<SwayWorkspace> = self.query("get_workspaces")?;
        let tree: SwayNode = self.query("get_tree")?;

        *self.output_names.write() = outputs
            .iter()
            .filter(|o| o.active)
            .map(|o| o.name.clone())
            .collect();

        Ok(build_snapshot(&outputs, &workspaces, &tree, &self.primary_output))
    }
}

impl WindowMover for SwayHost {
    fn move_to_monitor(&self, window: WindowId, monitor: MonitorIndex) -> Result<()> {
        let output = self.output_name(monitor)?;
        self.run_command(&format!(
            "[con_id={}] move container to output \"{}\"",
            window.value(),
            output
        ))
    }

    fn activate(&self, window: WindowId) -> Result<()> {
        self.run_command(&format!("[con_id={}] focus", window.value()))
    }
}

impl Drop for SwayHost {
    fn drop(&mut self) {
        info!("SwayHost завершает работу");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FocusSwapError;

    const COMMAND: &str = "[con_id=7] focus";

    fn replies(json: &str) -> Vec<CommandReply> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_successful_reply() {
        assert!(check_replies(COMMAND, &replies(r#"[{"success": true}]"#)).is_ok());
    }

    #[test]
    fn test_failed_reply_is_host_error() {
        let result = check_replies(
            COMMAND,
            &replies(r#"[{"success": true}, {"success": false, "error": "Invalid output"}]"#),
        );
        match result {
            Err(FocusSwapError::HostCommand(message)) => assert!(message.contains("Invalid output")),
            other => panic!("ожидалась ошибка команды, получено: {:?}", other),
        }
    }

    #[test]
    fn test_missing_window_is_window_not_found() {
        let result = check_replies(
            COMMAND,
            &replies(r#"[{"success": false, "error": "No matching node."}]"#),
        );
        assert!(matches!(result, Err(FocusSwapError::WindowNotFound(_))));
    }

    #[test]
    fn test_empty_reply_is_an_error() {
        assert!(matches!(
            check_replies(COMMAND, &[]),
            Err(FocusSwapError::HostCommand(_))
        ));
    }

    #[test]
    fn test_dry_run_does_not_spawn_swaymsg() {
        let config = SwayConfig {
            swaymsg: "/nonexistent/swaymsg".to_string(),
            primary_output: String::new(),
        };
        let host = SwayHost::new(&config, true);
        *host.output_names.write() = vec!["DP-1".to_string()];

        assert!(host.activate(WindowId(7)).is_ok());
        assert!(host.move_to_monitor(WindowId(7), MonitorIndex(0)).is_ok());
        // Неизвестный монитор отвергается до запуска команды
        assert!(host.move_to_monitor(WindowId(7), MonitorIndex(3)).is_err());
    }

    #[test]
    fn test_real_run_with_missing_swaymsg_fails() {
        let config = SwayConfig {
            swaymsg: "/nonexistent/swaymsg".to_string(),
            primary_output: String::new(),
        };
        let host = SwayHost::new(&config, false);

        assert!(host.activate(WindowId(7)).is_err());
        assert!(matches!(
            host.check_ipc(),
            Err(FocusSwapError::ServiceUnavailable(_))
        ));
    }
}
