pub mod config_watcher;
pub mod coordinator;
pub mod debouncer;
pub mod swap_lock;
pub mod timers;
pub mod window_host;

pub use config_watcher::ConfigWatcher;
pub use coordinator::SwapCoordinator;
pub use swap_lock::SwapLock;
pub use window_host::create_window_host;
