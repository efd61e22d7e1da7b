/*!
 * Wait Configuration
 *
 * Runtime configuration for background wait workers
 */

use nix::sys::signal::Signal;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::warn;

/// Environment variable selecting the worker interrupt signal (`none` disables it)
pub const ENV_INTERRUPT_SIGNAL: &str = "WAITPID_INTERRUPT_SIGNAL";

/// Environment variable overriding the worker stack size in bytes
pub const ENV_WORKER_STACK: &str = "WAITPID_WORKER_STACK";

/// Default worker stack size; the worker only holds a few words of state
pub const DEFAULT_WORKER_STACK: usize = 64 * 1024;

/// Background worker configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Prefix for worker thread names (`<prefix>-<pid>`)
    pub thread_name: String,
    /// Worker stack size in bytes
    pub stack_size: usize,
    /// Signal used to interrupt a canceled worker blocked in the wait call
    pub interrupt_signal: Option<Signal>,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            thread_name: "waitpid".to_string(),
            stack_size: DEFAULT_WORKER_STACK,
            // Default disposition is "ignore", so a stray delivery is harmless
            interrupt_signal: Some(Signal::SIGURG),
        }
    }
}

impl WaitConfig {
    /// Configuration that never installs a signal handler
    ///
    /// Canceled workers stay blocked until the child changes state, then exit
    /// without reaping it.
    pub fn without_interrupt() -> Self {
        Self {
            interrupt_signal: None,
            ..Self::default()
        }
    }

    /// Process-wide configuration, read from the environment on first use
    pub fn global() -> &'static WaitConfig {
        static GLOBAL: OnceLock<WaitConfig> = OnceLock::new();
        GLOBAL.get_or_init(WaitConfig::from_env)
    }

    /// Default configuration with environment overrides applied
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var(ENV_INTERRUPT_SIGNAL) {
            match parse_signal(&value) {
                Some(signal) => config.interrupt_signal = signal,
                None => warn!(value = %value, "ignoring invalid {}", ENV_INTERRUPT_SIGNAL),
            }
        }

        if let Ok(value) = std::env::var(ENV_WORKER_STACK) {
            match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => config.stack_size = bytes,
                _ => warn!(value = %value, "ignoring invalid {}", ENV_WORKER_STACK),
            }
        }

        config
    }

    #[inline]
    #[must_use]
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = bytes;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_interrupt_signal(mut self, signal: Option<Signal>) -> Self {
        self.interrupt_signal = signal;
        self
    }
}

/// Accepts `none`, `SIGUSR2`, `USR2` or a signal number
fn parse_signal(value: &str) -> Option<Option<Signal>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") {
        return Some(None);
    }
    if let Ok(num) = value.parse::<i32>() {
        return Signal::try_from(num).ok().map(Some);
    }
    let upper = value.to_ascii_uppercase();
    let name = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{}", upper)
    };
    Signal::from_str(&name).ok().map(Some)
}
