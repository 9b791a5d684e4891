//! Engine configuration.
//!
//! | variable | default | meaning |
//! |----------|---------|---------|
//! | ALLOCATION_LOCK_TIMEOUT_MS | 10000 | wait bound for named locks and held registry rows |
//! | REMOVAL_LOCK_WAIT_MS | 0 | wait for the per-member removal lock (0: try once) |
//! | ROW_LOCK_POLL_MS | 25 | re-read interval while a registry row is held elsewhere |
//! | TERMINAL_PROPAGATION | prepared | `prepared` or `completed` |
//! | ACTOR_BUFFER_SIZE | 32 | mailbox capacity of each record actor |
//!
//! ```ignore
//! TERMINAL_PROPAGATION=completed cargo run
//! ```

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// What completing a master order does to its members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TerminalPropagation {
    /// Members still in `warehouse` move to `prepared`; nothing is completed.
    #[default]
    AdvanceToPrepared,
    /// Members in `warehouse` or `prepared` move to `completed`.
    CompleteAll,
}

impl FromStr for TerminalPropagation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prepared" => Ok(TerminalPropagation::AdvanceToPrepared),
            "completed" => Ok(TerminalPropagation::CompleteAll),
            other => Err(format!("unknown terminal propagation: {other}")),
        }
    }
}

impl Display for TerminalPropagation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TerminalPropagation::AdvanceToPrepared => "prepared",
            TerminalPropagation::CompleteAll => "completed",
        })
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub allocation_lock_timeout: Duration,
    pub removal_lock_wait: Duration,
    pub row_lock_poll: Duration,
    pub terminal_propagation: TerminalPropagation,
    pub actor_buffer_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            allocation_lock_timeout: Duration::from_millis(10_000),
            removal_lock_wait: Duration::ZERO,
            row_lock_poll: Duration::from_millis(25),
            terminal_propagation: TerminalPropagation::default(),
            actor_buffer_size: 32,
        }
    }
}

impl EngineConfig {
    /// Loads the configuration from the environment, falling back to the
    /// defaults for unset or unparsable variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let millis = |key: &str, default: Duration| {
            lookup(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
                .unwrap_or(default)
        };
        Self {
            allocation_lock_timeout: millis(
                "ALLOCATION_LOCK_TIMEOUT_MS",
                defaults.allocation_lock_timeout,
            ),
            removal_lock_wait: millis("REMOVAL_LOCK_WAIT_MS", defaults.removal_lock_wait),
            row_lock_poll: millis("ROW_LOCK_POLL_MS", defaults.row_lock_poll),
            terminal_propagation: lookup("TERMINAL_PROPAGATION")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.terminal_propagation),
            actor_buffer_size: lookup("ACTOR_BUFFER_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.actor_buffer_size),
        }
    }

    pub fn with_allocation_lock_timeout(mut self, timeout: Duration) -> Self {
        self.allocation_lock_timeout = timeout;
        self
    }

    pub fn with_removal_lock_wait(mut self, wait: Duration) -> Self {
        self.removal_lock_wait = wait;
        self
    }

    pub fn with_row_lock_poll(mut self, poll: Duration) -> Self {
        self.row_lock_poll = poll;
        self
    }

    pub fn with_terminal_propagation(mut self, propagation: TerminalPropagation) -> Self {
        self.terminal_propagation = propagation;
        self
    }

    pub fn with_actor_buffer_size(mut self, size: usize) -> Self {
        self.actor_buffer_size = size.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        let config = load(&[]);
        assert_eq!(config.allocation_lock_timeout, Duration::from_secs(10));
        assert_eq!(config.removal_lock_wait, Duration::ZERO);
        assert_eq!(config.terminal_propagation, TerminalPropagation::AdvanceToPrepared);
        assert_eq!(config.actor_buffer_size, 32);
    }

    #[test]
    fn variables_override_defaults() {
        let config = load(&[
            ("ALLOCATION_LOCK_TIMEOUT_MS", "250"),
            ("ROW_LOCK_POLL_MS", "5"),
            ("TERMINAL_PROPAGATION", "Completed"),
            ("ACTOR_BUFFER_SIZE", "8"),
        ]);
        assert_eq!(config.allocation_lock_timeout, Duration::from_millis(250));
        assert_eq!(config.row_lock_poll, Duration::from_millis(5));
        assert_eq!(config.terminal_propagation, TerminalPropagation::CompleteAll);
        assert_eq!(config.actor_buffer_size, 8);
    }

    #[test]
    fn garbage_is_ignored() {
        let config = load(&[
            ("ALLOCATION_LOCK_TIMEOUT_MS", "soon"),
            ("TERMINAL_PROPAGATION", "shipped"),
            ("ACTOR_BUFFER_SIZE", "0"),
        ]);
        assert_eq!(config.allocation_lock_timeout, Duration::from_secs(10));
        assert_eq!(config.terminal_propagation, TerminalPropagation::AdvanceToPrepared);
        assert_eq!(config.actor_buffer_size, 32);
    }
}
