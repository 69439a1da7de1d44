//! Application configuration loading.
//!
//! Every field is optional in the YAML file; anything left out falls back to
//! the built-in defaults, so an empty document is a valid configuration.
//!
//! ```yaml
//! pipe:
//!   name: SCH_LAB_CMD_PIPE
//!   depth: 16
//! subscriptions: [0x1801, 0x1802, 0x1803, 0x1804, 0x1805]
//! timer:
//!   period_ms: 1000        # 0 disables the periodic release timer
//!   semaphore_max: 64
//! schedule:
//!   - slot: 1
//!     packet_rate: 1
//!   - slot: 3
//!     packet_rate: 4
//!     payload: [0x0001, 0x0002]
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::message::MessageId;

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Name of the command pipe.
pub const DEFAULT_PIPE_NAME: &str = "SCH_LAB_CMD_PIPE";

/// Depth of the command pipe, in messages.
pub const DEFAULT_PIPE_DEPTH: usize = 16;

/// Message ids the application listens on.
pub const DEFAULT_SUBSCRIPTIONS: [u16; 5] = [0x1801, 0x1802, 0x1803, 0x1804, 0x1805];

/// Periodic release timer period.
pub const DEFAULT_TIMER_PERIOD_MS: u64 = 1_000;

/// Upper bound of the release semaphore count.
pub const DEFAULT_SEMAPHORE_MAX: u32 = 64;

/// Default per-slot packet rates (slot, rate in ticks) for the five tasks.
const DEFAULT_RATES: [(usize, u32); 5] = [(1, 1), (2, 2), (3, 4), (4, 2), (5, 4)];

// ── Sections ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipeConfig {
    pub name: String,
    pub depth: usize,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_PIPE_NAME.to_string(),
            depth: DEFAULT_PIPE_DEPTH,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimerConfig {
    /// Tick period in milliseconds.  `0` means no timer is registered.
    pub period_ms: u64,
    pub semaphore_max: u32,
}

impl TimerConfig {
    /// Tick period, or `None` when the timer is disabled.
    pub fn period(&self) -> Option<Duration> {
        (self.period_ms > 0).then(|| Duration::from_millis(self.period_ms))
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            period_ms: DEFAULT_TIMER_PERIOD_MS,
            semaphore_max: DEFAULT_SEMAPHORE_MAX,
        }
    }
}

/// One populated schedule slot.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotConfig {
    pub slot: usize,
    /// Nominal periodic rate in timer ticks.
    #[serde(default)]
    pub packet_rate: u32,
    /// Preset argument words.
    #[serde(default)]
    pub payload: Vec<u16>,
}

// ── AppConfig ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub pipe: PipeConfig,
    pub subscriptions: Vec<u16>,
    pub timer: TimerConfig,
    pub schedule: Vec<SlotConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            pipe: PipeConfig::default(),
            subscriptions: DEFAULT_SUBSCRIPTIONS.to_vec(),
            timer: TimerConfig::default(),
            schedule: DEFAULT_RATES
                .iter()
                .map(|&(slot, packet_rate)| SlotConfig {
                    slot,
                    packet_rate,
                    payload: Vec::new(),
                })
                .collect(),
        }
    }
}

impl AppConfig {
    /// Parse `path` as YAML.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid
    /// configuration document (unknown keys are rejected).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading SCH Lab configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        let cfg = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;

        info!(
            pipe = %cfg.pipe.name,
            depth = cfg.pipe.depth,
            subscriptions = cfg.subscriptions.len(),
            slots = cfg.schedule.len(),
            timer_period_ms = cfg.timer.period_ms,
            "Configuration loaded"
        );
        Ok(cfg)
    }

    /// Parse a YAML document.  An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            debug!("empty configuration document, using defaults");
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn subscription_ids(&self) -> impl Iterator<Item = MessageId> + '_ {
        self.subscriptions.iter().copied().map(MessageId)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper: write a YAML string to a temp file and return it.
    fn yaml_tempfile(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn defaults_match_builtin_constants() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.pipe.name, "SCH_LAB_CMD_PIPE");
        assert_eq!(cfg.pipe.depth, 16);
        assert_eq!(cfg.subscriptions, vec![0x1801, 0x1802, 0x1803, 0x1804, 0x1805]);
        assert_eq!(cfg.timer.period(), Some(Duration::from_secs(1)));
        let slots: Vec<usize> = cfg.schedule.iter().map(|s| s.slot).collect();
        assert_eq!(slots, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn load_full_document() {
        let yaml = r#"
pipe:
  name: TEST_PIPE
  depth: 4
subscriptions: [6145, 6146]
timer:
  period_ms: 250
  semaphore_max: 3
schedule:
  - slot: 1
    packet_rate: 2
  - slot: 3
    packet_rate: 8
    payload: [1, 2, 3]
"#;
        let f = yaml_tempfile(yaml);
        let cfg = AppConfig::load_from_file(f.path()).unwrap();

        assert_eq!(cfg.pipe.name, "TEST_PIPE");
        assert_eq!(cfg.pipe.depth, 4);
        assert_eq!(
            cfg.subscription_ids().collect::<Vec<_>>(),
            vec![MessageId(0x1801), MessageId(0x1802)]
        );
        assert_eq!(cfg.timer.period(), Some(Duration::from_millis(250)));
        assert_eq!(cfg.timer.semaphore_max, 3);
        assert_eq!(cfg.schedule.len(), 2);
        assert_eq!(cfg.schedule[1].payload, vec![1, 2, 3]);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let cfg = AppConfig::from_yaml("pipe:\n  depth: 8\n").unwrap();
        assert_eq!(cfg.pipe.depth, 8);
        assert_eq!(cfg.pipe.name, DEFAULT_PIPE_NAME);
        assert_eq!(cfg.subscriptions.len(), 5);
        assert_eq!(cfg.schedule.len(), 5);
    }

    #[test]
    fn zero_period_disables_timer() {
        let cfg = AppConfig::from_yaml("timer:\n  period_ms: 0\n").unwrap();
        assert_eq!(cfg.timer.period(), None);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(AppConfig::from_yaml("  \n").unwrap(), AppConfig::default());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AppConfig::from_yaml("pipes:\n  depth: 8\n").is_err());
    }

    #[test]
    fn missing_file_returns_error() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path/sch_lab.yaml"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_yaml_returns_error() {
        let f = yaml_tempfile("this is: not: valid: yaml: content:::");
        assert!(AppConfig::load_from_file(f.path()).is_err());
    }

    #[test]
    fn shipped_sample_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("conf/sch_lab.yaml");
        let cfg = AppConfig::load_from_file(&path).unwrap();
        let defaults = AppConfig::default();
        assert_eq!(cfg.pipe, defaults.pipe);
        assert_eq!(cfg.subscriptions, defaults.subscriptions);
        assert_eq!(cfg.timer, defaults.timer);
        assert_eq!(cfg.schedule[2].payload, vec![1, 2]);
    }
}
