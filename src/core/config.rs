/*!
 * Library Configuration
 *
 * Runtime configuration threaded explicitly through world initialization:
 * PE count, partition size, thread level, lock-owner policy, put delivery
 * mode, and spin behavior. Loadable from `SHMEM_*` environment variables
 * or JSON.
 */

use super::errors::ShmemError;
use super::types::{ShmemResult, MAX_PES, SLOT_BYTES};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Thread-safety level requested at initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadLevel {
    /// One thread per PE
    #[default]
    Single,
    /// Many threads, only the main thread calls into the library
    Funneled,
    /// Many threads, calls serialized by the application
    Serialized,
    /// Many threads calling concurrently; the library serializes state changes
    Multiple,
}

impl ThreadLevel {
    /// Whether state-mutating entry points must take the process-wide guard
    pub const fn requires_serialization(self) -> bool {
        matches!(self, ThreadLevel::Multiple)
    }
}

impl FromStr for ThreadLevel {
    type Err = ShmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(Self::Single),
            "funneled" => Ok(Self::Funneled),
            "serialized" => Ok(Self::Serialized),
            "multiple" => Ok(Self::Multiple),
            other => Err(ShmemError::InvalidConfig(format!(
                "unknown thread level '{other}'"
            ))),
        }
    }
}

/// How the owner PE of a lock word is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LockOwnerPolicy {
    /// Every PE uses identical aligned addresses; spread owners by address hash
    #[default]
    Hashed,
    /// Addresses may differ across PEs; the highest-numbered PE owns every lock
    HighestPe,
}

impl FromStr for LockOwnerPolicy {
    type Err = ShmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashed" | "aligned" => Ok(Self::Hashed),
            "highest" | "highest_pe" | "unaligned" => Ok(Self::HighestPe),
            other => Err(ShmemError::InvalidConfig(format!(
                "unknown lock owner policy '{other}'"
            ))),
        }
    }
}

/// When elemental puts become visible at the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMode {
    /// Applied when issued
    Eager,
    /// Buffered per (PE, context) until quiet or progress flushes them
    #[default]
    Deferred,
}

impl FromStr for DeliveryMode {
    type Err = ShmemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "eager" => Ok(Self::Eager),
            "deferred" => Ok(Self::Deferred),
            other => Err(ShmemError::InvalidConfig(format!(
                "unknown delivery mode '{other}'"
            ))),
        }
    }
}

/// Spin-wait behavior for the progress-polling loops
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpinConfig {
    /// Yield the OS thread every N polls
    pub yield_interval: u32,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self { yield_interval: 64 }
    }
}

impl SpinConfig {
    /// Configuration for dedicated cores: yield rarely
    pub const fn low_latency() -> Self {
        Self {
            yield_interval: 4096,
        }
    }

    /// Configuration for oversubscribed hosts: yield on every poll
    pub const fn oversubscribed() -> Self {
        Self { yield_interval: 1 }
    }
}

/// Library configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShmemConfig {
    pub n_pes: usize,
    /// Bytes in each PE's symmetric partition
    pub symmetric_size: usize,
    pub thread_level: ThreadLevel,
    pub lock_owner: LockOwnerPolicy,
    pub delivery: DeliveryMode,
    pub spin: SpinConfig,
    /// Upper bound on live user contexts per PE
    pub max_contexts: usize,
}

impl Default for ShmemConfig {
    fn default() -> Self {
        Self {
            n_pes: 1,
            symmetric_size: 1024 * 1024,
            thread_level: ThreadLevel::default(),
            lock_owner: LockOwnerPolicy::default(),
            delivery: DeliveryMode::default(),
            spin: SpinConfig::default(),
            max_contexts: 64,
        }
    }
}

impl ShmemConfig {
    pub fn new(n_pes: usize) -> Self {
        Self {
            n_pes,
            ..Default::default()
        }
    }

    pub fn with_symmetric_size(mut self, bytes: usize) -> Self {
        self.symmetric_size = bytes;
        self
    }

    pub fn with_thread_level(mut self, level: ThreadLevel) -> Self {
        self.thread_level = level;
        self
    }

    pub fn with_lock_owner(mut self, policy: LockOwnerPolicy) -> Self {
        self.lock_owner = policy;
        self
    }

    pub fn with_delivery(mut self, delivery: DeliveryMode) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn with_spin(mut self, spin: SpinConfig) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_max_contexts(mut self, max: usize) -> Self {
        self.max_contexts = max;
        self
    }

    /// Load from `SHMEM_*` environment variables on top of the defaults
    pub fn from_env() -> ShmemResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup (environment, test maps)
    pub fn from_lookup<F>(lookup: F) -> ShmemResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SHMEM_NPES") {
            config.n_pes = parse_number("SHMEM_NPES", &v)?;
        }
        if let Some(v) = lookup("SHMEM_SYMMETRIC_SIZE") {
            config.symmetric_size = parse_size(&v)?;
        }
        if let Some(v) = lookup("SHMEM_THREAD_LEVEL") {
            config.thread_level = v.parse()?;
        }
        if let Some(v) = lookup("SHMEM_LOCK_OWNER") {
            config.lock_owner = v.parse()?;
        }
        if let Some(v) = lookup("SHMEM_DELIVERY") {
            config.delivery = v.parse()?;
        }
        if let Some(v) = lookup("SHMEM_SPIN_YIELD") {
            config.spin.yield_interval = parse_number("SHMEM_SPIN_YIELD", &v)?;
        }
        if let Some(v) = lookup("SHMEM_MAX_CONTEXTS") {
            config.max_contexts = parse_number("SHMEM_MAX_CONTEXTS", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> ShmemResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ShmemError::InvalidConfig(format!("malformed JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ShmemResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ShmemError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> ShmemResult<()> {
        if self.n_pes == 0 || self.n_pes > MAX_PES {
            return Err(ShmemError::InvalidConfig(format!(
                "n_pes must be between 1 and {MAX_PES}, got {}",
                self.n_pes
            )));
        }
        if self.symmetric_size == 0 || self.symmetric_size % SLOT_BYTES != 0 {
            return Err(ShmemError::InvalidConfig(format!(
                "symmetric_size must be a non-zero multiple of {SLOT_BYTES}, got {}",
                self.symmetric_size
            )));
        }
        if self.spin.yield_interval == 0 {
            return Err(ShmemError::InvalidConfig(
                "spin.yield_interval must be non-zero".to_string(),
            ));
        }
        if self.max_contexts == 0 {
            return Err(ShmemError::InvalidConfig(
                "max_contexts must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number<T: FromStr>(key: &str, value: &str) -> ShmemResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| ShmemError::InvalidConfig(format!("{key}: '{value}' is not a number")))
}

/// Parse a byte size with an optional K/M/G suffix (powers of 1024)
fn parse_size(value: &str) -> ShmemResult<usize> {
    let trimmed = value.trim();
    let (digits, multiplier) = match trimmed.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => (&trimmed[..trimmed.len() - 1], 1usize << 10),
        Some('M') => (&trimmed[..trimmed.len() - 1], 1usize << 20),
        Some('G') => (&trimmed[..trimmed.len() - 1], 1usize << 30),
        _ => (trimmed, 1),
    };
    let base: usize = parse_number("SHMEM_SYMMETRIC_SIZE", digits)?;
    base.checked_mul(multiplier).ok_or_else(|| {
        ShmemError::InvalidConfig(format!("SHMEM_SYMMETRIC_SIZE: '{value}' overflows"))
    })
}
