use thiserror::Error;

use crate::BitMask;

/// CPU set for transmit-thread affinity; bit `i` pins core `i`.
pub type CpuMask = u128;

/// Upper bound for the capture batch length.
pub const MAX_CAPT_BATCH_LEN: u32 = 512;

/// Upper bound for the transmit batch length (transmit batches may be
/// larger since they amortize the device lock).
pub const MAX_XMIT_BATCH_LEN: u32 = MAX_CAPT_BATCH_LEN * 4;

/// Upper bound for the per-core recycled buffer pool.
pub const MAX_POOL_SIZE: u32 = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue { field, reason: reason.into() }
    }
}

/// Capture/transmit tuning knobs for the fast path.
///
/// Built once at startup and passed by reference to everything that needs
/// it (the capture loop, group setup, transmit threads). After
/// [`validate`](Self::validate) succeeds the value is treated as immutable:
/// the fast path only ever reads it, so no synchronization is involved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Deliver inbound traffic to capture groups.
    pub capture_incoming: bool,
    /// Deliver outbound (locally generated) traffic to capture groups.
    pub capture_outgoing: bool,
    /// Bytes reserved per captured packet slot.
    pub capt_slot_size: u32,
    /// Bytes reserved per transmit slot.
    pub xmit_slot_size: u32,
    /// Packets per capture batch.
    pub capt_batch_len: u32,
    /// Packets per transmit batch.
    pub xmit_batch_len: u32,
    /// Strip 802.1Q tags before delivery.
    pub vlan_untag: bool,
    /// Per-core recycled buffer pool size. Zero disables pooling.
    pub skb_pool_size: u32,
    /// CPU mask the transmit threads may be pinned to.
    pub tx_affinity: CpuMask,
    /// Number of transmit threads to run.
    pub tx_thread_nr: u32,
    /// Eager rate control: pace transmission per batch rather than per
    /// timer tick.
    pub tx_rate_control_eager: bool,
}

impl Default for CaptureConfig {
    /// Capture incoming only, 1514-byte slots, batch length 1, no
    /// affinity, eager rate control.
    fn default() -> Self {
        Self {
            capture_incoming: true,
            capture_outgoing: false,
            capt_slot_size: 1514,
            xmit_slot_size: 1514,
            capt_batch_len: 1,
            xmit_batch_len: 1,
            vlan_untag: false,
            skb_pool_size: 1024,
            tx_affinity: 0,
            tx_thread_nr: 0,
            tx_rate_control_eager: true,
        }
    }
}

impl CaptureConfig {
    /// Sets the capture batch length.
    pub fn capt_batch_len(mut self, len: u32) -> Self {
        self.capt_batch_len = len;
        self
    }

    /// Sets the transmit batch length.
    pub fn xmit_batch_len(mut self, len: u32) -> Self {
        self.xmit_batch_len = len;
        self
    }

    /// Sets the capture slot size in bytes.
    pub fn capt_slot_size(mut self, size: u32) -> Self {
        self.capt_slot_size = size;
        self
    }

    /// Sets the transmit slot size in bytes.
    pub fn xmit_slot_size(mut self, size: u32) -> Self {
        self.xmit_slot_size = size;
        self
    }

    /// Enables or disables capture of outgoing traffic.
    pub fn capture_outgoing(mut self, enabled: bool) -> Self {
        self.capture_outgoing = enabled;
        self
    }

    /// Enables VLAN untagging on delivery.
    pub fn vlan_untag(mut self, enabled: bool) -> Self {
        self.vlan_untag = enabled;
        self
    }

    /// Sets the recycled buffer pool size.
    pub fn skb_pool_size(mut self, size: u32) -> Self {
        self.skb_pool_size = size;
        self
    }

    /// Pins `threads` transmit threads to the cores in `affinity`.
    pub fn tx_threads(mut self, threads: u32, affinity: CpuMask) -> Self {
        self.tx_thread_nr = threads;
        self.tx_affinity = affinity;
        self
    }

    /// Checks the configuration against the fast-path bounds.
    ///
    /// Mirrors the startup checks of the capture engine: every size is
    /// positive, batch lengths stay within the slot arrays, and each
    /// transmit thread can be pinned to a distinct core of the affinity
    /// mask.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capt_batch_len == 0 || self.capt_batch_len > MAX_CAPT_BATCH_LEN {
            return Err(ConfigError::invalid(
                "capt_batch_len",
                format!("{} not in valid range [1, {MAX_CAPT_BATCH_LEN}]", self.capt_batch_len),
            ));
        }
        if self.xmit_batch_len == 0 || self.xmit_batch_len > MAX_XMIT_BATCH_LEN {
            return Err(ConfigError::invalid(
                "xmit_batch_len",
                format!("{} not in valid range [1, {MAX_XMIT_BATCH_LEN}]", self.xmit_batch_len),
            ));
        }
        if self.capt_slot_size == 0 {
            return Err(ConfigError::invalid("capt_slot_size", "must be positive"));
        }
        if self.xmit_slot_size == 0 {
            return Err(ConfigError::invalid("xmit_slot_size", "must be positive"));
        }
        if self.skb_pool_size > MAX_POOL_SIZE {
            return Err(ConfigError::invalid(
                "skb_pool_size",
                format!("{} not in valid range [0, {MAX_POOL_SIZE}]", self.skb_pool_size),
            ));
        }
        if self.tx_thread_nr > 0 {
            let cores = self.tx_affinity.population_count();
            if cores < self.tx_thread_nr {
                return Err(ConfigError::invalid(
                    "tx_affinity",
                    format!(
                        "mask has {cores} core(s) for {} transmit thread(s)",
                        self.tx_thread_nr
                    ),
                ));
            }
        }
        Ok(())
    }
}
