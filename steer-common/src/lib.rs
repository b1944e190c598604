//! Common building blocks for the steer crates.

mod bits;
pub use bits::{BitMask, SetBits};

mod config;
pub use config::{
    CaptureConfig, ConfigError, CpuMask, MAX_CAPT_BATCH_LEN, MAX_POOL_SIZE, MAX_XMIT_BATCH_LEN,
};
