//! Per-technology interface configuration
//!
//! Each mesh technology carries its own pending configuration struct. The
//! structs hold what the application set before `connect()`; the bring-up
//! machinery pushes them into the native stack when the bootstrap is
//! configured. The `validate_*` helpers apply the same rules the setters
//! do, without touching any state.

/// 6LoWPAN-ND configuration
pub mod lowpan;

/// Thread configuration
pub mod thread;

/// Wi-SUN configuration
pub mod wisun;

pub use lowpan::LowpanNdConfig;
pub use thread::ThreadConfig;
pub use wisun::WisunConfig;
