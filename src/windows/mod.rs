pub mod anchor_layout;
pub mod bridge;
pub mod bridge_types;
pub mod dispatch;
pub mod error;
pub mod host_state;
pub mod loopback;
#[cfg(feature = "tauri")]
pub mod tauri_host;
