//! Domain-based type organization
//!
//! - protocol: wire types of the updater WebSocket
//! - upgrade: upgrade phases, error kinds and restart polling state
//! - os_updates: major OS version information

pub mod os_updates;
pub mod protocol;
pub mod upgrade;

pub use os_updates::*;
pub use protocol::*;
pub use upgrade::*;
