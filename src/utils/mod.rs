// file: src/utils/mod.rs
// version: 2.0.0
// guid: 1aab11de-e078-4531-af49-10347b719a07

//! Utility modules: the validation library plus host network/system helpers

pub mod network;
pub mod system;
pub mod validation;

pub use network::NetworkUtils;
pub use system::SystemUtils;
