//! Media element handling.
//!
//! This crate provides:
//! - The `<video>` element model with attribute reflection
//! - Load and playback state
//! - Autoplay policy enforcement

pub mod media_element;
pub mod policy;

pub use media_element::{MediaElement, MediaError, MediaNetworkState, PlaybackError, Preload};
pub use policy::AutoplayPolicy;
