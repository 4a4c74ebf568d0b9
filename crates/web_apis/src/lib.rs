//! Web APIs implementation.
//!
//! This crate provides the platform capabilities page components rely on:
//! - Intersection Observer API

pub mod intersection_observer;

pub use intersection_observer::{
    IntersectionCallback, IntersectionObserverController, IntersectionObserverEntry,
    IntersectionObserverOptions, MarginValue, ObserverId, RootMargin, Threshold,
};
