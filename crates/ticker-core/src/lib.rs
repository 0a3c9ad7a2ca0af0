//! Hardware-independent core library for the quote and headline ticker
//!
//! This crate contains all platform-agnostic logic of the appliance: the
//! shared state store, the streaming feed parser, the fetch orchestrator
//! (producer task) and the render orchestrator (consumer task), plus the
//! collaborator traits the firmware and simulator implement.
//!
//! It is `#![no_std]` with `extern crate alloc` so it compiles on both
//! embedded targets (ESP32-S3) and desktop hosts (for the simulator and tests).

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod app_state;
pub mod clock;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod link;
pub mod net;
pub mod render;

pub use app_state::{FeedSnapshot, FetchPhase, LinkStatus, PriceSample, StateStore};
pub use config::{AppConfig, Category};
pub use fetch::FetchOrchestrator;
pub use render::RenderOrchestrator;
