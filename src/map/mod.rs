//! The map engine seam.
//!
//! Everything the dashboard needs from a map goes through [`engine::MapEngine`].
//! [`headless::HeadlessMap`] implements it in memory for tests, the demo app
//! and any host without a browser map.

pub mod engine;
pub mod events;
pub mod headless;
pub mod index;
