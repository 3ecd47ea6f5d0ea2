//! Platform abstraction layer
//!
//! Browser implementations of the engine's collaborators:
//! - DOM renderer / viewport / heart burst (`web::DomStage`)
//! - `setTimeout`-backed scheduler (`web::TimeoutScheduler`)
//!
//! Native builds drive the engine with `ScriptedStage` and `VirtualClock` instead.

#[cfg(target_arch = "wasm32")]
pub mod web;
