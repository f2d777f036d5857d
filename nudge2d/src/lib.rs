//! Nudge2D - a tiny keyboard-driven 2D render loop.
//!
//! Key presses are collected into an ordered queue; a fixed-rate
//! frame driver drains the queue each frame and redraws.

pub mod engine;
pub mod input;
pub mod math;
pub mod render;

pub use crate::engine::{Engine, EngineConfig, EngineContext, FrameTimer, Game, FRAME_INTERVAL};
pub use crate::input::KeyQueue;
pub use crate::math::{Camera2D, Vec2};
pub use crate::render::{Frame, Renderer};
