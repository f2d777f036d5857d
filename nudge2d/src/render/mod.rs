mod wgpu_backend;

pub use wgpu_backend::{Frame, Renderer};

pub use crate::math::Vec2;
