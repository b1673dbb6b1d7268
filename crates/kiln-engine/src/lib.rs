//! Kiln engine crate.
//!
//! A small deferred renderer on wgpu: graphics device and presentation
//! surface, GPU resources, meshes and models, a free-fly camera and the
//! geometry / post-effect / composite frame pipeline, driven by a winit loop.

pub mod config;
pub mod logging;
pub mod time;
pub mod input;

pub mod device;
pub mod resource;
pub mod render;
pub mod scene;
pub mod camera;
pub mod pipeline;

pub mod core;
pub mod window;
