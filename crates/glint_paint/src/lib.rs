//! Glint Paint API
//!
//! The destination side of the Glint text engine: a CPU pixel buffer and the
//! ambient drawing state that text and shapes are painted through.
//!
//! # Features
//!
//! - Packed ARGB colors
//! - Integer pixel rectangles with clip intersection
//! - Fill and stroke (solid or dotted) rectangle drawing
//! - Per-pixel plotting that honors the clip and buffer bounds

pub mod color;
pub mod context;
pub mod primitives;
pub mod surface;

pub use color::Color;
pub use context::{DrawState, StrokeStyle};
pub use primitives::{Point, Rect};
pub use surface::PixelBuffer;
