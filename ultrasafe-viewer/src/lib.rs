//! # ultrasafe-viewer: live mask viewer
//!
//! Connects to the Ultrasafe backend's mask socket, composites each
//! segmentation mask into a translucent highlight, and reports
//! connection health and delivered FPS. Optionally writes the
//! composited overlay to a PNG file.

pub mod config;
pub mod status;
