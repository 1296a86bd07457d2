//! Raster encoding for pixlink displays.
//!
//! Turns decoded images and animations into the device's pixel encoding:
//! square RGB888 buffers at the panel resolution, plus a per-frame display
//! delay for animations. The output feeds directly into
//! [`pixlink_protocol::Command::Image`] and
//! [`pixlink_protocol::Command::Animation`].

mod encode;
mod error;

pub use encode::*;
pub use error::*;
