//! Raised-finger counting on top of hand landmark estimation.
//!
//! A hand landmark provider (typically a MediaPipe-style neural network) supplies 21 landmarks per
//! detected hand together with a handedness label. This crate turns those landmarks into a
//! per-finger "extended" decision, sums them up per frame, and draws the result onto the frame.
//!
//! # 2D Coordinates
//!
//! Landmarks use image coordinates: X points to the right, Y points *down*. Providers report them
//! normalized to `[0, 1]` relative to the image width and height; [`HandObservation::to_pixels`]
//! maps them into pixel space. The finger classifier works in either space, as long as both
//! coordinates of a hand use the same one.
//!
//! # Environment Variables
//!
//! * `RUST_LOG`: overrides the log filter installed by [`init_logger!`].
//!
//! [`HandObservation::to_pixels`]: hand::landmark::HandObservation::to_pixels

use log::LevelFilter;

pub mod count;
pub mod gui;
pub mod hand;
pub mod image;
pub mod landmark;
pub mod pipeline;
pub mod timer;
pub mod video;


/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and this crate will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` is applied on top.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
