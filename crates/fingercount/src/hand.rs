//! Hand landmarks and what can be derived from them.
//!
//! - [`landmark`]: the 21-point hand model and per-hand observations.
//! - [`fingers`]: the extended/curled classification of each finger.
//! - [`provider`]: sources of hand observations.

pub mod fingers;
pub mod landmark;
pub mod provider;
