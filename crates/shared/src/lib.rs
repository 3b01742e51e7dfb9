//! Wire and domain types shared between the upscale workflow controller and its front-ends.

pub mod domain;
pub mod error;
pub mod protocol;
