//! Service layer over the converter.
//!
//! [`PandocIntegration`] is what front ends talk to: it is only constructed
//! once pandoc has been verified and the output directory exists.

mod integration;

pub use integration::PandocIntegration;
