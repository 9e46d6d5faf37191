//! HTTP Routes

pub mod download;
pub mod results;
pub mod upload;
