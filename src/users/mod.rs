//! User administration and profile images

pub mod api;
pub mod images;

pub use images::{DiskImageStore, ImageStore};
