//! Data models for the wallpaper archive.

mod index;
mod record;
mod region;

pub use index::*;
pub use record::*;
pub use region::*;

#[cfg(test)]
pub(crate) use record::sample_record;
