//! Sprite sheet packing.
//!
//! The orchestrator only sees the [`Packer`] trait: image bytes in, one
//! sheet plus one placement per input out. [`BinaryTreePacker`] is the
//! default implementation.

mod binary_tree;

use std::path::PathBuf;

use super::SpriteError;

pub use binary_tree::BinaryTreePacker;

/// One scanned image handed to the packer.
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Where one source image landed inside the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Scanned path of the source image.
    pub filename: PathBuf,
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Encoded sheet plus placements in input order.
#[derive(Debug, Clone)]
pub struct PackedSheet {
    pub bytes: Vec<u8>,
    pub placements: Vec<Placement>,
}

/// Packs a set of images into a single sheet.
///
/// Called from a blocking worker thread, so implementations may do
/// CPU-heavy work synchronously.
pub trait Packer: Send + Sync {
    fn pack(&self, images: &[SourceImage]) -> Result<PackedSheet, SpriteError>;
}
