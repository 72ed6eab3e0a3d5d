//! Chunking strategy implementations

mod fixed_size;
mod recursive;

pub use fixed_size::FixedSizeChunker;
pub use recursive::RecursiveChunker;
