//! Call argument model and the request checksum computed over it.

pub mod argument;
pub mod engine;
pub mod preset;

pub use argument::CallArgument;
pub use engine::{checksum, checksum_tree};
pub use preset::ChecksumPreset;
