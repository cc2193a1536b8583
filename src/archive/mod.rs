//! Archive container support.
//!
//! A tar stream nested inside a general-purpose compressor: each entry is
//! self-describing (path, kind, mode, size, payload) independent of the
//! compression framing.

pub mod codec;
pub mod reader;
pub mod writer;

pub use codec::{Codec, CodecReader, CodecWriter, CompressionLevel};
pub use reader::{extract, ExtractStats};
pub use writer::ArchiveWriter;
