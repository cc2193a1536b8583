//! Stream compression codecs for archive containers.
//!
//! Provides transparent compression/decompression using gzip or zstd. One
//! codec sink is opened per archive so compression context is shared across
//! every entry.

use std::io::{self, BufReader, Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression as GzipCompression;

/// Compression codec wrapped around an archive container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    /// Gzip compression (widely compatible).
    Gzip,
    /// Zstd compression (fast, good ratio).
    #[default]
    Zstd,
}

impl Codec {
    pub const ALL: [Codec; 2] = [Codec::Zstd, Codec::Gzip];

    /// Get a human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }

    /// Archive file extension for this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gzip => "tar.gz",
            Self::Zstd => "tar.zst",
        }
    }

    /// Detect the codec from an archive file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|codec| name.ends_with(codec.extension()))
    }

    /// Wrap a writer in this codec's encoder.
    pub fn writer<W: Write>(
        &self,
        writer: W,
        level: CompressionLevel,
    ) -> io::Result<CodecWriter<W>> {
        let inner = match self {
            Self::Gzip => {
                let gzip_level = GzipCompression::new(level.value() as u32);
                CodecWriterInner::Gzip(GzEncoder::new(writer, gzip_level))
            }
            Self::Zstd => {
                let mut encoder = zstd::Encoder::new(writer, level.value() as i32)?;
                // Parallel block compression; the output stream stays
                // sequential and deterministic.
                encoder.multithread(num_cpus::get() as u32)?;
                CodecWriterInner::Zstd(encoder)
            }
        };
        Ok(CodecWriter { inner })
    }

    /// Wrap a reader in this codec's decoder.
    pub fn reader<R: Read>(&self, reader: R) -> io::Result<CodecReader<R>> {
        let inner = match self {
            Self::Gzip => CodecReaderInner::Gzip(GzDecoder::new(reader)),
            Self::Zstd => CodecReaderInner::Zstd(zstd::Decoder::new(reader)?),
        };
        Ok(CodecReader { inner })
    }
}

/// Compression level (1-9, where 1 is fastest-lowest and 9 is slowest-highest).
#[derive(Debug, Clone, Copy)]
pub struct CompressionLevel(u8);

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(3)
    }
}

impl CompressionLevel {
    /// Create a new compression level (clamped to 1-9).
    pub fn new(level: u8) -> Self {
        Self(level.clamp(1, 9))
    }

    /// Fastest compression (level 1).
    pub fn fast() -> Self {
        Self(1)
    }

    /// Balanced compression (level 3).
    pub fn balanced() -> Self {
        Self(3)
    }

    /// Maximum compression (level 9).
    pub fn max() -> Self {
        Self(9)
    }

    /// Get the level value.
    pub fn value(&self) -> u8 {
        self.0
    }
}

/// Compressed writer wrapper.
pub struct CodecWriter<W: Write> {
    inner: CodecWriterInner<W>,
}

enum CodecWriterInner<W: Write> {
    Gzip(GzEncoder<W>),
    Zstd(zstd::Encoder<'static, W>),
}

impl<W: Write> CodecWriter<W> {
    /// Finish the compressed frame and get the inner writer back.
    pub fn finish(self) -> io::Result<W> {
        match self.inner {
            CodecWriterInner::Gzip(w) => w.finish(),
            CodecWriterInner::Zstd(w) => w.finish(),
        }
    }
}

impl<W: Write> Write for CodecWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            CodecWriterInner::Gzip(w) => w.write(buf),
            CodecWriterInner::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            CodecWriterInner::Gzip(w) => w.flush(),
            CodecWriterInner::Zstd(w) => w.flush(),
        }
    }
}

/// Compressed reader wrapper.
pub struct CodecReader<R: Read> {
    inner: CodecReaderInner<R>,
}

enum CodecReaderInner<R: Read> {
    Gzip(GzDecoder<R>),
    Zstd(zstd::Decoder<'static, BufReader<R>>),
}

impl<R: Read> Read for CodecReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            CodecReaderInner::Gzip(r) => r.read(buf),
            CodecReaderInner::Zstd(r) => r.read(buf),
        }
    }
}
