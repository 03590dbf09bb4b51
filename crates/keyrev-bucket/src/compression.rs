use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::{BucketError, BucketResult};

pub const DEFAULT_GZIP_LEVEL: u32 = 6;

/// Encodes non-JSON values before they are written to the latest store.
///
/// The output must be a complete gzip member: readers are told the stored
/// value is `content-encoding: gzip`. Called on the blocking pool.
pub trait Compressor: Send + Sync + fmt::Debug {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>>;
}

/// flate2 gzip at a fixed level.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gzip {
    level: u32,
}

impl Gzip {
    /// Levels above 9 are clamped.
    pub fn new(level: u32) -> Self {
        Self { level: level.min(9) }
    }

    pub fn level(&self) -> u32 {
        self.level
    }
}

impl Default for Gzip {
    fn default() -> Self {
        Self::new(DEFAULT_GZIP_LEVEL)
    }
}

impl Compressor for Gzip {
    fn compress(&self, data: &[u8]) -> io::Result<Vec<u8>> {
        gzip(data, self.level)
    }
}

/// gzip `data` in one shot. The stream is finished before returning.
pub fn gzip(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let buf = Vec::with_capacity(data.len() / 2 + 32);
    let mut encoder = GzEncoder::new(buf, Compression::new(level.min(9)));
    encoder.write_all(data)?;
    encoder.finish()
}

/// Run `compressor` over `data` on the blocking pool.
///
/// Either the complete compressed value or a [`BucketError::Compression`]
/// comes back; no partial output is observable.
pub async fn compress_async(compressor: Arc<dyn Compressor>, data: Bytes) -> BucketResult<Bytes> {
    tokio::task::spawn_blocking(move || compressor.compress(&data))
        .await
        .map_err(|e| BucketError::Compression(io::Error::other(e)))?
        .map(Bytes::from)
        .map_err(BucketError::Compression)
}
