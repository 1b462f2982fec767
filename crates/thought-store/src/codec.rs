//! Dictionary-trained compression for persisted values.
//!
//! Values are zstd-compressed per namespace. A namespace may register a
//! precomputed dictionary artifact at open time; without one the namespace
//! still compresses, just without the trained dictionary.

use std::collections::HashMap;
use std::io::{Cursor, Read, Write};
use std::path::Path;

/// Default zstd compression level (zstd's own default).
const COMPRESSION_LEVEL: i32 = 3;

/// Streaming zstd codec with optional trained dictionaries per namespace.
pub struct DictionaryCodec {
    level: i32,
    dictionaries: HashMap<String, Vec<u8>>,
}

impl DictionaryCodec {
    /// Creates a codec with no registered dictionaries.
    pub fn new() -> Self {
        Self {
            level: COMPRESSION_LEVEL,
            dictionaries: HashMap::new(),
        }
    }

    /// Registers a dictionary for a namespace from raw bytes.
    pub fn register(&mut self, namespace: impl Into<String>, dictionary: Vec<u8>) {
        self.dictionaries.insert(namespace.into(), dictionary);
    }

    /// Loads a dictionary artifact from disk and registers it.
    pub fn load_dictionary(
        &mut self,
        namespace: impl Into<String>,
        path: &Path,
    ) -> std::io::Result<()> {
        let dictionary = std::fs::read(path)?;
        self.register(namespace, dictionary);
        Ok(())
    }

    /// Compresses a value under the given namespace.
    pub fn compress(&self, namespace: &str, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self.dictionaries.get(namespace) {
            Some(dictionary) => {
                let mut encoder =
                    zstd::stream::Encoder::with_dictionary(Vec::new(), self.level, dictionary)?;
                encoder.write_all(data)?;
                encoder.finish()
            }
            None => zstd::stream::encode_all(Cursor::new(data), self.level),
        }
    }

    /// Decompresses a value stored under the given namespace.
    pub fn decompress(&self, namespace: &str, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self.dictionaries.get(namespace) {
            Some(dictionary) => {
                let mut decoder =
                    zstd::stream::Decoder::with_dictionary(Cursor::new(data), dictionary)?;
                let mut out = Vec::new();
                decoder.read_to_end(&mut out)?;
                Ok(out)
            }
            None => zstd::stream::decode_all(Cursor::new(data)),
        }
    }
}

impl Default for DictionaryCodec {
    fn default() -> Self {
        Self::new()
    }
}
