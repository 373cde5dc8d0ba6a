//! Flat binary memory images.
//!
//! An image file is a bare sequence of 3-byte big-endian words, word N
//! belonging at memory address N. There is no header and no metadata;
//! loading an image touches neither the program counter nor the
//! registers. The byte decode itself lives in [`Memory::load_image`];
//! this module is the file layer around it, plus a snapshot writer.

use crate::signmag::Word;
use crate::cpu::Memory;
use crate::cpu::memory::MEMORY_SIZE;
use std::path::Path;
use std::io::Write;
use thiserror::Error;

/// Bytes per memory word in an image file.
pub const WORD_BYTES: usize = 3;

/// Encode words into image bytes.
pub fn encode_bytes(words: &[Word]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * WORD_BYTES);
    for word in words {
        let raw = word.raw();
        bytes.push((raw >> 16) as u8);
        bytes.push((raw >> 8) as u8);
        bytes.push(raw as u8);
    }
    bytes
}

/// Load a binary image file into memory, starting at address 0.
///
/// Stops at end-of-input or when memory is full; oversize input and a
/// trailing partial word are reported through the log and otherwise
/// ignored. Returns the number of words written.
pub fn load_image<P: AsRef<Path>>(path: P, mem: &mut Memory) -> Result<usize, ImageError> {
    let bytes = std::fs::read(path.as_ref()).map_err(|e| ImageError::Io(e.to_string()))?;

    if bytes.len() % WORD_BYTES != 0 {
        log::warn!(
            "image ends with a partial word ({} trailing bytes ignored)",
            bytes.len() % WORD_BYTES
        );
    }
    if bytes.len() / WORD_BYTES > MEMORY_SIZE {
        log::warn!(
            "image holds {} words; truncated to memory size {}",
            bytes.len() / WORD_BYTES,
            MEMORY_SIZE
        );
    }

    Ok(mem.load_image(&bytes))
}

/// Save a snapshot of memory words as a binary image file.
pub fn save_image<P: AsRef<Path>>(path: P, words: &[Word]) -> Result<(), ImageError> {
    let mut file =
        std::fs::File::create(path.as_ref()).map_err(|e| ImageError::Io(e.to_string()))?;

    file.write_all(&encode_bytes(words))
        .map_err(|e| ImageError::Io(e.to_string()))?;

    Ok(())
}

/// Errors that can occur during image file operations.
#[derive(Debug, Clone, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_bytes_big_endian() {
        let bytes = encode_bytes(&[Word::from_raw(0x123456), Word::from_raw(0x800005)]);
        assert_eq!(bytes, [0x12, 0x34, 0x56, 0x80, 0x00, 0x05]);
    }

    #[test]
    fn test_encode_then_load_roundtrip() {
        let words = vec![
            Word::zero(),
            Word::from_i32(42),
            Word::from_i32(-42),
            Word::from_raw(Word::MASK),
        ];

        let bytes = encode_bytes(&words);
        assert_eq!(bytes.len(), words.len() * WORD_BYTES);

        let mut mem = Memory::new();
        assert_eq!(mem.load_image(&bytes), words.len());
        for (addr, word) in words.iter().enumerate() {
            assert_eq!(mem.read(addr as u16), *word);
        }
    }
}
