//! # Instruction Stream Encoding
//!
//! Every instruction starts with a header word packing the opcode and the
//! total word count (header included):
//!
//! ```text
//! [word_count:16][opcode:16]
//! ```
//!
//! followed by `word_count - 1` operand words. Literal strings are packed
//! little-endian, four bytes per word, NUL-terminated and zero-padded to a
//! word boundary.

use crate::error::{Result, SpirvError};
use crate::Word;

// ============================================================================
// Header Constants
// ============================================================================

/// Opcode field: bits 0-15
pub const OPCODE_MASK: u32 = 0xFFFF;

/// Word count field: bits 16-31
pub const WORD_COUNT_SHIFT: u32 = 16;

/// Extract opcode from an instruction header word
#[inline]
pub const fn extract_opcode(word: Word) -> u16 {
    (word & OPCODE_MASK) as u16
}

/// Extract word count from an instruction header word
#[inline]
pub const fn extract_word_count(word: Word) -> u16 {
    (word >> WORD_COUNT_SHIFT) as u16
}

/// Encode an instruction header word
#[inline]
pub const fn encode_header(opcode: u16, word_count: u16) -> Word {
    ((word_count as u32) << WORD_COUNT_SHIFT) | opcode as u32
}

/// Number of words a literal string occupies, terminator and padding included
#[inline]
pub const fn string_word_len(byte_len: usize) -> usize {
    byte_len / 4 + 1
}

/// Pack a literal string into words
pub fn encode_string(text: &str) -> Vec<Word> {
    let bytes = text.as_bytes();
    let mut words = vec![0u32; string_word_len(bytes.len())];
    for (i, &byte) in bytes.iter().enumerate() {
        words[i / 4] |= (byte as u32) << ((i % 4) * 8);
    }
    words
}

/// Decoded instruction header
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InstructionHeader {
    /// Raw opcode number
    pub opcode: u16,
    /// Total word count, header included
    pub word_count: u16,
}

impl InstructionHeader {
    /// Decode a header word
    #[inline]
    pub const fn from_word(word: Word) -> Self {
        Self {
            opcode: extract_opcode(word),
            word_count: extract_word_count(word),
        }
    }

    /// Number of operand words following the header
    #[inline]
    pub const fn operand_count(&self) -> usize {
        (self.word_count as usize).saturating_sub(1)
    }
}

// ============================================================================
// Word Cursor
// ============================================================================

/// Read position over a borrowed slice of words
///
/// Offsets reported in errors are relative to `base`, so a cursor over one
/// instruction's operands still reports positions within the whole stream.
#[derive(Clone, Debug)]
pub struct WordCursor<'a> {
    words: &'a [Word],
    pos: usize,
    base: usize,
}

impl<'a> WordCursor<'a> {
    /// Cursor at the start of `words`
    pub fn new(words: &'a [Word]) -> Self {
        Self::with_base(words, 0)
    }

    /// Cursor whose offsets are reported relative to `base`
    pub fn with_base(words: &'a [Word], base: usize) -> Self {
        Self { words, pos: 0, base }
    }

    /// Absolute offset of the next word
    #[inline]
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    /// Move to an absolute offset
    pub fn seek(&mut self, offset: usize) -> Result<()> {
        let pos = offset
            .checked_sub(self.base)
            .filter(|&pos| pos <= self.words.len())
            .ok_or(SpirvError::EndOfStream { offset })?;
        self.pos = pos;
        Ok(())
    }

    /// Words not yet consumed
    #[inline]
    pub fn remaining(&self) -> usize {
        self.words.len() - self.pos
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Read one word
    pub fn read_word(&mut self) -> Result<Word> {
        let word = *self
            .words
            .get(self.pos)
            .ok_or(SpirvError::EndOfStream { offset: self.offset() })?;
        self.pos += 1;
        Ok(word)
    }

    /// Read one word if any remain
    pub fn read_optional(&mut self) -> Option<Word> {
        self.read_word().ok()
    }

    /// Read `n` words as a slice
    pub fn read_words(&mut self, n: usize) -> Result<&'a [Word]> {
        if n > self.remaining() {
            return Err(SpirvError::EndOfStream {
                offset: self.base + self.words.len(),
            });
        }
        let slice = &self.words[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read every remaining word
    pub fn read_rest(&mut self) -> &'a [Word] {
        let slice = &self.words[self.pos..];
        self.pos = self.words.len();
        slice
    }

    /// Skip `n` words
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.read_words(n).map(|_| ())
    }

    /// Decode the header at the cursor without consuming it
    pub fn peek_header(&self) -> Result<InstructionHeader> {
        self.words
            .get(self.pos)
            .map(|&word| InstructionHeader::from_word(word))
            .ok_or(SpirvError::EndOfStream { offset: self.offset() })
    }

    /// Consume one instruction, returning its header, its offset and a cursor
    /// bounded to its operands
    pub fn next_instruction(&mut self) -> Result<(InstructionHeader, usize, WordCursor<'a>)> {
        let offset = self.offset();
        let header = self.peek_header()?;
        if header.word_count == 0 {
            return Err(SpirvError::malformed(offset, header.opcode, "word count is 0"));
        }
        if header.word_count as usize > self.remaining() {
            return Err(SpirvError::malformed(
                offset,
                header.opcode,
                format!(
                    "word count {} runs past the end of the stream ({} words left)",
                    header.word_count,
                    self.remaining()
                ),
            ));
        }
        self.pos += 1;
        let operands = self.read_words(header.operand_count())?;
        Ok((header, offset, WordCursor::with_base(operands, offset + 1)))
    }

    /// Read a packed NUL-terminated string and advance past its padding
    pub fn read_literal_string(&mut self) -> Result<String> {
        let start = self.offset();
        let mut bytes = Vec::new();
        loop {
            let word = self
                .read_word()
                .map_err(|_| SpirvError::UnterminatedString { offset: start })?;
            for byte in word.to_le_bytes() {
                if byte == 0 {
                    return String::from_utf8(bytes)
                        .map_err(|_| SpirvError::InvalidString { offset: start });
                }
                bytes.push(byte);
            }
        }
    }
}
