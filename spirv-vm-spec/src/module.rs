//! # Module Loading
//!
//! A [`Module`] is the immutable, validated form of a SPIR-V binary: the
//! decoded header, the instruction words that follow it and a few pieces of
//! module-level metadata gathered while the framing is checked.

use serde::{Deserialize, Serialize};

use crate::encoding::WordCursor;
use crate::error::{Result, SpirvError};
use crate::{Id, Op, Word, HEADER_WORDS, MAGIC, MAGIC_SWAPPED, MAX_BOUND};

/// Decoded 5-word module header
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleHeader {
    /// Version word: `0 | major | minor | 0`, one byte each
    pub version: u32,
    /// Generator word: tool id in the high 16 bits, tool version in the low 16
    pub generator: u32,
    /// Every result ID is strictly below this value
    pub bound: u32,
    /// Reserved, expected to be 0
    pub schema: u32,
}

impl ModuleHeader {
    /// Header for a SPIR-V 1.0 module produced by `generator`
    pub fn new(bound: u32, generator: u32) -> Self {
        Self {
            version: 0x0001_0000,
            generator,
            bound,
            schema: 0,
        }
    }

    pub fn version_major(&self) -> u8 {
        (self.version >> 16) as u8
    }

    pub fn version_minor(&self) -> u8 {
        (self.version >> 8) as u8
    }

    /// Registered tool id of the generator
    pub fn generator_tool(&self) -> u16 {
        (self.generator >> 16) as u16
    }

    /// Name of the generator tool, when it is a registered one
    pub fn generator_name(&self) -> Option<&'static str> {
        let name = match self.generator_tool() {
            0 => "Khronos",
            1 => "LunarG",
            2 => "Valve",
            3 => "Codeplay",
            4 => "NVIDIA",
            5 => "ARM",
            6 => "Khronos LLVM/SPIR-V Translator",
            7 => "Khronos SPIR-V Tools Assembler",
            8 => "Khronos Glslang Reference Front End",
            9 => "Qualcomm",
            10 => "AMD",
            11 => "Intel",
            12 => "Imagination",
            13 => "Google Shaderc over Glslang",
            14 => "Google spiregg",
            15 => "Google rspirv",
            _ => return None,
        };
        Some(name)
    }

    /// Header as the first five module words
    pub fn to_words(self) -> [Word; HEADER_WORDS] {
        [MAGIC, self.version, self.generator, self.bound, self.schema]
    }
}

/// Language declared by `OpSource`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub language: u32,
    pub version: u32,
}

/// A loaded SPIR-V module
///
/// Construction validates the header and the instruction framing, so every
/// consumer can walk [`Module::cursor`] one instruction at a time without
/// re-checking word counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Module {
    header: ModuleHeader,
    words: Vec<Word>,
    capabilities: Vec<u32>,
    addressing_model: Option<u32>,
    memory_model: Option<u32>,
    source: Option<SourceInfo>,
    instruction_count: usize,
}

impl Module {
    /// Load a module from its binary form
    ///
    /// Modules written in either byte order are accepted.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 || bytes.len() < HEADER_WORDS * 4 {
            return Err(SpirvError::TruncatedFile { len: bytes.len() });
        }

        let chunks = bytes.chunks_exact(4);
        let first = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let words: Vec<Word> = if first == MAGIC_SWAPPED {
            chunks
                .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        } else {
            chunks
                .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect()
        };

        Self::from_words(&words)
    }

    /// Load a module from words already in host order
    pub fn from_words(words: &[Word]) -> Result<Self> {
        if words.len() < HEADER_WORDS {
            return Err(SpirvError::TruncatedFile { len: words.len() * 4 });
        }
        if words[0] != MAGIC {
            return Err(SpirvError::BadMagic(words[0]));
        }

        let header = ModuleHeader {
            version: words[1],
            generator: words[2],
            bound: words[3],
            schema: words[4],
        };
        if header.bound == 0 || header.bound > MAX_BOUND {
            return Err(SpirvError::InvalidBound(header.bound));
        }

        let mut module = Module {
            header,
            words: words[HEADER_WORDS..].to_vec(),
            capabilities: Vec::new(),
            addressing_model: None,
            memory_model: None,
            source: None,
            instruction_count: 0,
        };
        module.scan()?;
        Ok(module)
    }

    /// Walk the framing once and record module-level metadata
    fn scan(&mut self) -> Result<()> {
        let mut cursor = WordCursor::with_base(&self.words, HEADER_WORDS);
        let mut count = 0;
        while !cursor.is_empty() {
            let (header, offset, mut operands) = cursor.next_instruction()?;
            count += 1;
            let truncated = |_| SpirvError::malformed(offset, header.opcode, "missing operands");
            match Op::from_u16(header.opcode) {
                Some(Op::Capability) => {
                    let capability = operands.read_word().map_err(truncated)?;
                    self.capabilities.push(capability);
                }
                Some(Op::MemoryModel) => {
                    self.addressing_model = Some(operands.read_word().map_err(truncated)?);
                    self.memory_model = Some(operands.read_word().map_err(truncated)?);
                }
                Some(Op::Source) => {
                    self.source = Some(SourceInfo {
                        language: operands.read_word().map_err(truncated)?,
                        version: operands.read_word().map_err(truncated)?,
                    });
                }
                _ => {}
            }
        }
        self.instruction_count = count;
        Ok(())
    }

    /// Re-emit the module as little-endian bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_words()
            .iter()
            .flat_map(|word| word.to_le_bytes())
            .collect()
    }

    /// Header followed by the instruction words
    pub fn to_words(&self) -> Vec<Word> {
        let mut words = Vec::with_capacity(HEADER_WORDS + self.words.len());
        words.extend_from_slice(&self.header.to_words());
        words.extend_from_slice(&self.words);
        words
    }

    pub fn header(&self) -> &ModuleHeader {
        &self.header
    }

    /// Exclusive upper limit on result IDs
    pub fn bound(&self) -> Id {
        self.header.bound
    }

    /// Instruction words, header excluded
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Cursor over the instruction stream; offsets count from the file start
    pub fn cursor(&self) -> WordCursor<'_> {
        WordCursor::with_base(&self.words, HEADER_WORDS)
    }

    /// Raw capability values, in declaration order
    pub fn capabilities(&self) -> &[u32] {
        &self.capabilities
    }

    pub fn addressing_model(&self) -> Option<u32> {
        self.addressing_model
    }

    pub fn memory_model(&self) -> Option<u32> {
        self.memory_model
    }

    pub fn source(&self) -> Option<SourceInfo> {
        self.source
    }

    pub fn instruction_count(&self) -> usize {
        self.instruction_count
    }
}
