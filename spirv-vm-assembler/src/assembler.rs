//! Main assembler logic

use spirv_vm_spec::{Module, ModuleHeader, Word};

use crate::encoder::Encoder;
use crate::error::Result;
use crate::parser::parse;

/// Generator word written into assembled headers
pub const GENERATOR: u32 = 0;

/// Assemble source text into a loaded module
pub fn assemble(source: &str) -> Result<Module> {
    Ok(Module::from_words(&assemble_words(source)?)?)
}

/// Assemble source text into module words, header included
///
/// The words are not validated; use [`assemble`] for a checked module.
pub fn assemble_words(source: &str) -> Result<Vec<Word>> {
    let statements = parse(source)?;
    let mut encoder = Encoder::new(&statements)?;

    let mut words = ModuleHeader::new(encoder.bound(), GENERATOR).to_words().to_vec();
    for stmt in &statements {
        words.extend(encoder.encode(stmt)?);
    }
    Ok(words)
}
