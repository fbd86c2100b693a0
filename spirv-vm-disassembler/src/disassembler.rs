//! Main disassembler logic

use spirv_vm_spec::{Module, Word};

use crate::decoder::decode;
use crate::error::Result;
use crate::formatter::format;

/// Disassemble a module into assembly text
///
/// The listing starts with a comment block describing the header, followed
/// by one instruction per line with result IDs right-aligned.
pub fn disassemble(module: &Module) -> Result<String> {
    let header = module.header();
    let instructions = decode(module.words(), spirv_vm_spec::HEADER_WORDS)?;

    let mut output = String::new();
    output.push_str("; SPIR-V\n");
    output.push_str(&format!(
        "; Version: {}.{}\n",
        header.version_major(),
        header.version_minor()
    ));
    let generator = match header.generator_name() {
        Some(name) => name.to_string(),
        None => format!("Unknown({})", header.generator_tool()),
    };
    output.push_str(&format!(
        "; Generator: {}; {}\n",
        generator,
        header.generator & 0xFFFF
    ));
    output.push_str(&format!("; Bound: {}\n", header.bound));
    output.push_str(&format!("; Schema: {}\n", header.schema));

    let width = instructions
        .iter()
        .filter_map(|inst| inst.result)
        .map(|id| id.to_string().len() + 1)
        .max()
        .unwrap_or(0);

    for inst in &instructions {
        let text = format(inst);
        match inst.result {
            Some(id) => {
                let result = format!("%{id}");
                output.push_str(&format!("{result:>width$} = {text}\n"));
            }
            None if width > 0 => {
                output.push_str(&format!("{:width$}   {text}\n", ""));
            }
            None => {
                output.push_str(&text);
                output.push('\n');
            }
        }
    }

    Ok(output)
}

/// Load and disassemble a module given as words
pub fn disassemble_words(words: &[Word]) -> Result<String> {
    disassemble(&Module::from_words(words)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use spirv_vm_spec::{encode_header, ModuleHeader, Op};

    #[test]
    fn test_disassemble_simple() {
        let mut words = ModuleHeader::new(3, 8 << 16 | 11).to_words().to_vec();
        words.extend([encode_header(Op::Capability.to_u16(), 2), 1]);
        words.extend([encode_header(Op::TypeFloat.to_u16(), 3), 2, 32]);

        let asm = disassemble_words(&words).unwrap();
        assert!(asm.contains("; Version: 1.0\n"));
        assert!(asm.contains("; Generator: Khronos Glslang Reference Front End; 11\n"));
        assert!(asm.contains("; Bound: 3\n"));
        assert!(asm.contains("     OpCapability Shader\n"));
        assert!(asm.contains("%2 = OpTypeFloat 32\n"));
    }

    #[test]
    fn test_disassemble_rejects_bad_magic() {
        assert!(disassemble_words(&[0, 0, 0, 1, 0]).is_err());
    }
}
