//! C3: EVM bytecode opcode walker.
//!
//! Walks one opcode at a time, skipping PUSH* immediate-data spans, so that
//! `0xFF`/`0xF4` bytes embedded in push payloads are never mistaken for
//! `SELFDESTRUCT`/`DELEGATECALL`. Grounded on
//! `original_source/.../security/scam_database.py::analyze_bytecode`.

use crate::types::BytecodeAnalysis;

const SELFDESTRUCT: u8 = 0xFF;
const DELEGATECALL: u8 = 0xF4;
const PUSH1: u8 = 0x60;
const PUSH32: u8 = 0x7F;

/// Analyzes raw EVM bytecode (hex string, `0x` prefix optional) for
/// `SELFDESTRUCT`/`DELEGATECALL` opcodes.
///
/// Malformed odd-length tails or non-hex bytes at a position advance by one
/// byte instead of failing; empty or `0x`/`0x0` bytecode returns the zero
/// analysis.
pub fn analyze_bytecode(bytecode: &str) -> BytecodeAnalysis {
    let mut result = BytecodeAnalysis::default();

    let raw = bytecode.strip_prefix("0x").unwrap_or(bytecode);
    if raw.is_empty() || raw == "0" {
        return result;
    }

    let bytes: Vec<u8> = raw.as_bytes().to_vec();
    let len = bytes.len();
    let mut i = 0usize;

    while i + 2 <= len {
        let byte_hex = std::str::from_utf8(&bytes[i..i + 2]).unwrap_or("");
        let opcode = match u8::from_str_radix(byte_hex, 16) {
            Ok(op) => op,
            Err(_) => {
                i += 2;
                continue;
            }
        };

        if opcode == SELFDESTRUCT {
            result.has_selfdestruct = true;
            result.patterns.push("SELFDESTRUCT opcode found".to_string());
        }
        if opcode == DELEGATECALL {
            result.has_delegatecall = true;
            result.patterns.push("DELEGATECALL opcode found".to_string());
        }

        if (PUSH1..=PUSH32).contains(&opcode) {
            let push_bytes = (opcode - (PUSH1 - 1)) as usize;
            i += 2 + push_bytes * 2;
        } else {
            i += 2;
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytecode_is_clean() {
        let a = analyze_bytecode("0x");
        assert!(!a.has_selfdestruct);
        assert!(!a.has_delegatecall);
        assert!(a.patterns.is_empty());
    }

    #[test]
    fn bare_selfdestruct_is_detected() {
        let a = analyze_bytecode("0xff");
        assert!(a.has_selfdestruct);
    }

    #[test]
    fn bare_delegatecall_is_detected() {
        let a = analyze_bytecode("0xf4");
        assert!(a.has_delegatecall);
    }

    /// Property 6: a PUSH32 with an `0xFF`-filled immediate span
    /// must not trip `has_selfdestruct`.
    #[test]
    fn selfdestruct_byte_inside_push32_payload_is_ignored() {
        let bytecode = format!("0x7f{}00", "ff".repeat(32));
        let a = analyze_bytecode(&bytecode);
        assert!(!a.has_selfdestruct);
        assert!(!a.has_delegatecall);
    }

    #[test]
    fn delegatecall_byte_inside_push1_payload_is_ignored() {
        // PUSH1 0xf4 — the 0xf4 is immediate data, not an opcode.
        let a = analyze_bytecode("0x60f400");
        assert!(!a.has_delegatecall);
    }

    #[test]
    fn malformed_hex_advances_one_byte_without_failing() {
        let a = analyze_bytecode("0xzzff");
        // "zz" is skipped as malformed, "ff" is then read as SELFDESTRUCT.
        assert!(a.has_selfdestruct);
    }
}
