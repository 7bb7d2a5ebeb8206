//! Bytecode walking for decision-point counting
//!
//! Walks a method's `Code` array opcode by opcode and counts decision
//! points: the two-way conditional branches (`if*`, `ifnull`, `ifnonnull`)
//! and every case of `tableswitch`/`lookupswitch`.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;

/// Sentinel for opcodes with variable or padded encodings
const VARIABLE: u8 = 0;
/// Sentinel for opcodes that must not appear in a classfile
const RESERVED: u8 = 0xFF;

/// Instruction length (including the opcode byte) per opcode
static OPCODE_LENGTHS: Lazy<[u8; 256]> = Lazy::new(|| {
    let mut lengths = [1u8; 256];
    // One operand byte.
    for op in [0x10, 0x12, 0xA9, 0xBC] {
        lengths[op] = 2;
    }
    for op in 0x15..=0x19 {
        lengths[op] = 2; // iload..aload
    }
    for op in 0x36..=0x3A {
        lengths[op] = 2; // istore..astore
    }
    // Two operand bytes.
    for op in [0x11, 0x13, 0x14, 0x84, 0xBB, 0xBD, 0xC0, 0xC1, 0xC6, 0xC7] {
        lengths[op] = 3;
    }
    for op in 0x99..=0xA8 {
        lengths[op] = 3; // ifeq..jsr
    }
    for op in 0xB2..=0xB8 {
        lengths[op] = 3; // getstatic..invokestatic
    }
    // Longer fixed encodings.
    lengths[0xC5] = 4; // multianewarray
    for op in [0xB9, 0xBA, 0xC8, 0xC9] {
        lengths[op] = 5; // invokeinterface, invokedynamic, goto_w, jsr_w
    }
    // Variable encodings.
    for op in [0xAA, 0xAB, 0xC4] {
        lengths[op] = VARIABLE; // tableswitch, lookupswitch, wide
    }
    // Reserved opcodes and the undefined range.
    for op in 0xCA..=0xFF {
        lengths[op] = RESERVED;
    }
    lengths
});

fn read_i32_at(code: &[u8], at: usize) -> Result<i32> {
    let end = at.checked_add(4).ok_or(Error::UnexpectedEof)?;
    let bytes: [u8; 4] = code
        .get(at..end)
        .ok_or(Error::UnexpectedEof)?
        .try_into()
        .map_err(|_| Error::UnexpectedEof)?;
    Ok(i32::from_be_bytes(bytes))
}

/// Count decision points over one method's code array
pub fn count_decision_points(code: &[u8]) -> Result<u32> {
    let mut count = 0u32;
    let mut pc = 0usize;
    while pc < code.len() {
        let opcode = code[pc];
        match opcode {
            // tableswitch: 0-3 pad bytes, default, low, high, offsets
            0xAA => {
                let base = pc + 1 + (4 - (pc + 1) % 4) % 4;
                let low = read_i32_at(code, base + 4)?;
                let high = read_i32_at(code, base + 8)?;
                if high < low {
                    return Err(Error::Malformed("tableswitch high < low"));
                }
                let cases = (high as i64 - low as i64 + 1) as usize;
                count += cases as u32;
                pc = base + 12 + cases * 4;
            }
            // lookupswitch: 0-3 pad bytes, default, npairs, pairs
            0xAB => {
                let base = pc + 1 + (4 - (pc + 1) % 4) % 4;
                let npairs = read_i32_at(code, base + 4)?;
                if npairs < 0 {
                    return Err(Error::Malformed("lookupswitch negative npairs"));
                }
                count += npairs as u32;
                pc = base + 8 + npairs as usize * 8;
            }
            // wide: widened form of a local-variable instruction
            0xC4 => {
                let widened = *code.get(pc + 1).ok_or(Error::UnexpectedEof)?;
                pc += if widened == 0x84 { 6 } else { 4 };
            }
            _ => {
                if (0x99..=0xA6).contains(&opcode) || opcode == 0xC6 || opcode == 0xC7 {
                    count += 1;
                }
                match OPCODE_LENGTHS[opcode as usize] {
                    RESERVED => return Err(Error::InvalidOpcode { opcode, pc }),
                    length => pc += length as usize,
                }
            }
        }
        if pc > code.len() {
            return Err(Error::UnexpectedEof);
        }
    }
    Ok(count)
}
