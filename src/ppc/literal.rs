//! Literal materialization: turning host constants into live register values.
//!
//! Integer literals split into a low half loaded as a signed immediate and,
//! when the low half cannot reproduce the whole value, a shifted high half
//! that compensates for the sign extension of the low part. The `+ 32768`
//! rounding term is the architecture's reference constant for that
//! compensation. Float literals go through the constant pool: the bit
//! pattern is stored at the kind's native width, a scratch general-purpose
//! register receives the pool address, and a precision-specific load brings
//! the value into the destination register. The scratch register is returned
//! to the allocator on every exit path.

use crate::core::error::{CodegenError, CodegenResult};
use crate::core::kind::{Kind, Literal};
use crate::core::registry::registry;
use crate::core::stream::{InstructionStream, Reg, RegClass};

use super::isa::{Instruction, Opcode, Src};

/// Materialize `literal` into `dst`, which must hold values of `kind`.
pub fn set_literal(
    stream: &mut InstructionStream,
    kind: Kind,
    dst: Reg,
    literal: Literal,
) -> CodegenResult<()> {
    match (kind, literal) {
        (Kind::Bits | Kind::UnsignedWord | Kind::SignedWord, Literal::Int(value)) => {
            set_integer(stream, dst, value);
            Ok(())
        }
        (Kind::SingleFloat, Literal::Float(value)) => {
            let bytes = (value as f32).to_bits().to_be_bytes();
            set_float(stream, dst, &bytes, Opcode::Lfs)
        }
        (Kind::DoubleFloat, Literal::Float(value)) => {
            let bytes = value.to_bits().to_be_bytes();
            set_float(stream, dst, &bytes, Opcode::Lfd)
        }
        (kind, literal) => Err(CodegenError::TypeMismatch {
            context: format!("literal initializer for {}", registry().storage(kind).name()),
            expected: match kind.register_class() {
                RegClass::Gp => "an integer literal",
                RegClass::Fp => "a float literal",
            },
            found: match literal {
                Literal::Int(_) => "an integer literal",
                Literal::Float(_) => "a float literal",
            },
        }),
    }
}

/// Low half as a signed immediate; high half added shifted when needed.
fn set_integer(stream: &mut InstructionStream, dst: Reg, value: i64) {
    log::debug!("materialize {value:#x} into {dst}");
    let low = ((value & 0xFFFF) as u16) as i16 as i32;
    stream.append(Instruction::new(
        Opcode::Addi,
        dst,
        vec![Src::Reg(Reg::gp(0)), Src::Imm(low)],
    ));

    // The shifted add of the high half carries the reference rounding term
    // for the sign extension of the low immediate.
    if (value & 0xFFFF) != value {
        let high = (((value.wrapping_add(32768) >> 16) & 0xFFFF) as u16) as i16 as i32;
        stream.append(Instruction::new(
            Opcode::Addis,
            dst,
            vec![Src::Reg(dst), Src::Imm(high)],
        ));
    }
}

/// Constant-pool entry plus a scratch-addressed precision-specific load.
fn set_float(
    stream: &mut InstructionStream,
    dst: Reg,
    bytes: &[u8],
    load: Opcode,
) -> CodegenResult<()> {
    let address = stream.add_constant(bytes);
    let scratch = stream.acquire_register(RegClass::Gp)?;
    set_integer(stream, scratch, address as i64);
    stream.append(Instruction::new(
        load,
        dst,
        vec![Src::Reg(scratch), Src::Imm(0)],
    ));
    stream.release_register(scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_integer_takes_one_instruction() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Gp).unwrap();
        set_literal(&mut stream, Kind::SignedWord, dst, Literal::Int(31)).unwrap();
        assert_eq!(stream.len(), 1);
        assert_eq!(stream.instructions()[0].opcode, Opcode::Addi);
        assert_eq!(stream.instructions()[0].srcs[1], Src::Imm(31));
    }

    #[test]
    fn wide_integer_takes_low_then_shifted_high() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Gp).unwrap();
        set_literal(&mut stream, Kind::Bits, dst, Literal::Int(0x0F0F_0FFF)).unwrap();
        assert_eq!(stream.len(), 2);
        assert_eq!(stream.instructions()[0].opcode, Opcode::Addi);
        assert_eq!(stream.instructions()[0].srcs[1], Src::Imm(0x0FFF));
        assert_eq!(stream.instructions()[1].opcode, Opcode::Addis);
        assert_eq!(stream.instructions()[1].srcs[1], Src::Imm(0x0F0F));
    }

    #[test]
    fn negative_low_half_rounds_the_high_half_up() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Gp).unwrap();
        set_literal(&mut stream, Kind::Bits, dst, Literal::Int(0x1234_8000)).unwrap();
        let instrs = stream.instructions();
        // Low half 0x8000 is -32768 as a signed immediate; the high half
        // compensates by rounding up to 0x1235.
        assert_eq!(instrs[0].srcs[1], Src::Imm(-0x8000));
        assert_eq!(instrs[1].srcs[1], Src::Imm(0x1235));
    }

    #[test]
    fn float_goes_through_the_constant_pool() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Fp).unwrap();
        set_literal(&mut stream, Kind::SingleFloat, dst, Literal::Float(1.0)).unwrap();
        assert_eq!(stream.constant_pool(), 1.0f32.to_bits().to_be_bytes());
        let load = stream.instructions().last().unwrap();
        assert_eq!(load.opcode, Opcode::Lfs);
        assert_eq!(load.dst, dst);

        set_literal(&mut stream, Kind::DoubleFloat, dst, Literal::Float(2.0)).unwrap();
        assert_eq!(stream.instructions().last().unwrap().opcode, Opcode::Lfd);
    }

    #[test]
    fn scratch_register_is_always_returned() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Fp).unwrap();
        let free_before = stream.free_count(RegClass::Gp);
        set_literal(&mut stream, Kind::DoubleFloat, dst, Literal::Float(3.0)).unwrap();
        assert_eq!(stream.free_count(RegClass::Gp), free_before);
    }

    #[test]
    fn scratch_scoping_holds_on_failure() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Fp).unwrap();
        let mut held = Vec::new();
        while let Ok(reg) = stream.acquire_register(RegClass::Gp) {
            held.push(reg);
        }
        let err = set_literal(&mut stream, Kind::SingleFloat, dst, Literal::Float(1.0));
        assert!(matches!(err, Err(CodegenError::RegistersExhausted { .. })));
        assert_eq!(stream.free_count(RegClass::Gp), 0);
    }

    #[test]
    fn literal_class_mismatch_is_rejected() {
        let mut stream = InstructionStream::new();
        let dst = stream.acquire_register(RegClass::Gp).unwrap();
        assert!(matches!(
            set_literal(&mut stream, Kind::SignedWord, dst, Literal::Float(1.0)),
            Err(CodegenError::TypeMismatch { .. })
        ));
        let fdst = stream.acquire_register(RegClass::Fp).unwrap();
        assert!(matches!(
            set_literal(&mut stream, Kind::SingleFloat, fdst, Literal::Int(1)),
            Err(CodegenError::TypeMismatch { .. })
        ));
    }
}
