// This module implements the instruction stream that all code synthesis
// targets: an append-only instruction buffer where emission order is execution
// order, a bitmask-based register allocator over the general-purpose and
// floating-point banks, and a read-only constant pool for materialized float
// literals. The allocator hands out caller-save registers only, never reissues
// a held register, and reports double releases as errors; the operator algebra
// relies on both guarantees when it scopes temporary registers around
// expression evaluation. Streams are usually shared through a StreamHandle
// (Rc<RefCell<...>>) so that the active-target context and every Variable
// bound to the stream can reach the same buffer.

//! Instruction stream, register allocation, and constant pool.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::error::{CodegenError, CodegenResult};
use crate::ppc::isa::Instruction;

/// Register banks of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegClass {
    /// General-purpose (integer) registers.
    Gp,
    /// Floating-point registers.
    Fp,
}

impl fmt::Display for RegClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegClass::Gp => f.write_str("general-purpose"),
            RegClass::Fp => f.write_str("floating-point"),
        }
    }
}

/// A concrete register: bank plus index within the bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reg {
    pub class: RegClass,
    pub id: u8,
}

impl Reg {
    pub const fn gp(id: u8) -> Self {
        Reg { class: RegClass::Gp, id }
    }

    pub const fn fp(id: u8) -> Self {
        Reg { class: RegClass::Fp, id }
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.class {
            RegClass::Gp => write!(f, "r{}", self.id),
            RegClass::Fp => write!(f, "f{}", self.id),
        }
    }
}

/// Shared handle to an instruction stream.
pub type StreamHandle = Rc<RefCell<InstructionStream>>;

/// Base address of the constant pool as seen by generated code.
pub const CONSTANT_BASE: u32 = 0x1000_0000;

/// General-purpose registers available for allocation (r4-r25). r0 reads as
/// zero in the immediate forms, r1/r2 are reserved by the runtime, and r3 is
/// the result register.
const GP_ALLOCATABLE: u32 = 0x03FF_FFF0;

/// Floating-point registers available for allocation (f2-f27); f1 is the
/// result register.
const FP_ALLOCATABLE: u32 = 0x0FFF_FFFC;

/// Append-only instruction buffer with register allocation and a constant
/// pool.
///
/// Releasing registers acquired for long-lived bindings is the generation
/// client's responsibility; the stream only guarantees that it never reissues
/// a register that is still held.
pub struct InstructionStream {
    instructions: Vec<Instruction>,
    pool: Vec<u8>,
    free_gp: u32,
    free_fp: u32,
}

impl InstructionStream {
    pub fn new() -> Self {
        InstructionStream {
            instructions: Vec::new(),
            pool: Vec::new(),
            free_gp: GP_ALLOCATABLE,
            free_fp: FP_ALLOCATABLE,
        }
    }

    /// Create a stream wrapped in the shared-handle form the active-target
    /// context and Variables expect.
    pub fn new_handle() -> StreamHandle {
        Rc::new(RefCell::new(InstructionStream::new()))
    }

    /// Append an instruction. Emission order is execution order.
    pub fn append(&mut self, instruction: Instruction) {
        log::trace!("emit {instruction}");
        self.instructions.push(instruction);
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// The architecture result register for integer results (r3).
    pub fn gp_return(&self) -> Reg {
        Reg::gp(3)
    }

    /// The architecture result register for float results (f1).
    pub fn fp_return(&self) -> Reg {
        Reg::fp(1)
    }

    fn free_mask(&mut self, class: RegClass) -> &mut u32 {
        match class {
            RegClass::Gp => &mut self.free_gp,
            RegClass::Fp => &mut self.free_fp,
        }
    }

    /// Acquire a free register from the requested bank.
    pub fn acquire_register(&mut self, class: RegClass) -> CodegenResult<Reg> {
        let mask = self.free_mask(class);
        if *mask == 0 {
            return Err(CodegenError::RegistersExhausted { class });
        }
        let id = mask.trailing_zeros() as u8;
        *mask &= !(1 << id);
        Ok(Reg { class, id })
    }

    /// Return a register to the allocator.
    pub fn release_register(&mut self, reg: Reg) -> CodegenResult<()> {
        let allocatable = match reg.class {
            RegClass::Gp => GP_ALLOCATABLE,
            RegClass::Fp => FP_ALLOCATABLE,
        };
        let bit = 1u32 << reg.id;
        let mask = self.free_mask(reg.class);
        if allocatable & bit == 0 || *mask & bit != 0 {
            return Err(CodegenError::ReleaseUnallocated { reg });
        }
        *mask |= bit;
        Ok(())
    }

    /// Number of registers currently free in a bank.
    pub fn free_count(&self, class: RegClass) -> u32 {
        match class {
            RegClass::Gp => self.free_gp.count_ones(),
            RegClass::Fp => self.free_fp.count_ones(),
        }
    }

    /// Add a read-only constant-pool entry and return its address.
    ///
    /// The entry is aligned to its own size so that 4- and 8-byte loads read
    /// naturally aligned data.
    pub fn add_constant(&mut self, bytes: &[u8]) -> u32 {
        let align = bytes.len().max(1);
        while self.pool.len() % align != 0 {
            self.pool.push(0);
        }
        let offset = self.pool.len() as u32;
        self.pool.extend_from_slice(bytes);
        let address = CONSTANT_BASE + offset;
        log::debug!("constant pool entry at {address:#x} ({} bytes)", bytes.len());
        address
    }

    pub fn constant_pool(&self) -> &[u8] {
        &self.pool
    }

    /// Clear instructions, constants, and allocator state.
    pub fn reset(&mut self) {
        self.instructions.clear();
        self.pool.clear();
        self.free_gp = GP_ALLOCATABLE;
        self.free_fp = FP_ALLOCATABLE;
    }
}

impl Default for InstructionStream {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_never_reissues_held_register() {
        let mut stream = InstructionStream::new();
        let mut seen = Vec::new();
        while let Ok(reg) = stream.acquire_register(RegClass::Gp) {
            assert!(!seen.contains(&reg));
            seen.push(reg);
        }
        assert_eq!(seen.len() as u32, GP_ALLOCATABLE.count_ones());
    }

    #[test]
    fn exhaustion_is_an_error() {
        let mut stream = InstructionStream::new();
        while stream.free_count(RegClass::Fp) > 0 {
            stream.acquire_register(RegClass::Fp).unwrap();
        }
        assert_eq!(
            stream.acquire_register(RegClass::Fp),
            Err(CodegenError::RegistersExhausted { class: RegClass::Fp })
        );
    }

    #[test]
    fn release_restores_and_rejects_double_release() {
        let mut stream = InstructionStream::new();
        let before = stream.free_count(RegClass::Gp);
        let reg = stream.acquire_register(RegClass::Gp).unwrap();
        assert_eq!(stream.free_count(RegClass::Gp), before - 1);
        stream.release_register(reg).unwrap();
        assert_eq!(stream.free_count(RegClass::Gp), before);
        assert_eq!(
            stream.release_register(reg),
            Err(CodegenError::ReleaseUnallocated { reg })
        );
    }

    #[test]
    fn never_allocates_reserved_registers() {
        let mut stream = InstructionStream::new();
        while let Ok(reg) = stream.acquire_register(RegClass::Gp) {
            assert!(reg.id >= 4);
        }
        while let Ok(reg) = stream.acquire_register(RegClass::Fp) {
            assert_ne!(reg.id, 1);
        }
    }

    #[test]
    fn constants_are_aligned_and_addressed() {
        let mut stream = InstructionStream::new();
        let a = stream.add_constant(&1.0f32.to_bits().to_be_bytes());
        let b = stream.add_constant(&2.0f64.to_bits().to_be_bytes());
        assert_eq!(a, CONSTANT_BASE);
        assert_eq!(b % 8, 0);
        assert!(b >= a + 4);
        assert_eq!(stream.constant_pool().len(), (b - CONSTANT_BASE) as usize + 8);
    }

    #[test]
    fn reset_restores_allocator_and_buffers() {
        let mut stream = InstructionStream::new();
        let before = stream.free_count(RegClass::Gp);
        stream.acquire_register(RegClass::Gp).unwrap();
        stream.add_constant(&[1, 2, 3, 4]);
        stream.reset();
        assert_eq!(stream.free_count(RegClass::Gp), before);
        assert!(stream.is_empty());
        assert!(stream.constant_pool().is_empty());
    }
}
