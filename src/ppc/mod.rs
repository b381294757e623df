// This module is the target-specific half of ppcgen: the instruction
// templates and word encoder, the typed-value operator algebra, literal
// materialization, the floating-point intrinsic dispatcher, and the emulator
// the end-to-end tests execute generated streams on. It builds on the
// target-independent pieces in crate::core (kinds, registry, streams, the
// active-target context, errors).

//! Scalar target: instruction templates, typed values, intrinsics, emulator.

pub mod emulator;
pub mod float;
pub mod isa;
pub mod literal;
pub mod types;

pub use self::emulator::Processor;
pub use self::float::{fmadd, fmsub, fnmadd, fnmsub, fsqrt, FloatFn, INTRINSICS};
pub use self::isa::{encode, EncodeError, Instruction, Opcode, Src};
pub use self::types::{Expression, Rhs, TypedValue, Value, Variable};
