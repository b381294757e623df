//! ppcgen - runtime code synthesis for scalar registers.
//!
//! Host code builds computations over typed, register-backed values; every
//! operation lowers at runtime into PowerPC-form instructions appended to an
//! instruction stream, with no separate compile pass. Instruction selection
//! is type-directed: each value kind carries an operator algebra deciding
//! which operand classes an operator accepts and which instruction the
//! combination emits, and mixed-kind operations resolve their result kind to
//! the more specific operand.
//!
//! # Usage
//!
//! ```ignore
//! use ppcgen::core::{ActiveStreamGuard, InstructionStream, Kind};
//! use ppcgen::ppc::{Processor, TypedValue, Variable};
//!
//! let code = InstructionStream::new_handle();
//! let _guard = ActiveStreamGuard::install(code.clone());
//!
//! let a = Variable::with_value(Kind::SignedWord, 11)?;
//! let b = Variable::with_value(Kind::SignedWord, 31)?;
//! let c = Variable::bound(Kind::SignedWord, code.borrow().gp_return())?;
//! c.assign(a.add(&b)?.add(12)?)?;
//!
//! let result = Processor::new().execute(&code.borrow())?;
//! assert_eq!(result, 54);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - kinds, kind registry, instruction stream, active-target
//!   context, errors
//! - [`ppc`] - instruction templates, the operator algebra, literal
//!   materialization, float intrinsics, and the emulator

pub mod core;
pub mod ppc;

pub use self::core::{
    // Context management
    active_stream, set_active_stream, ActiveStreamGuard,
    // Kinds and resolution
    most_specific, Kind, Literal,
    // Streams and registers
    InstructionStream, Reg, RegClass, StreamHandle,
    // Errors
    CodegenError, CodegenResult,
};
pub use self::ppc::{
    fmadd, fmsub, fnmadd, fnmsub, fsqrt, Expression, Processor, TypedValue, Value, Variable,
};
