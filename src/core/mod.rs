// This module is the hub for the target-independent half of ppcgen: the value
// kinds and their precedence resolution, the kind registry pairing each kind
// with its storage and computed class records, the instruction stream with its
// register allocator and constant pool, the active-target context, and the
// central error type. The target-specific half (instruction templates, the
// operator algebra, literal materialization, float intrinsics, the emulator)
// lives under crate::ppc and builds on these pieces.

//! Core infrastructure: kinds, registry, streams, context, errors.

pub mod context;
pub mod error;
pub mod kind;
pub mod registry;
pub mod stream;

pub use self::context::{active_stream, set_active_stream, ActiveStreamGuard};
pub use self::error::{CodegenError, CodegenResult};
pub use self::kind::{most_specific, Kind, Literal, LiteralClass};
pub use self::registry::{registry, ComputedClass, KindRegistry, StorageClass};
pub use self::stream::{InstructionStream, Reg, RegClass, StreamHandle, CONSTANT_BASE};
