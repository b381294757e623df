// This module defines the error types for ppcgen using the thiserror crate for
// idiomatic Rust error handling. CodegenError is the central enum covering the
// failure modes of runtime code synthesis: operator/operand combinations absent
// from a kind's algebra, operands that must share an exact kind but do not,
// synthesis attempted without an active instruction stream, register allocator
// exhaustion and misuse, duplicate kind registration, and emulator failures.
// Each variant carries the context a generation client needs to fix its
// program (operator names, operand type names, register identities). All of
// these conditions are client logic errors: there is no retry policy, and a
// failed call emits nothing for that call.

//! Error types for runtime code synthesis.

use thiserror::Error;

use super::stream::{Reg, RegClass};

/// Central error type for code-generation operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodegenError {
    /// Operator invoked on an operand-kind combination absent from the algebra.
    #[error("{op} is not implemented for {lhs} and {rhs}")]
    UnsupportedOperation {
        op: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// Unary operator invoked on a kind whose algebra does not define it.
    #[error("{op} is not implemented for {operand}")]
    UnsupportedUnary {
        op: &'static str,
        operand: &'static str,
    },

    /// Operands required to share an exact kind do not, or a literal's host
    /// type is outside the destination kind's accepted literal set.
    #[error("type mismatch in {context}: expected {expected}, found {found}")]
    TypeMismatch {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A synthesis routine was invoked before its required configuration was
    /// supplied, e.g. with no active instruction stream installed.
    #[error("missing configuration: {what}")]
    ConfigurationMissing { what: &'static str },

    /// No free registers remain in the requested bank.
    #[error("no free {class} registers available")]
    RegistersExhausted { class: RegClass },

    /// A register was released that the allocator does not consider held.
    #[error("register {reg} is not currently allocated")]
    ReleaseUnallocated { reg: Reg },

    /// A value kind was registered more than once.
    #[error("value kind {kind} is already registered")]
    DuplicateKind { kind: &'static str },

    /// The emulator could not execute an emitted stream.
    #[error("execution failed: {reason}")]
    Execution { reason: String },
}

/// Result type alias for code-generation operations.
pub type CodegenResult<T> = Result<T, CodegenError>;
