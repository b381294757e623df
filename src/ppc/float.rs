//! Floating-point intrinsic dispatch.
//!
//! The multiply-add family and square root share one shape: every positional
//! operand must have the same concrete precision, and the instruction is
//! selected per precision. [`FloatFn`] performs that check and forwards to
//! the template factory with the result kind forced to the operand kind.
//! Arity beyond "at least one operand" is deliberately not validated here.

use crate::core::error::{CodegenError, CodegenResult};
use crate::core::kind::Kind;

use super::isa::Opcode;
use super::types::{Expression, TypedValue, Value};

/// An n-ary float intrinsic with per-precision instruction templates.
#[derive(Debug, Clone, Copy)]
pub struct FloatFn {
    name: &'static str,
    single: Opcode,
    double: Opcode,
}

impl FloatFn {
    pub const fn new(name: &'static str, single: Opcode, double: Opcode) -> Self {
        FloatFn { name, single, double }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Dispatch on the operands' shared precision.
    pub fn call(&self, operands: &[Value]) -> CodegenResult<Expression> {
        let first = operands.first().ok_or_else(|| CodegenError::TypeMismatch {
            context: format!("{} call", self.name),
            expected: "at least one operand",
            found: "none",
        })?;
        for (index, operand) in operands.iter().enumerate().skip(1) {
            if operand.kind() != first.kind() {
                return Err(CodegenError::TypeMismatch {
                    context: format!("operand {} of {}", index + 1, self.name),
                    expected: first.type_name(),
                    found: operand.type_name(),
                });
            }
        }
        let opcode = match first.kind() {
            Kind::SingleFloat => self.single,
            Kind::DoubleFloat => self.double,
            _ => {
                return Err(CodegenError::UnsupportedUnary {
                    op: self.name,
                    operand: first.type_name(),
                })
            }
        };
        Ok(Expression::from_values(opcode, operands.to_vec(), first.kind()))
    }
}

/// a * c + b
pub const FMADD: FloatFn = FloatFn::new("fmadd", Opcode::Fmadds, Opcode::Fmadd);
/// a * c - b
pub const FMSUB: FloatFn = FloatFn::new("fmsub", Opcode::Fmsubs, Opcode::Fmsub);
/// -(a * c + b)
pub const FNMADD: FloatFn = FloatFn::new("fnmadd", Opcode::Fnmadds, Opcode::Fnmadd);
/// -(a * c - b)
pub const FNMSUB: FloatFn = FloatFn::new("fnmsub", Opcode::Fnmsubs, Opcode::Fnmsub);
pub const FSQRT: FloatFn = FloatFn::new("fsqrt", Opcode::Fsqrts, Opcode::Fsqrt);

/// All registered intrinsics, for iteration in diagnostics and tests.
pub const INTRINSICS: &[FloatFn] = &[FMADD, FMSUB, FNMADD, FNMSUB, FSQRT];

pub fn fmadd(a: &impl TypedValue, c: &impl TypedValue, b: &impl TypedValue) -> CodegenResult<Expression> {
    FMADD.call(&[a.to_value(), c.to_value(), b.to_value()])
}

pub fn fmsub(a: &impl TypedValue, c: &impl TypedValue, b: &impl TypedValue) -> CodegenResult<Expression> {
    FMSUB.call(&[a.to_value(), c.to_value(), b.to_value()])
}

pub fn fnmadd(a: &impl TypedValue, c: &impl TypedValue, b: &impl TypedValue) -> CodegenResult<Expression> {
    FNMADD.call(&[a.to_value(), c.to_value(), b.to_value()])
}

pub fn fnmsub(a: &impl TypedValue, c: &impl TypedValue, b: &impl TypedValue) -> CodegenResult<Expression> {
    FNMSUB.call(&[a.to_value(), c.to_value(), b.to_value()])
}

pub fn fsqrt(a: &impl TypedValue) -> CodegenResult<Expression> {
    FSQRT.call(&[a.to_value()])
}
