// This module is the operator algebra of ppcgen: the typed value roles
// (Variable as a named register-bound binding, Expression as the transient
// result of one operation) and the named operator methods that lower each
// application into an instruction template selection. Dispatch is exhaustive
// over the closed Kind enum: each operator accepts exactly the operand
// classes its kind's algebra lists and errors on everything else. Bitwise
// register forms upcast their result kind through most_specific so that a
// generic bit-pattern operation mixed with a signed-word operand stays
// signed-word; immediate forms and the arithmetic operators keep the caller's
// own kind. Expressions hold no register until consumed: using one as an
// operand or assigning it into a Variable evaluates the tree, acquiring and
// releasing temporary registers around each emitted instruction.

//! Typed values and their operator algebra.

use std::fmt;

use crate::core::context::active_stream;
use crate::core::error::{CodegenError, CodegenResult};
use crate::core::kind::{most_specific, Kind, Literal};
use crate::core::registry::registry;
use crate::core::stream::{InstructionStream, Reg, RegClass, StreamHandle};

use super::isa::{Instruction, Opcode, Src};
use super::literal;

/// A named, mutable binding of a kind to a concrete register.
///
/// The underlying register stays bound until [`Variable::release`]; returning
/// it to the allocator is the generation client's responsibility, not an
/// automatic guarantee.
#[derive(Clone)]
pub struct Variable {
    kind: Kind,
    reg: Reg,
    stream: StreamHandle,
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", registry().storage(self.kind).name(), self.reg)
    }
}

impl Variable {
    /// Bind a fresh auto-acquired register in the active stream.
    pub fn new(kind: Kind) -> CodegenResult<Self> {
        Self::new_in(kind, active_stream()?)
    }

    pub fn new_in(kind: Kind, stream: StreamHandle) -> CodegenResult<Self> {
        let reg = stream.borrow_mut().acquire_register(kind.register_class())?;
        Ok(Variable { kind, reg, stream })
    }

    /// Bind a caller-supplied register in the active stream.
    pub fn bound(kind: Kind, reg: Reg) -> CodegenResult<Self> {
        Self::bound_in(kind, reg, active_stream()?)
    }

    pub fn bound_in(kind: Kind, reg: Reg, stream: StreamHandle) -> CodegenResult<Self> {
        if reg.class != kind.register_class() {
            return Err(CodegenError::TypeMismatch {
                context: format!("binding {reg} as {}", registry().storage(kind).name()),
                expected: match kind.register_class() {
                    RegClass::Gp => "a general-purpose register",
                    RegClass::Fp => "a floating-point register",
                },
                found: match reg.class {
                    RegClass::Gp => "a general-purpose register",
                    RegClass::Fp => "a floating-point register",
                },
            });
        }
        Ok(Variable { kind, reg, stream })
    }

    /// Bind a fresh register and materialize a host literal into it.
    pub fn with_value(kind: Kind, value: impl Into<Literal>) -> CodegenResult<Self> {
        Self::with_value_in(kind, value, active_stream()?)
    }

    pub fn with_value_in(
        kind: Kind,
        value: impl Into<Literal>,
        stream: StreamHandle,
    ) -> CodegenResult<Self> {
        let var = Self::new_in(kind, stream)?;
        let value: Literal = value.into();
        if let Err(err) = var.assign(value) {
            let _ = var.stream.borrow_mut().release_register(var.reg);
            return Err(err);
        }
        Ok(var)
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn reg(&self) -> Reg {
        self.reg
    }

    pub fn stream(&self) -> &StreamHandle {
        &self.stream
    }

    /// Emit the instructions that give this variable a new value: a register
    /// move for typed values already in a register, an expression evaluation
    /// targeting this variable's register, or a literal materialization.
    pub fn assign(&self, rhs: impl Into<Rhs>) -> CodegenResult<()> {
        match rhs.into() {
            Rhs::Value(value) => {
                if value.kind().register_class() != self.kind.register_class() {
                    return Err(CodegenError::TypeMismatch {
                        context: format!("assignment to {self:?}"),
                        expected: registry().storage(self.kind).name(),
                        found: value.type_name(),
                    });
                }
                let stream = self.stream.clone();
                let mut stream = stream.borrow_mut();
                match value {
                    Value::Expr(expr) => expr.eval_into(&mut stream, self.reg),
                    Value::Var(var) => {
                        let mov = match self.kind.register_class() {
                            RegClass::Gp => Instruction::new(
                                Opcode::Or,
                                self.reg,
                                vec![Src::Reg(var.reg()), Src::Reg(var.reg())],
                            ),
                            RegClass::Fp => {
                                Instruction::new(Opcode::Fmr, self.reg, vec![Src::Reg(var.reg())])
                            }
                        };
                        stream.append(mov);
                        Ok(())
                    }
                }
            }
            Rhs::Lit(lit) => {
                let stream = self.stream.clone();
                let mut stream = stream.borrow_mut();
                literal::set_literal(&mut stream, self.kind, self.reg, lit)
            }
        }
    }

    /// Return the bound register to the allocator, consuming the binding.
    pub fn release(self) -> CodegenResult<()> {
        self.stream.borrow_mut().release_register(self.reg)
    }
}

/// An operand of a not-yet-emitted expression.
#[derive(Clone)]
enum Operand {
    Value(Value),
    Imm(i32),
}

/// The immutable, transient result of one operator application.
///
/// Carries an instruction template, its operand list, and the resolved result
/// kind; acquires a register only when consumed.
#[derive(Clone)]
pub struct Expression {
    opcode: Opcode,
    operands: Vec<Operand>,
    kind: Kind,
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            registry().computed(self.kind).name(),
            self.opcode.mnemonic()
        )
    }
}

impl Expression {
    fn with_operands(opcode: Opcode, operands: Vec<Operand>, kind: Kind) -> Self {
        Expression { opcode, operands, kind }
    }

    /// Factory form of an instruction template: apply it to typed operand
    /// values with an explicitly forced result kind.
    pub fn from_values(opcode: Opcode, values: Vec<Value>, kind: Kind) -> Self {
        Expression {
            opcode,
            operands: values.into_iter().map(Operand::Value).collect(),
            kind,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Emit this expression tree into `dst`.
    ///
    /// Operand sub-expressions are evaluated into temporary registers that
    /// are returned to the allocator once the instruction is appended,
    /// whichever way evaluation exits.
    pub fn eval_into(&self, stream: &mut InstructionStream, dst: Reg) -> CodegenResult<()> {
        let mut temps = Vec::new();
        let result = self.emit(stream, dst, &mut temps);
        for temp in temps {
            stream.release_register(temp)?;
        }
        result
    }

    fn emit(
        &self,
        stream: &mut InstructionStream,
        dst: Reg,
        temps: &mut Vec<Reg>,
    ) -> CodegenResult<()> {
        let mut srcs = Vec::with_capacity(self.operands.len());
        for operand in &self.operands {
            match operand {
                Operand::Imm(imm) => srcs.push(Src::Imm(*imm)),
                Operand::Value(Value::Var(var)) => srcs.push(Src::Reg(var.reg())),
                Operand::Value(Value::Expr(expr)) => {
                    let temp = stream.acquire_register(expr.kind().register_class())?;
                    temps.push(temp);
                    expr.eval_into(stream, temp)?;
                    srcs.push(Src::Reg(temp));
                }
            }
        }
        stream.append(Instruction::new(self.opcode, dst, srcs));
        Ok(())
    }
}

/// Typed operand union the algebra dispatches over.
#[derive(Clone)]
pub enum Value {
    Var(Variable),
    Expr(Expression),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Var(var) => var.kind(),
            Value::Expr(expr) => expr.kind(),
        }
    }

    /// The registered class name of this value's role, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Var(var) => registry().storage(var.kind()).name(),
            Value::Expr(expr) => registry().computed(expr.kind()).name(),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Var(var) => fmt::Debug::fmt(var, f),
            Value::Expr(expr) => fmt::Debug::fmt(expr, f),
        }
    }
}

/// Right-hand operand: a typed value or a host literal.
#[derive(Clone)]
pub enum Rhs {
    Value(Value),
    Lit(Literal),
}

impl Rhs {
    fn type_name(&self) -> &'static str {
        match self {
            Rhs::Value(value) => value.type_name(),
            Rhs::Lit(Literal::Int(_)) => "integer literal",
            Rhs::Lit(Literal::Float(_)) => "float literal",
        }
    }
}

impl From<Value> for Rhs {
    fn from(value: Value) -> Self {
        Rhs::Value(value)
    }
}

impl From<&Value> for Rhs {
    fn from(value: &Value) -> Self {
        Rhs::Value(value.clone())
    }
}

impl From<Variable> for Rhs {
    fn from(var: Variable) -> Self {
        Rhs::Value(Value::Var(var))
    }
}

impl From<&Variable> for Rhs {
    fn from(var: &Variable) -> Self {
        Rhs::Value(Value::Var(var.clone()))
    }
}

impl From<Expression> for Rhs {
    fn from(expr: Expression) -> Self {
        Rhs::Value(Value::Expr(expr))
    }
}

impl From<&Expression> for Rhs {
    fn from(expr: &Expression) -> Self {
        Rhs::Value(Value::Expr(expr.clone()))
    }
}

impl From<Literal> for Rhs {
    fn from(lit: Literal) -> Self {
        Rhs::Lit(lit)
    }
}

impl From<i32> for Rhs {
    fn from(v: i32) -> Self {
        Rhs::Lit(Literal::Int(v as i64))
    }
}

impl From<i64> for Rhs {
    fn from(v: i64) -> Self {
        Rhs::Lit(Literal::Int(v))
    }
}

impl From<u32> for Rhs {
    fn from(v: u32) -> Self {
        Rhs::Lit(Literal::Int(v as i64))
    }
}

impl From<f64> for Rhs {
    fn from(v: f64) -> Self {
        Rhs::Lit(Literal::Float(v))
    }
}

/// Shared operator surface of Variables, Expressions, and Values.
///
/// Both value roles of a kind expose the same algebra; each method lowers one
/// operator application into an Expression carrying the selected instruction
/// template and resolved result kind.
pub trait TypedValue {
    fn kind(&self) -> Kind;
    fn to_value(&self) -> Value;

    fn bitand(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        bitwise("bitand", Opcode::And, Opcode::Andi, &self.to_value(), rhs.into())
    }

    fn bitor(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        bitwise("bitor", Opcode::Or, Opcode::Ori, &self.to_value(), rhs.into())
    }

    fn bitxor(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        bitwise("bitxor", Opcode::Xor, Opcode::Xori, &self.to_value(), rhs.into())
    }

    fn shl(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        shift("shl", Opcode::Slw, &self.to_value(), rhs.into())
    }

    fn shr(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        shift("shr", Opcode::Srw, &self.to_value(), rhs.into())
    }

    fn add(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        add(&self.to_value(), rhs.into())
    }

    fn sub(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        sub(&self.to_value(), rhs.into())
    }

    fn mul(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        mul(&self.to_value(), rhs.into())
    }

    fn div(&self, rhs: impl Into<Rhs>) -> CodegenResult<Expression> {
        div(&self.to_value(), rhs.into())
    }

    fn neg(&self) -> CodegenResult<Expression> {
        neg(&self.to_value())
    }

    fn abs(&self) -> CodegenResult<Expression> {
        abs(&self.to_value())
    }
}

impl TypedValue for Variable {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn to_value(&self) -> Value {
        Value::Var(self.clone())
    }
}

impl TypedValue for Expression {
    fn kind(&self) -> Kind {
        self.kind
    }

    fn to_value(&self) -> Value {
        Value::Expr(self.clone())
    }
}

impl TypedValue for Value {
    fn kind(&self) -> Kind {
        Value::kind(self)
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}

fn unsupported(op: &'static str, lhs: &Value, rhs_name: &'static str) -> CodegenError {
    CodegenError::UnsupportedOperation {
        op,
        lhs: lhs.type_name(),
        rhs: rhs_name,
    }
}

fn immediate(op: &'static str, lhs: &Value, value: i64) -> CodegenResult<i32> {
    i32::try_from(value).map_err(|_| CodegenError::UnsupportedOperation {
        op,
        lhs: lhs.type_name(),
        rhs: "an out-of-range integer literal",
    })
}

fn binary(opcode: Opcode, lhs: &Value, rhs: Value, kind: Kind) -> Expression {
    Expression::with_operands(
        opcode,
        vec![Operand::Value(lhs.clone()), Operand::Value(rhs)],
        kind,
    )
}

fn binary_imm(opcode: Opcode, lhs: &Value, imm: i32, kind: Kind) -> Expression {
    Expression::with_operands(
        opcode,
        vec![Operand::Value(lhs.clone()), Operand::Imm(imm)],
        kind,
    )
}

fn unary(opcode: Opcode, lhs: &Value, kind: Kind) -> Expression {
    Expression::with_operands(opcode, vec![Operand::Value(lhs.clone())], kind)
}

/// AND/OR/XOR over the general-purpose hierarchy: register form upcasts, the
/// immediate form keeps the caller's kind.
fn bitwise(op: &'static str, rr: Opcode, ri: Opcode, lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    if lhs.kind().register_class() != RegClass::Gp {
        return Err(unsupported(op, lhs, rhs_name));
    }
    match rhs {
        Rhs::Value(value) if value.kind().register_class() == RegClass::Gp => {
            let kind = most_specific(Some(lhs.kind()), Some(value.kind()), None)
                .unwrap_or(lhs.kind());
            Ok(binary(rr, lhs, value, kind))
        }
        Rhs::Lit(Literal::Int(value)) => {
            let imm = immediate(op, lhs, value)?;
            Ok(binary_imm(ri, lhs, imm, lhs.kind()))
        }
        _ => Err(unsupported(op, lhs, rhs_name)),
    }
}

/// Shifts accept same-hierarchy register operands only; the architecture has
/// no immediate-shift encoding in this algebra, so a literal count must fail.
fn shift(op: &'static str, opcode: Opcode, lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    if lhs.kind().register_class() != RegClass::Gp {
        return Err(unsupported(op, lhs, rhs_name));
    }
    match rhs {
        Rhs::Value(value) if value.kind().register_class() == RegClass::Gp => {
            Ok(binary(opcode, lhs, value, lhs.kind()))
        }
        _ => Err(unsupported(op, lhs, rhs_name)),
    }
}

fn add(lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    match lhs.kind() {
        Kind::UnsignedWord => match rhs {
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::UnsignedWord) => {
                Ok(binary(Opcode::Add, lhs, value, lhs.kind()))
            }
            Rhs::Lit(Literal::Int(value)) => {
                let imm = immediate("add", lhs, value)?;
                Ok(binary_imm(Opcode::Addi, lhs, imm, lhs.kind()))
            }
            _ => Err(unsupported("add", lhs, rhs_name)),
        },
        Kind::SignedWord => match rhs {
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::SignedWord) => {
                Ok(binary(Opcode::Add, lhs, value, lhs.kind()))
            }
            Rhs::Lit(Literal::Int(value)) => {
                let imm = immediate("add", lhs, value)?;
                Ok(binary_imm(Opcode::Addi, lhs, imm, lhs.kind()))
            }
            _ => Err(unsupported("add", lhs, rhs_name)),
        },
        Kind::SingleFloat => float_binary("add", Opcode::Fadds, lhs, rhs),
        Kind::DoubleFloat => float_binary("add", Opcode::Fadd, lhs, rhs),
        Kind::Bits => Err(unsupported("add", lhs, rhs_name)),
    }
}

fn sub(lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    match lhs.kind() {
        Kind::SignedWord => match rhs {
            // subf computes rb - ra, so the operands go in swapped.
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::SignedWord) => {
                Ok(Expression::with_operands(
                    Opcode::Subf,
                    vec![Operand::Value(value), Operand::Value(lhs.clone())],
                    lhs.kind(),
                ))
            }
            _ => Err(unsupported("sub", lhs, rhs_name)),
        },
        Kind::SingleFloat => float_binary("sub", Opcode::Fsubs, lhs, rhs),
        Kind::DoubleFloat => float_binary("sub", Opcode::Fsub, lhs, rhs),
        _ => Err(unsupported("sub", lhs, rhs_name)),
    }
}

fn mul(lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    match lhs.kind() {
        Kind::SignedWord => match rhs {
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::SignedWord) => {
                Ok(binary(Opcode::Mullw, lhs, value, lhs.kind()))
            }
            Rhs::Lit(Literal::Int(value)) => {
                let imm = immediate("mul", lhs, value)?;
                Ok(binary_imm(Opcode::Mulli, lhs, imm, lhs.kind()))
            }
            _ => Err(unsupported("mul", lhs, rhs_name)),
        },
        Kind::SingleFloat => float_binary("mul", Opcode::Fmuls, lhs, rhs),
        Kind::DoubleFloat => float_binary("mul", Opcode::Fmul, lhs, rhs),
        _ => Err(unsupported("mul", lhs, rhs_name)),
    }
}

fn div(lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    match lhs.kind() {
        // The unsigned algebra divides by a signed-word operand with the
        // unsigned-divide instruction.
        Kind::UnsignedWord => match rhs {
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::SignedWord) => {
                Ok(binary(Opcode::Divwu, lhs, value, lhs.kind()))
            }
            _ => Err(unsupported("div", lhs, rhs_name)),
        },
        Kind::SignedWord => match rhs {
            Rhs::Value(value) if value.kind().is_subkind_of(Kind::SignedWord) => {
                Ok(binary(Opcode::Divw, lhs, value, lhs.kind()))
            }
            _ => Err(unsupported("div", lhs, rhs_name)),
        },
        Kind::SingleFloat => float_binary("div", Opcode::Fdivs, lhs, rhs),
        Kind::DoubleFloat => float_binary("div", Opcode::Fdiv, lhs, rhs),
        _ => Err(unsupported("div", lhs, rhs_name)),
    }
}

/// Float arithmetic accepts the caller's exact precision only.
fn float_binary(op: &'static str, opcode: Opcode, lhs: &Value, rhs: Rhs) -> CodegenResult<Expression> {
    let rhs_name = rhs.type_name();
    match rhs {
        Rhs::Value(value) if value.kind() == lhs.kind() => {
            Ok(binary(opcode, lhs, value, lhs.kind()))
        }
        _ => Err(unsupported(op, lhs, rhs_name)),
    }
}

fn neg(lhs: &Value) -> CodegenResult<Expression> {
    match lhs.kind() {
        Kind::SignedWord => Ok(unary(Opcode::Neg, lhs, lhs.kind())),
        Kind::SingleFloat | Kind::DoubleFloat => Ok(unary(Opcode::Fneg, lhs, lhs.kind())),
        _ => Err(CodegenError::UnsupportedUnary {
            op: "neg",
            operand: lhs.type_name(),
        }),
    }
}

fn abs(lhs: &Value) -> CodegenResult<Expression> {
    match lhs.kind() {
        Kind::SingleFloat | Kind::DoubleFloat => Ok(unary(Opcode::Fabs, lhs, lhs.kind())),
        _ => Err(CodegenError::UnsupportedUnary {
            op: "abs",
            operand: lhs.type_name(),
        }),
    }
}
