use thiserror::Error;

/// Top-level error type for the trellis compiler core.
#[derive(Debug, Error)]
pub enum Error {
    #[error("semantic error: {0}")]
    Semantic(#[from] SemanticError),

    #[error("pass error: {0}")]
    Pass(#[from] PassError),
}

// ---------------------------------------------------------------------------
// Semantic errors
// ---------------------------------------------------------------------------

/// User-facing rejection raised during semantic lowering.
///
/// Every variant corresponds to a program the frontend can legitimately
/// write; none of them indicate a bug in the compiler. Lowering stops at the
/// first semantic error and the module under construction is abandoned.
#[derive(Debug, Error)]
pub enum SemanticError {
    #[error("invalid operands of type {lhs} and {rhs}")]
    IncompatibleTypes { lhs: String, rhs: String },

    #[error(
        "cannot use /, //, or % with {lhs} and {rhs} because they have \
         different signedness; cast them to the same signedness"
    )]
    DivMixedSignedness { lhs: String, rhs: String },

    #[error(
        "cannot mod {lhs} by {rhs} because they have different signedness; \
         cast them to the same signedness"
    )]
    ModMixedSignedness { lhs: String, rhs: String },

    #[error("cannot make shapes compatible: blocks must have the same rank ({left} vs {right})")]
    RankMismatch { left: usize, right: usize },

    #[error(
        "cannot make shapes compatible: incompatible dimensions at index {index}: \
         {left} and {right}"
    )]
    IncompatibleDim { index: usize, left: u32, right: u32 },

    #[error("cannot broadcast {from} to shape {to}")]
    CannotBroadcast { from: String, to: String },

    #[error("block shapes must be non-empty with every dimension at least 1")]
    InvalidShape,

    #[error("pointer element type must be a scalar, got {ty}")]
    PointeeNotScalar { ty: String },

    #[error("cannot create a range from {start} to {end}")]
    InvalidRange { start: i32, end: i32 },

    #[error("cannot reshape block of different shape")]
    ReshapeMismatch,

    #[error("reduction axis {axis} is out of range for a block of rank {rank}")]
    InvalidAxis { axis: u32, rank: usize },

    #[error("pointer argument of {op} instruction is {ty}")]
    NotAPointer { op: &'static str, ty: String },

    #[error("cache modifier {modifier} not supported")]
    UnsupportedCacheModifier { modifier: String },

    #[error("`other` cannot be provided without `mask`")]
    OtherWithoutMask,

    #[error("mask must have boolean scalar type, got {ty}")]
    MaskNotBool { ty: String },

    #[error("wrong type argument to unary {op} ({ty})")]
    WrongUnaryOperand { op: &'static str, ty: String },

    #[error("both operands of fdiv must have floating point scalar type")]
    FdivOperandsNotFloat,

    #[error("xor_sum is only supported for integers")]
    XorSumNotInteger,

    #[error("cannot bitcast data type of size {src_bits} to data type of size {dst_bits}")]
    BitcastSizeMismatch { src_bits: u32, dst_bits: u32 },

    #[error("dot operands must be two-dimensional blocks, got {lhs} and {rhs}")]
    DotOperandsNotMatrix { lhs: String, rhs: String },

    #[error("dot inner dimensions must agree, got {lhs} and {rhs}")]
    DotInnerDim { lhs: u32, rhs: u32 },

    #[error("{op} expects a value produced by an instruction")]
    NotAnInstruction { op: &'static str },
}

// ---------------------------------------------------------------------------
// Pass errors
// ---------------------------------------------------------------------------

/// Structural IR violation detected by a pass.
#[derive(Debug, Error)]
pub enum PassError {
    #[error("SSA violation in function '{func}': value {value} is used but never defined")]
    UndefinedValue { func: String, value: String },

    #[error("SSA violation in function '{func}': value {value} defined more than once")]
    MultipleDefinition { func: String, value: String },

    #[error("block '{block}' in function '{func}' has no terminator")]
    MissingTerminator { func: String, block: String },

    #[error("phi after a non-phi instruction in block '{block}' of function '{func}'")]
    MisplacedPhi { func: String, block: String },
}
