//! Frontend types.
//!
//! Unlike the IR, the frontend distinguishes signed from unsigned integers:
//! `int32` and `uint32` both lower to `i32` but dispatch differently (division
//! direction, comparison predicates, extension on widening casts). A type is
//! either a scalar or a *block*, a tile of scalars with a fixed shape.

use crate::ir::types::IrType;

/// Signedness of a frontend integer type.
///
/// Non-integer types report `Signed`, matching the context's inference
/// default for values created without an explicit type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signedness {
    Signed,
    Unsigned,
}

/// A frontend scalar kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScalarTy {
    Void,
    Fp8,
    Fp16,
    Bf16,
    Fp32,
    Fp64,
    /// Boolean. Has no unsigned counterpart and never sign-extends.
    Int1,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Ptr {
        pointee: Box<ScalarTy>,
        addr_space: u32,
    },
}

impl ScalarTy {
    pub fn is_void(&self) -> bool {
        matches!(self, ScalarTy::Void)
    }

    pub fn is_floating(&self) -> bool {
        matches!(
            self,
            ScalarTy::Fp8 | ScalarTy::Fp16 | ScalarTy::Bf16 | ScalarTy::Fp32 | ScalarTy::Fp64
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ScalarTy::Int1
                | ScalarTy::Int8
                | ScalarTy::Int16
                | ScalarTy::Int32
                | ScalarTy::Int64
                | ScalarTy::UInt8
                | ScalarTy::UInt16
                | ScalarTy::UInt32
                | ScalarTy::UInt64
        )
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, ScalarTy::Int1)
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, ScalarTy::Ptr { .. })
    }

    pub fn is_signed_integer(&self) -> bool {
        self.is_integer() && self.signedness() == Signedness::Signed
    }

    pub fn is_unsigned_integer(&self) -> bool {
        self.is_integer() && self.signedness() == Signedness::Unsigned
    }

    /// Signedness of the type. Pointers report their pointee's signedness so
    /// that `*int32` and `*uint32` canonicalize to distinct types; everything
    /// without a meaningful sign reports `Signed`.
    pub fn signedness(&self) -> Signedness {
        match self {
            ScalarTy::UInt8 | ScalarTy::UInt16 | ScalarTy::UInt32 | ScalarTy::UInt64 => {
                Signedness::Unsigned
            }
            ScalarTy::Ptr { pointee, .. } => pointee.signedness(),
            _ => Signedness::Signed,
        }
    }

    /// Bit width of an integer kind.
    pub fn integer_bitwidth(&self) -> u32 {
        match self {
            ScalarTy::Int1 => 1,
            ScalarTy::Int8 | ScalarTy::UInt8 => 8,
            ScalarTy::Int16 | ScalarTy::UInt16 => 16,
            ScalarTy::Int32 | ScalarTy::UInt32 => 32,
            ScalarTy::Int64 | ScalarTy::UInt64 => 64,
            other => unreachable!("integer_bitwidth of {}", other),
        }
    }

    /// Mantissa width of a floating-point kind.
    pub fn fp_mantissa_width(&self) -> u32 {
        match self {
            ScalarTy::Fp8 => 3,
            ScalarTy::Fp16 => 10,
            ScalarTy::Bf16 => 7,
            ScalarTy::Fp32 => 23,
            ScalarTy::Fp64 => 52,
            other => unreachable!("fp_mantissa_width of {}", other),
        }
    }

    /// Size of one element in bits. Pointers are 64-bit.
    pub fn primitive_size_in_bits(&self) -> u32 {
        match self {
            ScalarTy::Void => 0,
            ScalarTy::Fp8 => 8,
            ScalarTy::Fp16 | ScalarTy::Bf16 => 16,
            ScalarTy::Fp32 => 32,
            ScalarTy::Fp64 => 64,
            ScalarTy::Ptr { .. } => 64,
            _ => self.integer_bitwidth(),
        }
    }

    pub fn pointee(&self) -> Option<&ScalarTy> {
        match self {
            ScalarTy::Ptr { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    pub fn addr_space(&self) -> Option<u32> {
        match self {
            ScalarTy::Ptr { addr_space, .. } => Some(*addr_space),
            _ => None,
        }
    }

    /// The IR type this scalar lowers to. Signedness is erased.
    pub fn to_ir(&self) -> IrType {
        match self {
            ScalarTy::Void => IrType::Void,
            ScalarTy::Fp8 => IrType::Fp8,
            ScalarTy::Fp16 => IrType::Fp16,
            ScalarTy::Bf16 => IrType::Bf16,
            ScalarTy::Fp32 => IrType::Fp32,
            ScalarTy::Fp64 => IrType::Fp64,
            ScalarTy::Ptr {
                pointee,
                addr_space,
            } => IrType::Ptr {
                pointee: Box::new(pointee.to_ir()),
                addr_space: *addr_space,
            },
            _ => IrType::Int(self.integer_bitwidth()),
        }
    }
}

impl std::fmt::Display for ScalarTy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalarTy::Void => f.write_str("void"),
            ScalarTy::Fp8 => f.write_str("fp8"),
            ScalarTy::Fp16 => f.write_str("fp16"),
            ScalarTy::Bf16 => f.write_str("bf16"),
            ScalarTy::Fp32 => f.write_str("fp32"),
            ScalarTy::Fp64 => f.write_str("fp64"),
            ScalarTy::Int1 => f.write_str("int1"),
            ScalarTy::Int8 => f.write_str("int8"),
            ScalarTy::Int16 => f.write_str("int16"),
            ScalarTy::Int32 => f.write_str("int32"),
            ScalarTy::Int64 => f.write_str("int64"),
            ScalarTy::UInt8 => f.write_str("uint8"),
            ScalarTy::UInt16 => f.write_str("uint16"),
            ScalarTy::UInt32 => f.write_str("uint32"),
            ScalarTy::UInt64 => f.write_str("uint64"),
            ScalarTy::Ptr { pointee, .. } => write!(f, "{}*", pointee),
        }
    }
}

/// A frontend type: a scalar, or a block of scalars with a shape.
///
/// Shape entries are always >= 1 and the rank of a block is fixed for the
/// lifetime of the type. Predicates are strict: `is_floating` on a block of
/// floats is `false`; project with `scalar_ty()` first, as the dispatcher
/// does.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AstType {
    Scalar(ScalarTy),
    Block { elem: ScalarTy, shape: Vec<u32> },
}

impl AstType {
    /// The scalar projection: a block projects to its element, a scalar to
    /// itself.
    pub fn scalar_ty(&self) -> &ScalarTy {
        match self {
            AstType::Scalar(s) => s,
            AstType::Block { elem, .. } => elem,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, AstType::Block { .. })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, AstType::Scalar(s) if s.is_void())
    }

    pub fn is_floating(&self) -> bool {
        matches!(self, AstType::Scalar(s) if s.is_floating())
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, AstType::Scalar(s) if s.is_integer())
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, AstType::Scalar(s) if s.is_bool())
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, AstType::Scalar(s) if s.is_pointer())
    }

    /// Signedness of the element type.
    pub fn signedness(&self) -> Signedness {
        self.scalar_ty().signedness()
    }

    pub fn block_shape(&self) -> Option<&[u32]> {
        match self {
            AstType::Block { shape, .. } => Some(shape),
            AstType::Scalar(_) => None,
        }
    }

    /// Rank of a block; scalars are rank 0.
    pub fn rank(&self) -> usize {
        self.block_shape().map_or(0, |s| s.len())
    }

    /// Number of elements: the shape product for blocks, 1 for scalars.
    pub fn num_elements(&self) -> u64 {
        self.block_shape()
            .map_or(1, |s| s.iter().map(|&d| d as u64).product())
    }

    /// The IR type this type lowers to.
    pub fn to_ir(&self) -> IrType {
        match self {
            AstType::Scalar(s) => s.to_ir(),
            AstType::Block { elem, shape } => IrType::Block {
                elem: Box::new(elem.to_ir()),
                shape: shape.clone(),
            },
        }
    }
}

impl std::fmt::Display for AstType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AstType::Scalar(s) => write!(f, "{}", s),
            AstType::Block { elem, shape } => {
                write!(f, "{}[", elem)?;
                for (i, d) in shape.iter().enumerate() {
                    if i > 0 {
                        f.write_str("x")?;
                    }
                    write!(f, "{}", d)?;
                }
                f.write_str("]")
            }
        }
    }
}
