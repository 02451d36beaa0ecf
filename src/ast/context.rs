//! The AST context: a canonicalizing arena for frontend types and the
//! factory for frontend values.

use std::collections::HashMap;

use crate::ast::types::{AstType, ScalarTy, Signedness};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;
use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// Handle to a canonicalized frontend type inside an `AstContext`.
///
/// Two handles are equal iff the types they denote are equal: the context
/// interns every type by its `(IrType, Signedness)` key, so identity
/// comparison on handles is canonical equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(u32);

/// A frontend value: an IR value handle paired with a frontend type.
///
/// The IR value is owned by the function that minted it; the type is owned
/// by the context. The pair itself is a plain copyable handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AstValue {
    pub ir: ValueId,
    pub ty: TypeId,
}

/// Owns canonicalized frontend types for one compilation.
///
/// One context per compilation; types cannot outlive it. Interning keys are
/// `(IrType, Signedness)` pairs, so any two look-ups with the same key
/// return the same `TypeId`.
#[derive(Debug, Default)]
pub struct AstContext {
    types: Vec<AstType>,
    canon: HashMap<(IrType, Signedness), TypeId>,
}

impl AstContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a handle to the type it denotes.
    pub fn ty(&self, id: TypeId) -> &AstType {
        &self.types[id.0 as usize]
    }

    fn intern(&mut self, ty: AstType) -> TypeId {
        let key = (ty.to_ir(), ty.signedness());
        if let Some(&id) = self.canon.get(&key) {
            return id;
        }
        let id = TypeId(self.types.len() as u32);
        self.types.push(ty);
        self.canon.insert(key, id);
        id
    }

    /// Canonical handle for a scalar type.
    pub fn scalar(&mut self, kind: ScalarTy) -> TypeId {
        self.intern(AstType::Scalar(kind))
    }

    /// Canonical handle for a block type. Rejects empty shapes and zero
    /// dimensions.
    pub fn block_of(&mut self, elem: ScalarTy, shape: &[u32]) -> Result<TypeId, SemanticError> {
        if shape.is_empty() || shape.iter().any(|&d| d == 0) {
            return Err(SemanticError::InvalidShape);
        }
        Ok(self.intern(AstType::Block {
            elem,
            shape: shape.to_vec(),
        }))
    }

    /// Canonical handle for a pointer type. The pointee must be a scalar.
    pub fn pointer_to(&mut self, pointee: TypeId, addr_space: u32) -> Result<TypeId, SemanticError> {
        let pointee = match self.ty(pointee) {
            AstType::Scalar(s) => Box::new(s.clone()),
            block => {
                return Err(SemanticError::PointeeNotScalar {
                    ty: block.to_string(),
                })
            }
        };
        Ok(self.intern(AstType::Scalar(ScalarTy::Ptr {
            pointee,
            addr_space,
        })))
    }

    /// Canonicalizing look-up of the frontend type denoted by an IR type and
    /// a signedness.
    pub fn type_from_ir_type(&mut self, ir: &IrType, signedness: Signedness) -> TypeId {
        let ty = ast_type_from_ir(ir, signedness);
        self.intern(ty)
    }

    /// Canonicalizing look-up keyed by an IR value's type.
    pub fn type_from_ir(
        &mut self,
        v: ValueId,
        builder: &IrBuilder,
        signedness: Signedness,
    ) -> TypeId {
        let ir = builder.value_type(v).clone();
        self.type_from_ir_type(&ir, signedness)
    }

    /// Wraps an IR value, inferring its frontend type from the IR type with
    /// signedness defaulting to `Signed`.
    pub fn create_value(&mut self, v: ValueId, builder: &IrBuilder) -> AstValue {
        let ty = self.type_from_ir(v, builder, Signedness::Signed);
        AstValue { ir: v, ty }
    }

    /// Wraps an IR value with an explicit frontend type.
    pub fn create_value_with_type(&mut self, v: ValueId, ty: TypeId) -> AstValue {
        AstValue { ir: v, ty }
    }
}

fn scalar_from_ir(ir: &IrType, signedness: Signedness) -> ScalarTy {
    match ir {
        IrType::Void => ScalarTy::Void,
        IrType::Fp8 => ScalarTy::Fp8,
        IrType::Fp16 => ScalarTy::Fp16,
        IrType::Bf16 => ScalarTy::Bf16,
        IrType::Fp32 => ScalarTy::Fp32,
        IrType::Fp64 => ScalarTy::Fp64,
        IrType::Int(1) => ScalarTy::Int1,
        IrType::Int(8) => match signedness {
            Signedness::Signed => ScalarTy::Int8,
            Signedness::Unsigned => ScalarTy::UInt8,
        },
        IrType::Int(16) => match signedness {
            Signedness::Signed => ScalarTy::Int16,
            Signedness::Unsigned => ScalarTy::UInt16,
        },
        IrType::Int(32) => match signedness {
            Signedness::Signed => ScalarTy::Int32,
            Signedness::Unsigned => ScalarTy::UInt32,
        },
        IrType::Int(64) => match signedness {
            Signedness::Signed => ScalarTy::Int64,
            Signedness::Unsigned => ScalarTy::UInt64,
        },
        IrType::Int(w) => unreachable!("frontend type for i{}", w),
        IrType::Ptr {
            pointee,
            addr_space,
        } => ScalarTy::Ptr {
            pointee: Box::new(scalar_from_ir(pointee, signedness)),
            addr_space: *addr_space,
        },
        IrType::Block { .. } => unreachable!("frontend scalar for a block type"),
    }
}

fn ast_type_from_ir(ir: &IrType, signedness: Signedness) -> AstType {
    match ir {
        IrType::Block { elem, shape } => AstType::Block {
            elem: scalar_from_ir(elem, signedness),
            shape: shape.clone(),
        },
        scalar => AstType::Scalar(scalar_from_ir(scalar, signedness)),
    }
}
