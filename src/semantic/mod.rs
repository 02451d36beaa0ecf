//! Semantic lowering.
//!
//! The dispatcher: a module of free functions that take frontend values plus
//! an `AstContext` and an `IrBuilder`, resolve implicit broadcasting and
//! numeric promotion, emit IR, and wrap the result in a new frontend value.
//!
//! All operations are stateless with respect to each other; mutable state
//! lives in the builder (insertion point, emitted instructions) and the
//! context (interned types). Each operation returns the new value or the
//! first `SemanticError`; on error the module under construction is
//! considered poisoned and the compilation is abandoned.

pub mod arith;
pub mod block;
pub mod cast;
pub mod memory;

pub use arith::{
    add, and_, cos, equal, exp, fdiv, floordiv, greater_equal, greater_than, invert, less_equal,
    less_than, log, lshr, minus, mod_, mul, not_equal, num_programs, or_, plus, program_id, shl,
    sin, sqrt, sub, truediv, umulhi, xor_,
};
pub use block::{
    arange, cat, debug_barrier, dot, max, max_contiguous, min, multiple_of, reshape, sum, where_,
    xor_sum, zeros,
};
pub use cast::{bitcast, cast};
pub use memory::{
    atomic_add, atomic_and, atomic_cas, atomic_max, atomic_min, atomic_or, atomic_xchg,
    atomic_xor, load, store,
};

use crate::ast::{AstContext, AstValue, ScalarTy, Signedness};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;

/// Whether a binary operation is a division or remainder. Drives fp16
/// promotion (no native fp16 divide on the target) and the mixed-signedness
/// rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DivOrMod {
    No,
    Yes,
}

pub(crate) fn shape_string(shape: &[u32]) -> String {
    let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
    format!("[{}]", dims.join("x"))
}

pub(crate) fn incompatible_types(a: &ScalarTy, b: &ScalarTy) -> SemanticError {
    SemanticError::IncompatibleTypes {
        lhs: a.to_string(),
        rhs: b.to_string(),
    }
}

/// Widens an integer pair to a single common integer type.
///
/// Signedness rules follow C's "usual arithmetic conversions": same
/// signedness: the wider type wins. Mixed: the unsigned type wins when its
/// width is at least the signed type's, otherwise the signed type wins.
pub(crate) fn integer_promote(a: &ScalarTy, b: &ScalarTy) -> ScalarTy {
    let a_rank = a.integer_bitwidth();
    let b_rank = b.integer_bitwidth();
    let a_sn = a.signedness();
    let b_sn = b.signedness();
    if a_sn == b_sn {
        if a_rank > b_rank {
            a.clone()
        } else {
            b.clone()
        }
    } else if a_sn == Signedness::Unsigned {
        if a_rank >= b_rank {
            a.clone()
        } else {
            b.clone()
        }
    } else {
        if b_rank >= a_rank {
            b.clone()
        } else {
            a.clone()
        }
    }
}

/// The common type both operands of an arithmetic operation are implicitly
/// converted to.
pub(crate) fn computation_type(
    a: &ScalarTy,
    b: &ScalarTy,
    div_or_mod: DivOrMod,
) -> Result<ScalarTy, SemanticError> {
    // 1) if one operand is fp64, the other is implicitly converted to fp64
    if matches!(a, ScalarTy::Fp64) || matches!(b, ScalarTy::Fp64) {
        return Ok(ScalarTy::Fp64);
    }
    // 2) if one operand is fp32, the other is implicitly converted to fp32
    if matches!(a, ScalarTy::Fp32) || matches!(b, ScalarTy::Fp32) {
        return Ok(ScalarTy::Fp32);
    }
    // 3) if one operand is fp16, the other is implicitly converted to fp16,
    //    unless we're doing / or %, which have no native fp16 form on the
    //    target
    if matches!(a, ScalarTy::Fp16) || matches!(b, ScalarTy::Fp16) {
        if div_or_mod == DivOrMod::Yes {
            return Ok(ScalarTy::Fp32);
        } else {
            return Ok(ScalarTy::Fp16);
        }
    }
    if !a.is_integer() || !b.is_integer() {
        unreachable!("computation_type of {} and {}", a, b);
    }
    // 4) both operands are integer and undergo integer promotion
    if div_or_mod == DivOrMod::Yes && a.signedness() != b.signedness() {
        return Err(SemanticError::DivMixedSignedness {
            lhs: a.to_string(),
            rhs: b.to_string(),
        });
    }
    Ok(integer_promote(a, b))
}

/// Rejects pointer operands the operation cannot accept: a pointer on a side
/// that disallows it, two pointers of different pointee type, or a pointer
/// paired with a float.
pub(crate) fn check_ptr_type(
    type_a: &ScalarTy,
    type_b: &ScalarTy,
    allow_ptr_a: bool,
) -> Result<(), SemanticError> {
    if type_a.is_pointer() {
        if !allow_ptr_a {
            return Err(incompatible_types(type_a, type_b));
        }
        // T* + U* with T != U
        if type_b.is_pointer() && type_a != type_b {
            return Err(incompatible_types(type_a, type_b));
        }
        // T* + float
        if type_b.is_floating() {
            return Err(incompatible_types(type_a, type_b));
        }
    }
    Ok(())
}

/// Shared front half of every binary operation: pairwise broadcast, pointer
/// checks, and (for arithmetic ops) implicit conversion of both operands to
/// their computation type.
pub(crate) fn binary_op_type_checking(
    lhs: AstValue,
    rhs: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
    allow_lhs_ptr: bool,
    allow_rhs_ptr: bool,
    arithmetic_check: bool,
    div_or_mod: DivOrMod,
) -> Result<(AstValue, AstValue), SemanticError> {
    // implicit broadcasting
    let (mut lhs, mut rhs) = broadcast_pair(lhs, rhs, ctx, builder)?;
    // implicit typecasting
    let lhs_sca = ctx.ty(lhs.ty).scalar_ty().clone();
    let rhs_sca = ctx.ty(rhs.ty).scalar_ty().clone();
    check_ptr_type(&lhs_sca, &rhs_sca, allow_lhs_ptr)?;
    check_ptr_type(&rhs_sca, &lhs_sca, allow_rhs_ptr)?;
    if arithmetic_check && !lhs_sca.is_pointer() && !rhs_sca.is_pointer() {
        let ret_sca = computation_type(&lhs_sca, &rhs_sca, div_or_mod)?;
        let ret_ty = ctx.scalar(ret_sca);
        lhs = cast::cast(lhs, ret_ty, ctx, builder)?;
        rhs = cast::cast(rhs, ret_ty, ctx, builder)?;
    }
    Ok((lhs, rhs))
}

/// Shared front half of the bitwise operations: broadcast, require integer
/// scalars, promote, but never insert the arithmetic implicit cast.
pub(crate) fn bitwise_op_type_checking(
    lhs: AstValue,
    rhs: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<(AstValue, AstValue), SemanticError> {
    let (mut lhs, mut rhs) =
        binary_op_type_checking(lhs, rhs, ctx, builder, false, false, false, DivOrMod::No)?;
    let lhs_sca = ctx.ty(lhs.ty).scalar_ty().clone();
    let rhs_sca = ctx.ty(rhs.ty).scalar_ty().clone();
    if !lhs_sca.is_integer() || !rhs_sca.is_integer() {
        return Err(incompatible_types(&lhs_sca, &rhs_sca));
    }
    let ret_sca = integer_promote(&lhs_sca, &rhs_sca);
    if ret_sca != lhs_sca {
        let ret_ty = ctx.scalar(ret_sca.clone());
        lhs = cast::cast(lhs, ret_ty, ctx, builder)?;
    }
    if ret_sca != rhs_sca {
        let ret_ty = ctx.scalar(ret_sca);
        rhs = cast::cast(rhs, ret_ty, ctx, builder)?;
    }
    Ok((lhs, rhs))
}

/// Shape-targeted broadcast: splat a scalar to `shape`, extend a block of
/// the same rank dimension by dimension (a source dimension must equal the
/// target or be 1), or return the input unchanged when the shapes already
/// match.
pub fn broadcast(
    input: AstValue,
    shape: &[u32],
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let input_ty = ctx.ty(input.ty).clone();
    if !input_ty.is_block() {
        let ret = builder.create_splat(input.ir, shape);
        let ret_ty = ctx.type_from_ir(ret, builder, input_ty.signedness());
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    let src_shape = input_ty.block_shape().unwrap();
    if src_shape.len() != shape.len() {
        return Err(SemanticError::CannotBroadcast {
            from: input_ty.to_string(),
            to: shape_string(shape),
        });
    }
    if src_shape == shape {
        return Ok(input);
    }
    for (&src, &dst) in src_shape.iter().zip(shape) {
        if src != dst && src != 1 {
            return Err(SemanticError::CannotBroadcast {
                from: input_ty.to_string(),
                to: shape_string(shape),
            });
        }
    }
    let ret = builder.create_broadcast(input.ir, shape);
    let ret_ty = ctx.type_from_ir(ret, builder, input_ty.signedness());
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

/// Pairwise broadcast: make the two operands shape-compatible.
///
/// (scalar, scalar) is a no-op; a scalar paired with a block is splatted to
/// the block's shape; two blocks must have the same rank, each dimension
/// pair must be `(1, k)`, `(k, 1)` or `(k, k)`, and both sides are extended
/// to the common shape.
pub fn broadcast_pair(
    lhs: AstValue,
    rhs: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<(AstValue, AstValue), SemanticError> {
    let lhs_ty = ctx.ty(lhs.ty).clone();
    let rhs_ty = ctx.ty(rhs.ty).clone();

    if lhs_ty.is_block() && !rhs_ty.is_block() {
        let shape = lhs_ty.block_shape().unwrap();
        let ret = builder.create_splat(rhs.ir, shape);
        let ret_ty = ctx.type_from_ir(ret, builder, rhs_ty.signedness());
        let rhs = ctx.create_value_with_type(ret, ret_ty);
        return Ok((lhs, rhs));
    }
    if !lhs_ty.is_block() && rhs_ty.is_block() {
        let shape = rhs_ty.block_shape().unwrap();
        let ret = builder.create_splat(lhs.ir, shape);
        let ret_ty = ctx.type_from_ir(ret, builder, lhs_ty.signedness());
        let lhs = ctx.create_value_with_type(ret, ret_ty);
        return Ok((lhs, rhs));
    }
    if lhs_ty.is_block() && rhs_ty.is_block() {
        let lhs_shape = lhs_ty.block_shape().unwrap();
        let rhs_shape = rhs_ty.block_shape().unwrap();
        if lhs_shape.len() != rhs_shape.len() {
            return Err(SemanticError::RankMismatch {
                left: lhs_shape.len(),
                right: rhs_shape.len(),
            });
        }
        let mut ret_shape = Vec::with_capacity(lhs_shape.len());
        for (i, (&left, &right)) in lhs_shape.iter().zip(rhs_shape).enumerate() {
            if left == 1 {
                ret_shape.push(right);
            } else if right == 1 {
                ret_shape.push(left);
            } else if left == right {
                ret_shape.push(left);
            } else {
                return Err(SemanticError::IncompatibleDim { index: i, left, right });
            }
        }
        let lhs = if lhs_shape != ret_shape {
            let ret = builder.create_broadcast(lhs.ir, &ret_shape);
            let ret_ty = ctx.type_from_ir(ret, builder, lhs_ty.signedness());
            ctx.create_value_with_type(ret, ret_ty)
        } else {
            lhs
        };
        let rhs = if rhs_shape != ret_shape {
            let ret = builder.create_broadcast(rhs.ir, &ret_shape);
            let ret_ty = ctx.type_from_ir(ret, builder, rhs_ty.signedness());
            ctx.create_value_with_type(ret, ret_ty)
        } else {
            rhs
        };
        return Ok((lhs, rhs));
    }
    Ok((lhs, rhs))
}
