//! Block creation, shape manipulation, linear algebra, selection,
//! reductions, and instruction annotations.

use crate::ast::{AstContext, AstValue, ScalarTy, TypeId};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;
use crate::ir::instr::ReduceOp;
use crate::semantic::cast::cast;
use crate::semantic::{broadcast, computation_type, incompatible_types, DivOrMod};

// ---------------------------------------------------------------------------
// Block creation
// ---------------------------------------------------------------------------

/// The i32 sequence `[start, end)` as a one-dimensional block.
pub fn arange(
    start: i32,
    end: i32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if start >= end {
        return Err(SemanticError::InvalidRange { start, end });
    }
    let ret = builder.get_range(start, end);
    Ok(ctx.create_value(ret, builder))
}

/// A block of `shape` filled with the zero value of `dtype`.
pub fn zeros(
    shape: &[u32],
    dtype: TypeId,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if shape.is_empty() || shape.iter().any(|&d| d == 0) {
        return Err(SemanticError::InvalidShape);
    }
    let dtype = ctx.ty(dtype).clone();
    let zero = builder.get_null_value(&dtype.to_ir());
    let ret = builder.create_splat(zero, shape);
    let ret_ty = ctx.type_from_ir(ret, builder, dtype.signedness());
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

// ---------------------------------------------------------------------------
// Shape manipulation
// ---------------------------------------------------------------------------

pub fn reshape(
    input: AstValue,
    dst_shape: &[u32],
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if dst_shape.is_empty() || dst_shape.iter().any(|&d| d == 0) {
        return Err(SemanticError::InvalidShape);
    }
    let input_ty = ctx.ty(input.ty).clone();
    let numel: u64 = dst_shape.iter().map(|&d| d as u64).product();
    if input_ty.num_elements() != numel {
        return Err(SemanticError::ReshapeMismatch);
    }
    let ret = builder.create_reshape(input.ir, dst_shape);
    let ret_ty = ctx.type_from_ir(ret, builder, input_ty.signedness());
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

/// Concatenates two blocks along their leading dimension.
pub fn cat(
    lhs: AstValue,
    rhs: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let lhs_ty = ctx.ty(lhs.ty).clone();
    let rhs_ty = ctx.ty(rhs.ty).clone();
    let compatible = match (lhs_ty.block_shape(), rhs_ty.block_shape()) {
        (Some(l), Some(r)) => {
            l.len() == r.len() && l[1..] == r[1..] && lhs_ty.scalar_ty() == rhs_ty.scalar_ty()
        }
        _ => false,
    };
    if !compatible {
        return Err(incompatible_types(lhs_ty.scalar_ty(), rhs_ty.scalar_ty()));
    }
    let ret = builder.create_cat(lhs.ir, rhs.ir);
    let ret_ty = ctx.type_from_ir(ret, builder, lhs_ty.signedness());
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

// ---------------------------------------------------------------------------
// Linear algebra
// ---------------------------------------------------------------------------

/// 2D matrix product `[M,K] x [K,N] -> [M,N]`, accumulated into a zero
/// block (fp32 zero when either input is floating point, int32 otherwise).
pub fn dot(
    lhs: AstValue,
    rhs: AstValue,
    allow_tf32: bool,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let lhs_ty = ctx.ty(lhs.ty).clone();
    let rhs_ty = ctx.ty(rhs.ty).clone();
    let (lhs_shape, rhs_shape) = match (lhs_ty.block_shape(), rhs_ty.block_shape()) {
        (Some(l), Some(r)) if l.len() == 2 && r.len() == 2 => (l, r),
        _ => {
            return Err(SemanticError::DotOperandsNotMatrix {
                lhs: lhs_ty.to_string(),
                rhs: rhs_ty.to_string(),
            })
        }
    };
    if lhs_shape[1] != rhs_shape[0] {
        return Err(SemanticError::DotInnerDim {
            lhs: lhs_shape[1],
            rhs: rhs_shape[0],
        });
    }
    let any_float = lhs_ty.scalar_ty().is_floating() || rhs_ty.scalar_ty().is_floating();
    let zero = if any_float {
        builder.get_float32(0.0)
    } else {
        builder.get_int32(0)
    };
    let m = lhs_shape[0];
    let n = rhs_shape[1];
    let acc = builder.create_splat(zero, &[m, n]);
    let ret = builder.create_dot(lhs.ir, rhs.ir, acc, allow_tf32);
    Ok(ctx.create_value(ret, builder))
}

// ---------------------------------------------------------------------------
// Indexing
// ---------------------------------------------------------------------------

/// Element-wise selection: `condition ? x : y`. The condition is implicitly
/// cast to bool; `x` and `y` are broadcast to its shape and promoted to a
/// common type.
pub fn where_(
    condition: AstValue,
    x: AstValue,
    y: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let bool_ty = ctx.scalar(ScalarTy::Int1);
    let condition = cast(condition, bool_ty, ctx, builder)?;
    let mut x = x;
    let mut y = y;
    if let Some(shape) = ctx.ty(condition.ty).block_shape().map(<[u32]>::to_vec) {
        x = broadcast(x, &shape, ctx, builder)?;
        y = broadcast(y, &shape, ctx, builder)?;
    }
    let x_sca = ctx.ty(x.ty).scalar_ty().clone();
    let y_sca = ctx.ty(y.ty).scalar_ty().clone();
    let ty = computation_type(&x_sca, &y_sca, DivOrMod::No)?;
    let signedness = ty.signedness();
    let ty = ctx.scalar(ty);
    let x = cast(x, ty, ctx, builder)?;
    let y = cast(y, ty, ctx, builder)?;
    let ret = builder.create_select(condition.ir, x.ir, y.ir);
    let ret_ty = ctx.type_from_ir(ret, builder, signedness);
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

fn reduce_impl(
    input: AstValue,
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
    name: &'static str,
    float_op: ReduceOp,
    int_op: ReduceOp,
) -> Result<AstValue, SemanticError> {
    let input_ty = ctx.ty(input.ty).clone();
    let rank = input_ty.rank();
    if axis as usize >= rank {
        return Err(SemanticError::InvalidAxis { axis, rank });
    }
    // small integers are extended to 32 bits: better accuracy, and free on
    // the target
    let sca = input_ty.scalar_ty().clone();
    let input = if sca.is_integer() && sca.integer_bitwidth() <= 32 {
        let int32 = ctx.scalar(ScalarTy::Int32);
        cast(input, int32, ctx, builder)?
    } else {
        input
    };
    let sca = ctx.ty(input.ty).scalar_ty().clone();
    let signedness = ctx.ty(input.ty).signedness();
    if sca.is_floating() {
        let ret = builder.create_reduce(input.ir, float_op, axis);
        let ret_ty = ctx.type_from_ir(ret, builder, signedness);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    if sca.is_integer() {
        let ret = builder.create_reduce(input.ir, int_op, axis);
        let ret_ty = ctx.type_from_ir(ret, builder, signedness);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("{} of {}", name, sca);
}

pub fn min(
    input: AstValue,
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    reduce_impl(input, axis, ctx, builder, "min", ReduceOp::FMin, ReduceOp::Min)
}

pub fn max(
    input: AstValue,
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    reduce_impl(input, axis, ctx, builder, "max", ReduceOp::FMax, ReduceOp::Max)
}

pub fn sum(
    input: AstValue,
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    reduce_impl(input, axis, ctx, builder, "sum", ReduceOp::FAdd, ReduceOp::Add)
}

pub fn xor_sum(
    input: AstValue,
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if !ctx.ty(input.ty).scalar_ty().is_integer() {
        return Err(SemanticError::XorSumNotInteger);
    }
    reduce_impl(input, axis, ctx, builder, "xor_sum", ReduceOp::Xor, ReduceOp::Xor)
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

/// Marks `x` as a multiple of `value`. `x` must be an instruction result.
pub fn multiple_of(
    x: AstValue,
    value: u32,
    _ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if !builder.func().is_instruction(x.ir) {
        return Err(SemanticError::NotAnInstruction { op: "multiple_of" });
    }
    builder.set_multiple_of(x.ir, value);
    Ok(x)
}

/// Marks at least `value` consecutive elements of `x` as contiguous.
pub fn max_contiguous(
    x: AstValue,
    value: u32,
    _ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    if !builder.func().is_instruction(x.ir) {
        return Err(SemanticError::NotAnInstruction { op: "max_contiguous" });
    }
    builder.set_max_contiguous(x.ir, value);
    Ok(x)
}

pub fn debug_barrier(
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_barrier();
    Ok(ctx.create_value(ret, builder))
}
