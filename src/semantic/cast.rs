//! Conversions between frontend types.

use crate::ast::{AstContext, AstValue, ScalarTy, TypeId};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;
use crate::ir::instr::CastOp;
use crate::ir::types::IrType;
use crate::semantic::arith::not_equal;

/// Lifts a scalar destination type to a block matching the source's shape.
/// An already-lifted destination is left alone. The signedness of the lifted
/// type is taken from the source, as the element-wise conversion preserves
/// the source's layout.
fn lift_dst_to_src_shape(
    src_ty: &crate::ast::AstType,
    dst: TypeId,
    ctx: &mut AstContext,
) -> TypeId {
    match src_ty.block_shape() {
        Some(shape) if !ctx.ty(dst).is_block() => {
            let lifted = IrType::Block {
                elem: Box::new(ctx.ty(dst).to_ir()),
                shape: shape.to_vec(),
            };
            ctx.type_from_ir_type(&lifted, src_ty.signedness())
        }
        _ => dst,
    }
}

/// Converts `input` to `dst_ty`, choosing exactly one conversion by the
/// scalar-kind pair. Identity casts return the input unchanged.
pub fn cast(
    input: AstValue,
    dst_ty: TypeId,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let src_ty = ctx.ty(input.ty).clone();
    let dst_ty = if src_ty.is_block() {
        lift_dst_to_src_shape(&src_ty, dst_ty, ctx)
    } else {
        dst_ty
    };
    if input.ty == dst_ty {
        return Ok(input);
    }
    let src_sca = src_ty.scalar_ty().clone();
    let dst_sca = ctx.ty(dst_ty).scalar_ty().clone();
    let dst_ir = ctx.ty(dst_ty).to_ir();

    // FP truncation
    let truncate_fp = src_sca.is_floating()
        && dst_sca.is_floating()
        && src_sca.fp_mantissa_width() > dst_sca.fp_mantissa_width();
    if truncate_fp {
        let ret = builder.create_fp_trunc(input.ir, dst_ir);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // FP extension
    let ext_fp = src_sca.is_floating()
        && dst_sca.is_floating()
        && src_sca.fp_mantissa_width() < dst_sca.fp_mantissa_width();
    if ext_fp {
        let ret = builder.create_fp_ext(input.ir, dst_ir);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // Int cast
    if src_sca.is_integer()
        && dst_sca.is_integer()
        && (src_sca.integer_bitwidth() != dst_sca.integer_bitwidth()
            || src_sca.signedness() != dst_sca.signedness())
    {
        let sign_extend = src_sca.is_signed_integer() && !src_sca.is_bool();
        let ret = builder.create_int_cast(input.ir, dst_ir, sign_extend);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // Float -> Int
    if src_sca.is_floating() && dst_sca.is_integer() {
        let ret = if dst_sca.is_bool() {
            builder.create_fp_to_ui(input.ir, dst_ir)
        } else {
            builder.create_fp_to_si(input.ir, dst_ir)
        };
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // Int -> Float
    if src_sca.is_integer() && dst_sca.is_floating() {
        let ret = if src_sca.is_bool() || !src_sca.is_signed_integer() {
            builder.create_ui_to_fp(input.ir, dst_ir)
        } else {
            builder.create_si_to_fp(input.ir, dst_ir)
        };
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // Pointer -> Int: only 64-bit (direct) and 1-bit (through int64) widths
    if src_sca.is_pointer() && dst_sca.is_integer() {
        let bitwidth = dst_sca.integer_bitwidth();
        if bitwidth == 64 {
            let ret = builder.create_cast(CastOp::PtrToInt, input.ir, dst_ir);
            return Ok(ctx.create_value_with_type(ret, dst_ty));
        }
        if bitwidth == 1 {
            let int64 = ctx.scalar(ScalarTy::Int64);
            let as_int = cast(input, int64, ctx, builder)?;
            let zero = builder.get_int64(0);
            let zero = ctx.create_value(zero, builder);
            return not_equal(as_int, zero, ctx, builder);
        }
    }
    // Int -> Pointer
    if !src_sca.is_pointer() && dst_sca.is_pointer() {
        let ret = builder.create_cast(CastOp::IntToPtr, input.ir, dst_ir);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // Pointer -> Pointer
    if src_sca.is_pointer() && dst_sca.is_pointer() {
        let ret = builder.create_cast(CastOp::BitCast, input.ir, dst_ir);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    // * -> Bool
    if dst_sca.is_bool() {
        let input = if src_sca.is_pointer() {
            let int64 = ctx.scalar(ScalarTy::Int64);
            cast(input, int64, ctx, builder)?
        } else {
            input
        };
        let zero = builder.get_int64(0);
        let int64 = ctx.scalar(ScalarTy::Int64);
        let mut other = ctx.create_value_with_type(zero, int64);
        if src_ty.is_bool() {
            if let Some(shape) = src_ty.block_shape() {
                let splat = builder.create_splat(other.ir, shape);
                other = ctx.create_value_with_type(splat, dst_ty);
            }
        }
        let ret = builder.create_icmp(crate::ir::instr::IcmpPred::Ne, input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, dst_ty));
    }
    unreachable!("cast from {} to {}", src_sca, dst_sca);
}

/// Reinterprets `input`'s bits as `dst_ty`. Falls back to `cast` when either
/// side is a pointer; otherwise the primitive sizes must match exactly.
pub fn bitcast(
    input: AstValue,
    dst_ty: TypeId,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let src_ty = ctx.ty(input.ty).clone();
    let dst_ty = if src_ty.is_block() {
        lift_dst_to_src_shape(&src_ty, dst_ty, ctx)
    } else {
        dst_ty
    };
    if input.ty == dst_ty {
        return Ok(input);
    }
    let src_sca = src_ty.scalar_ty().clone();
    let dst_sca = ctx.ty(dst_ty).scalar_ty().clone();
    if src_sca.is_pointer() || dst_sca.is_pointer() {
        return cast(input, dst_ty, ctx, builder);
    }
    let src_bits = src_sca.primitive_size_in_bits();
    let dst_bits = dst_sca.primitive_size_in_bits();
    if src_bits != dst_bits {
        return Err(SemanticError::BitcastSizeMismatch {
            src_bits,
            dst_bits,
        });
    }
    let dst_ir = ctx.ty(dst_ty).to_ir();
    let ret = builder.create_cast(CastOp::BitCast, input.ir, dst_ir);
    Ok(ctx.create_value_with_type(ret, dst_ty))
}
