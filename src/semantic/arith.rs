//! Binary, unary, and comparison operators, plus math intrinsics and the
//! programming-model queries.

use crate::ast::{AstContext, AstValue, ScalarTy};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;
use crate::ir::instr::{FcmpPred, IcmpPred};
use crate::semantic::cast::cast;
use crate::semantic::{
    binary_op_type_checking, bitwise_op_type_checking, DivOrMod,
};

// ---------------------------------------------------------------------------
// Programming model
// ---------------------------------------------------------------------------

pub fn program_id(
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_get_program_id(axis);
    Ok(ctx.create_value(ret, builder))
}

pub fn num_programs(
    axis: u32,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_get_num_programs(axis);
    Ok(ctx.create_value(ret, builder))
}

// ---------------------------------------------------------------------------
// Binary operators
// ---------------------------------------------------------------------------

pub fn add(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (mut input, mut other) =
        binary_op_type_checking(input, other, ctx, builder, true, true, true, DivOrMod::No)?;
    let mut input_sca = ctx.ty(input.ty).scalar_ty().clone();
    let mut other_sca = ctx.ty(other.ty).scalar_ty().clone();
    // offset + ptr
    // ptr + offset
    if other_sca.is_pointer() && !input_sca.is_pointer() {
        std::mem::swap(&mut input, &mut other);
        std::mem::swap(&mut input_sca, &mut other_sca);
    }
    let ret_ty = input.ty;
    if input_sca.is_pointer() {
        // only pointer + integer; two pointers never add, even with the
        // same pointee
        if other_sca.is_pointer() {
            return Err(crate::semantic::incompatible_types(&input_sca, &other_sca));
        }
        let ret = builder.create_gep(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // float + float
    if input_sca.is_floating() {
        let ret = builder.create_fadd(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // int + int
    if input_sca.is_integer() {
        let ret = builder.create_add(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("add of {}", input_sca);
}

pub fn sub(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, true, false, true, DivOrMod::No)?;
    let ret_ty = input.ty;
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    // ptr - offset
    if input_sca.is_pointer() {
        let neg = minus(other, ctx, builder)?;
        let ret = builder.create_gep(input.ir, neg.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // float - float
    if input_sca.is_floating() {
        let ret = builder.create_fsub(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // int - int
    if input_sca.is_integer() {
        let ret = builder.create_sub(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("sub of {}", input_sca);
}

pub fn mul(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, true, DivOrMod::No)?;
    let ret_ty = input.ty;
    let sca = ctx.ty(input.ty).scalar_ty().clone();
    // float * float
    if sca.is_floating() {
        let ret = builder.create_fmul(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // int * int
    if sca.is_integer() {
        let ret = builder.create_mul(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("mul of {}", sca);
}

pub fn truediv(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (mut input, mut other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, true, DivOrMod::Yes)?;
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    let other_sca = ctx.ty(other.ty).scalar_ty().clone();
    // float / int
    if input_sca.is_floating() && other_sca.is_integer() {
        let dst = ctx.scalar(input_sca);
        other = cast(other, dst, ctx, builder)?;
    }
    // int / float
    else if input_sca.is_integer() && other_sca.is_floating() {
        let dst = ctx.scalar(other_sca);
        input = cast(input, dst, ctx, builder)?;
    }
    // int / int (cast to fp32)
    else if input_sca.is_integer() && other_sca.is_integer() {
        let fp32 = ctx.scalar(ScalarTy::Fp32);
        input = cast(input, fp32, ctx, builder)?;
        other = cast(other, fp32, ctx, builder)?;
    }
    // float / float (cast to the highest-exponent type)
    else if input_sca.is_floating() && other_sca.is_floating() {
        if input_sca.fp_mantissa_width() > other_sca.fp_mantissa_width() {
            let dst = ctx.scalar(input_sca);
            other = cast(other, dst, ctx, builder)?;
        } else {
            let dst = ctx.scalar(other_sca);
            input = cast(input, dst, ctx, builder)?;
        }
    } else {
        unreachable!("truediv of {} and {}", input_sca, other_sca);
    }
    let ret = builder.create_fdiv(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn floordiv(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, true, DivOrMod::Yes)?;
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    let other_sca = ctx.ty(other.ty).scalar_ty().clone();
    if input_sca.is_integer() && other_sca.is_integer() {
        let ret_sca = crate::semantic::integer_promote(&input_sca, &other_sca);
        let ret_scalar_ty = ctx.scalar(ret_sca.clone());
        let input = cast(input, ret_scalar_ty, ctx, builder)?;
        let other = cast(other, ret_scalar_ty, ctx, builder)?;
        let ret = if ret_sca.is_signed_integer() {
            builder.create_sdiv(input.ir, other.ir)
        } else {
            builder.create_udiv(input.ir, other.ir)
        };
        return Ok(ctx.create_value_with_type(ret, input.ty));
    }
    unreachable!("floordiv of {} and {}", input_sca, other_sca);
}

/// Float division with an explicit IEEE-rounding request carried as
/// instruction metadata.
pub fn fdiv(
    input: AstValue,
    other: AstValue,
    ieee_rounding: bool,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    let other_sca = ctx.ty(other.ty).scalar_ty().clone();
    if !input_sca.is_floating() || !other_sca.is_floating() {
        return Err(SemanticError::FdivOperandsNotFloat);
    }
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, false, DivOrMod::Yes)?;
    let ret = builder.create_fdiv(input.ir, other.ir);
    builder.set_fdiv_ieee_rounding(ret, ieee_rounding);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn mod_(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, true, DivOrMod::Yes)?;
    let ret_ty = input.ty;
    let sca = ctx.ty(input.ty).scalar_ty().clone();
    let other_sca = ctx.ty(other.ty).scalar_ty().clone();
    // float % float
    if sca.is_floating() {
        let ret = builder.create_frem(input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    // int % int
    if sca.is_integer() {
        if sca.signedness() != other_sca.signedness() {
            return Err(SemanticError::ModMixedSignedness {
                lhs: sca.to_string(),
                rhs: other_sca.to_string(),
            });
        }
        let ret = if sca.is_signed_integer() {
            builder.create_srem(input.ir, other.ir)
        } else {
            builder.create_urem(input.ir, other.ir)
        };
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("mod of {}", sca);
}

pub fn and_(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) = bitwise_op_type_checking(input, other, ctx, builder)?;
    let ret = builder.create_and(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn or_(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) = bitwise_op_type_checking(input, other, ctx, builder)?;
    let ret = builder.create_or(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn xor_(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) = bitwise_op_type_checking(input, other, ctx, builder)?;
    let ret = builder.create_xor(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn lshr(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) = bitwise_op_type_checking(input, other, ctx, builder)?;
    let ret = builder.create_lshr(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

pub fn shl(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (input, other) = bitwise_op_type_checking(input, other, ctx, builder)?;
    let ret = builder.create_shl(input.ir, other.ir);
    Ok(ctx.create_value_with_type(ret, input.ty))
}

// ---------------------------------------------------------------------------
// Unary operators
// ---------------------------------------------------------------------------

pub fn plus(
    input: AstValue,
    _ctx: &mut AstContext,
    _builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    Ok(input)
}

pub fn minus(
    input: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    if input_sca.is_pointer() {
        return Err(SemanticError::WrongUnaryOperand {
            op: "minus",
            ty: input_sca.to_string(),
        });
    }
    let zero = builder.get_null_value(&input_sca.to_ir());
    let zero_ty = ctx.scalar(input_sca);
    let zero = ctx.create_value_with_type(zero, zero_ty);
    sub(zero, input, ctx, builder)
}

pub fn invert(
    input: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let input_sca = ctx.ty(input.ty).scalar_ty().clone();
    if input_sca.is_pointer() || input_sca.is_floating() {
        return Err(SemanticError::WrongUnaryOperand {
            op: "invert",
            ty: input_sca.to_string(),
        });
    }
    let ones = builder.get_all_ones_value(&input_sca.to_ir());
    let ones_ty = ctx.scalar(input_sca);
    let ones = ctx.create_value_with_type(ones, ones_ty);
    xor_(input, ones, ctx, builder)
}

// ---------------------------------------------------------------------------
// Comparison operators
// ---------------------------------------------------------------------------

/// The element-wise boolean type matching `of`'s shape.
fn bool_ret_ty(
    of: AstValue,
    ctx: &mut AstContext,
) -> Result<crate::ast::TypeId, SemanticError> {
    match ctx.ty(of.ty).block_shape().map(<[u32]>::to_vec) {
        Some(shape) => ctx.block_of(ScalarTy::Int1, &shape),
        None => Ok(ctx.scalar(ScalarTy::Int1)),
    }
}

fn compare(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
    float_pred: FcmpPred,
    signed_pred: IcmpPred,
    unsigned_pred: IcmpPred,
    name: &'static str,
) -> Result<AstValue, SemanticError> {
    let (input, other) =
        binary_op_type_checking(input, other, ctx, builder, false, false, true, DivOrMod::No)?;
    let ret_ty = bool_ret_ty(input, ctx)?;
    let sca = ctx.ty(input.ty).scalar_ty().clone();
    if sca.is_floating() {
        let ret = builder.create_fcmp(float_pred, input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    if sca.is_integer() {
        let pred = if sca.is_signed_integer() {
            signed_pred
        } else {
            unsigned_pred
        };
        let ret = builder.create_icmp(pred, input.ir, other.ir);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    unreachable!("{} of {}", name, sca);
}

pub fn greater_than(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Ogt,
        IcmpPred::Sgt,
        IcmpPred::Ugt,
        "greater_than",
    )
}

pub fn greater_equal(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Oge,
        IcmpPred::Sge,
        IcmpPred::Uge,
        "greater_equal",
    )
}

pub fn less_than(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Olt,
        IcmpPred::Slt,
        IcmpPred::Ult,
        "less_than",
    )
}

pub fn less_equal(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Ole,
        IcmpPred::Sle,
        IcmpPred::Ule,
        "less_equal",
    )
}

pub fn equal(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Oeq,
        IcmpPred::Eq,
        IcmpPred::Eq,
        "equal",
    )
}

pub fn not_equal(
    input: AstValue,
    other: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    compare(
        input,
        other,
        ctx,
        builder,
        FcmpPred::Une,
        IcmpPred::Ne,
        IcmpPred::Ne,
        "not_equal",
    )
}

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

/// High half of the full-width product.
pub fn umulhi(
    x: AstValue,
    y: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (x, y) =
        binary_op_type_checking(x, y, ctx, builder, false, false, true, DivOrMod::No)?;
    let ret = builder.create_umulhi(x.ir, y.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}

pub fn exp(
    x: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_exp(x.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}

pub fn log(
    x: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_log(x.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}

pub fn cos(
    x: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_cos(x.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}

pub fn sin(
    x: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_sin(x.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}

pub fn sqrt(
    x: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_sqrt(x.ir);
    Ok(ctx.create_value_with_type(ret, x.ty))
}
