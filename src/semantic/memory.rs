//! Memory operators: loads, stores, and atomics.

use crate::ast::{AstContext, AstValue, ScalarTy, TypeId};
use crate::error::SemanticError;
use crate::ir::builder::IrBuilder;
use crate::ir::instr::{CacheModifier, RmwOp};
use crate::semantic::arith::{and_, greater_equal, less_than};
use crate::semantic::block::where_;
use crate::semantic::cast::{bitcast, cast};
use crate::semantic::broadcast;

fn parse_cache_modifier(modifier: &str) -> Result<CacheModifier, SemanticError> {
    match modifier {
        "" => Ok(CacheModifier::None),
        ".ca" => Ok(CacheModifier::Ca),
        ".cg" => Ok(CacheModifier::Cg),
        other => Err(SemanticError::UnsupportedCacheModifier {
            modifier: other.to_owned(),
        }),
    }
}

/// Substitutes `int8` for a `bool` pointee and re-casts the pointer, since
/// the target cannot address single bits. Returns the (possibly new) pointer
/// and its element type.
fn demote_bool_pointee(
    ptr: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<(AstValue, ScalarTy), SemanticError> {
    let ptr_sca = ctx.ty(ptr.ty).scalar_ty().clone();
    let elt = ptr_sca.pointee().cloned().unwrap_or(ScalarTy::Void);
    if elt.is_bool() {
        let addr_space = ptr_sca.addr_space().unwrap_or(1);
        let elt = ScalarTy::Int8;
        let elt_id = ctx.scalar(elt.clone());
        let ptr_ty = ctx.pointer_to(elt_id, addr_space)?;
        let ptr = cast(ptr, ptr_ty, ctx, builder)?;
        return Ok((ptr, elt));
    }
    Ok((ptr, elt))
}

/// The element-wise result type of a memory access through `ptr`.
fn access_ty(
    ptr: AstValue,
    elt: &ScalarTy,
    ctx: &mut AstContext,
) -> Result<TypeId, SemanticError> {
    match ctx.ty(ptr.ty).block_shape().map(<[u32]>::to_vec) {
        Some(shape) => ctx.block_of(elt.clone(), &shape),
        None => Ok(ctx.scalar(elt.clone())),
    }
}

pub fn load(
    ptr: AstValue,
    mask: Option<AstValue>,
    other: Option<AstValue>,
    cache_modifier: &str,
    is_volatile: bool,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ptr_ty = ctx.ty(ptr.ty).clone();
    if !ptr_ty.scalar_ty().is_pointer() {
        return Err(SemanticError::NotAPointer {
            op: "load",
            ty: ptr_ty.to_string(),
        });
    }
    let mut mask = mask;
    let mut other = other;
    if let Some(shape) = ptr_ty.block_shape().map(<[u32]>::to_vec) {
        if let Some(m) = mask {
            mask = Some(broadcast(m, &shape, ctx, builder)?);
        }
        if let Some(o) = other {
            let o = broadcast(o, &shape, ctx, builder)?;
            let pointee = ptr_ty.scalar_ty().pointee().unwrap().clone();
            let pointee = ctx.scalar(pointee);
            other = Some(cast(o, pointee, ctx, builder)?);
        }
    }
    // treat bool* as int8*
    let (ptr, elt) = demote_bool_pointee(ptr, ctx, builder)?;
    let cache = parse_cache_modifier(cache_modifier)?;
    let ret_ty = access_ty(ptr, &elt, ctx)?;
    if mask.is_none() && other.is_none() {
        let ret = builder.create_load(ptr.ir, cache, is_volatile);
        return Ok(ctx.create_value_with_type(ret, ret_ty));
    }
    let mask = mask.ok_or(SemanticError::OtherWithoutMask)?;
    let other = match other {
        Some(o) => o,
        None => {
            let undef = builder.get_undef(&elt.to_ir());
            let mut o = ctx.create_value(undef, builder);
            if let Some(shape) = ctx.ty(ptr.ty).block_shape().map(<[u32]>::to_vec) {
                let splat = builder.create_splat(o.ir, &shape);
                o = ctx.create_value(splat, builder);
            }
            o
        }
    };
    let ret = builder.create_masked_load(ptr.ir, mask.ir, other.ir, cache, is_volatile);
    Ok(ctx.create_value_with_type(ret, ret_ty))
}

pub fn store(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ptr_ty = ctx.ty(ptr.ty).clone();
    if !ptr_ty.scalar_ty().is_pointer() {
        return Err(SemanticError::NotAPointer {
            op: "store",
            ty: ptr_ty.to_string(),
        });
    }
    let mut val = val;
    let mut mask = mask;
    if let Some(shape) = ptr_ty.block_shape().map(<[u32]>::to_vec) {
        val = broadcast(val, &shape, ctx, builder)?;
        if let Some(m) = mask {
            mask = Some(broadcast(m, &shape, ctx, builder)?);
        }
    }
    // treat bool* as int8*
    let (ptr, elt) = demote_bool_pointee(ptr, ctx, builder)?;
    // cast to the target data type
    let elt_id = ctx.scalar(elt);
    let val = cast(val, elt_id, ctx, builder)?;
    let mask = match mask {
        Some(m) => m,
        None => {
            let ret = builder.create_store(ptr.ir, val.ir);
            return Ok(ctx.create_value(ret, builder));
        }
    };
    if !ctx.ty(mask.ty).scalar_ty().is_bool() {
        return Err(SemanticError::MaskNotBool {
            ty: ctx.ty(mask.ty).to_string(),
        });
    }
    let ret = builder.create_masked_store(ptr.ir, val.ir, mask.ir);
    Ok(ctx.create_value(ret, builder))
}

pub fn atomic_cas(
    ptr: AstValue,
    cmp: AstValue,
    val: AstValue,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let ret = builder.create_atomic_cas(ptr.ir, cmp.ir, val.ir);
    Ok(ctx.create_value_with_type(ret, val.ty))
}

/// Shared preprocessing for the atomic read-modify-write family: pointer
/// check, mask/value broadcast, value cast to the pointee type, and a
/// default all-true mask.
fn atom_red_typechecking(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<(AstValue, AstValue, AstValue), SemanticError> {
    let ptr_ty = ctx.ty(ptr.ty).clone();
    if !ptr_ty.scalar_ty().is_pointer() {
        return Err(SemanticError::NotAPointer {
            op: "atomic",
            ty: ptr_ty.to_string(),
        });
    }
    let mut val = val;
    let mut mask = mask;
    if let Some(shape) = ptr_ty.block_shape().map(<[u32]>::to_vec) {
        if let Some(m) = mask {
            mask = Some(broadcast(m, &shape, ctx, builder)?);
        }
        val = broadcast(val, &shape, ctx, builder)?;
    }
    let pointee = ptr_ty.scalar_ty().pointee().unwrap().clone();
    let pointee = ctx.scalar(pointee);
    let val = cast(val, pointee, ctx, builder)?;
    let mask = match mask {
        Some(m) => m,
        None => {
            let t = builder.get_int1(true);
            let mut m = ctx.create_value(t, builder);
            if let Some(shape) = ptr_ty.block_shape().map(<[u32]>::to_vec) {
                let splat = builder.create_splat(m.ir, &shape);
                m = ctx.create_value(splat, builder);
            }
            m
        }
    };
    Ok((ptr, val, mask))
}

pub fn atomic_max(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (ptr, val, mask) = atom_red_typechecking(ptr, val, mask, ctx, builder)?;
    let sca = ctx.ty(val.ty).scalar_ty().clone();
    // direct atomic max for integers
    if sca.is_integer() {
        let op = if sca.is_signed_integer() {
            RmwOp::Max
        } else {
            RmwOp::UMax
        };
        let ret = builder.create_atomic_rmw(op, ptr.ir, val.ir, mask.ir);
        return Ok(ctx.create_value_with_type(ret, val.ty));
    }
    // floats emulate via integer atomics on the bit-reinterpreted pointer:
    //   atomic_smax(i_ptr, i_val) for non-negative lanes
    //   atomic_umin(i_ptr, i_val) for negative lanes
    let int32 = ctx.scalar(ScalarTy::Int32);
    let i_val = bitcast(val, int32, ctx, builder)?;
    let ptr_int32 = ctx.pointer_to(int32, 1)?;
    let i_ptr = bitcast(ptr, ptr_int32, ctx, builder)?;
    let zero = builder.get_null_value(&sca.to_ir());
    let zero_ty = ctx.scalar(sca);
    let zero = ctx.create_value_with_type(zero, zero_ty);
    let pos = greater_equal(val, zero, ctx, builder)?;
    let neg = less_than(val, zero, ctx, builder)?;
    let pos_mask = and_(mask, pos, ctx, builder)?;
    let neg_mask = and_(mask, neg, ctx, builder)?;
    let pos_ret = builder.create_atomic_rmw(RmwOp::Max, i_ptr.ir, i_val.ir, pos_mask.ir);
    let pos_ret = ctx.create_value(pos_ret, builder);
    let neg_ret = builder.create_atomic_rmw(RmwOp::UMin, i_ptr.ir, i_val.ir, neg_mask.ir);
    let neg_ret = ctx.create_value(neg_ret, builder);
    where_(pos, pos_ret, neg_ret, ctx, builder)
}

pub fn atomic_min(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (ptr, val, mask) = atom_red_typechecking(ptr, val, mask, ctx, builder)?;
    let sca = ctx.ty(val.ty).scalar_ty().clone();
    // direct atomic min for integers
    if sca.is_integer() {
        let op = if sca.is_signed_integer() {
            RmwOp::Min
        } else {
            RmwOp::UMin
        };
        let ret = builder.create_atomic_rmw(op, ptr.ir, val.ir, mask.ir);
        return Ok(ctx.create_value_with_type(ret, val.ty));
    }
    // mirror of atomic_max: smin for non-negative lanes, umax for negative
    let int32 = ctx.scalar(ScalarTy::Int32);
    let i_val = bitcast(val, int32, ctx, builder)?;
    let ptr_int32 = ctx.pointer_to(int32, 1)?;
    let i_ptr = bitcast(ptr, ptr_int32, ctx, builder)?;
    let zero = builder.get_null_value(&sca.to_ir());
    let zero_ty = ctx.scalar(sca);
    let zero = ctx.create_value_with_type(zero, zero_ty);
    let pos = greater_equal(val, zero, ctx, builder)?;
    let neg = less_than(val, zero, ctx, builder)?;
    let pos_mask = and_(mask, pos, ctx, builder)?;
    let neg_mask = and_(mask, neg, ctx, builder)?;
    let pos_ret = builder.create_atomic_rmw(RmwOp::Min, i_ptr.ir, i_val.ir, pos_mask.ir);
    let pos_ret = ctx.create_value(pos_ret, builder);
    let neg_ret = builder.create_atomic_rmw(RmwOp::UMax, i_ptr.ir, i_val.ir, neg_mask.ir);
    let neg_ret = ctx.create_value(neg_ret, builder);
    where_(pos, pos_ret, neg_ret, ctx, builder)
}

fn atomic_rmw_common(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    op: RmwOp,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (ptr, val, mask) = atom_red_typechecking(ptr, val, mask, ctx, builder)?;
    let ret = builder.create_atomic_rmw(op, ptr.ir, val.ir, mask.ir);
    Ok(ctx.create_value_with_type(ret, val.ty))
}

pub fn atomic_add(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    let (ptr, val, mask) = atom_red_typechecking(ptr, val, mask, ctx, builder)?;
    let op = if ctx.ty(val.ty).scalar_ty().is_floating() {
        RmwOp::FAdd
    } else {
        RmwOp::Add
    };
    let ret = builder.create_atomic_rmw(op, ptr.ir, val.ir, mask.ir);
    Ok(ctx.create_value_with_type(ret, val.ty))
}

pub fn atomic_and(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    atomic_rmw_common(ptr, val, mask, RmwOp::And, ctx, builder)
}

pub fn atomic_or(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    atomic_rmw_common(ptr, val, mask, RmwOp::Or, ctx, builder)
}

pub fn atomic_xor(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    atomic_rmw_common(ptr, val, mask, RmwOp::Xor, ctx, builder)
}

pub fn atomic_xchg(
    ptr: AstValue,
    val: AstValue,
    mask: Option<AstValue>,
    ctx: &mut AstContext,
    builder: &mut IrBuilder,
) -> Result<AstValue, SemanticError> {
    atomic_rmw_common(ptr, val, mask, RmwOp::Xchg, ctx, builder)
}
