//! Conversions: the cast action table and bitcast.

use trellis::ast::{AstContext, AstValue, ScalarTy, TypeId};
use trellis::error::SemanticError;
use trellis::ir::{CastOp, IcmpPred, IrBuilder, IrInstr, IrType, Param};
use trellis::semantic::{bitcast, cast};

fn kernel(ctx: &mut AstContext, tys: &[TypeId]) -> (IrBuilder, Vec<AstValue>) {
    let params = tys
        .iter()
        .enumerate()
        .map(|(i, &t)| Param {
            name: format!("a{}", i),
            ty: ctx.ty(t).to_ir(),
        })
        .collect();
    let mut b = IrBuilder::new("kern", params, IrType::Void);
    let entry = b.create_block(Some("entry"));
    b.set_insertion_point(entry);
    let vals = tys
        .iter()
        .enumerate()
        .map(|(i, &t)| ctx.create_value_with_type(b.arg(i), t))
        .collect();
    (b, vals)
}

fn last_cast_op(b: &IrBuilder) -> CastOp {
    match b.func().entry_block().instrs.last() {
        Some(IrInstr::Cast { op, .. }) => *op,
        other => panic!("expected a cast, got {:?}", other),
    }
}

#[test]
fn test_identity_cast_returns_input() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);

    let out = cast(vals[0], f32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(out, vals[0]);
    assert!(b.func().entry_block().instrs.is_empty());
}

#[test]
fn test_float_mantissa_orders_trunc_and_ext() {
    let mut ctx = AstContext::new();
    let f16 = ctx.scalar(ScalarTy::Fp16);
    let f64_ty = ctx.scalar(ScalarTy::Fp64);

    let (mut b, vals) = kernel(&mut ctx, &[f64_ty]);
    let out = cast(vals[0], f16, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::FpTrunc);
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Fp16);

    let (mut b, vals) = kernel(&mut ctx, &[f16]);
    cast(vals[0], f64_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::FpExt);

    // bf16 has a narrower mantissa than fp16 despite the equal bit width
    let bf16 = ctx.scalar(ScalarTy::Bf16);
    let (mut b, vals) = kernel(&mut ctx, &[f16]);
    cast(vals[0], bf16, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::FpTrunc);
}

#[test]
fn test_int_widening_sign_extends_signed_only() {
    let mut ctx = AstContext::new();
    let i8_ty = ctx.scalar(ScalarTy::Int8);
    let u8_ty = ctx.scalar(ScalarTy::UInt8);
    let i64_ty = ctx.scalar(ScalarTy::Int64);

    let (mut b, vals) = kernel(&mut ctx, &[i8_ty]);
    cast(vals[0], i64_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::IntCast { sign_extend: true });

    let (mut b, vals) = kernel(&mut ctx, &[u8_ty]);
    cast(vals[0], i64_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::IntCast { sign_extend: false });
}

#[test]
fn test_bool_never_sign_extends() {
    let mut ctx = AstContext::new();
    let bool_ty = ctx.scalar(ScalarTy::Int1);
    let i32_ty = ctx.scalar(ScalarTy::Int32);

    let (mut b, vals) = kernel(&mut ctx, &[bool_ty]);
    cast(vals[0], i32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::IntCast { sign_extend: false });
}

#[test]
fn test_signedness_change_at_same_width_emits_a_cast() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);

    let (mut b, vals) = kernel(&mut ctx, &[i32_ty]);
    let out = cast(vals[0], u32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::IntCast { sign_extend: true });
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::UInt32);
}

#[test]
fn test_int_round_trip_is_sign_preserving() {
    // widen-then-narrow keeps the extension matched to the source sign
    let mut ctx = AstContext::new();
    let i16_ty = ctx.scalar(ScalarTy::Int16);
    let i64_ty = ctx.scalar(ScalarTy::Int64);
    let (mut b, vals) = kernel(&mut ctx, &[i16_ty]);

    let wide = cast(vals[0], i64_ty, &mut ctx, &mut b).unwrap();
    let narrow = cast(wide, i16_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(narrow.ty, vals[0].ty);
    let instrs = &b.func().entry_block().instrs;
    assert!(matches!(
        instrs[0],
        IrInstr::Cast {
            op: CastOp::IntCast { sign_extend: true },
            ty: IrType::Int(64),
            ..
        }
    ));
    assert!(matches!(
        instrs[1],
        IrInstr::Cast {
            op: CastOp::IntCast { sign_extend: true },
            ty: IrType::Int(16),
            ..
        }
    ));
}

#[test]
fn test_float_int_conversions() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let bool_ty = ctx.scalar(ScalarTy::Int1);

    // float -> signed int
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);
    cast(vals[0], i32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::FpToSi);

    // float -> bool converts unsigned
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);
    cast(vals[0], bool_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::FpToUi);

    // signed int -> float
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty]);
    cast(vals[0], f32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::SiToFp);

    // unsigned int -> float
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty]);
    cast(vals[0], f32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::UiToFp);

    // bool -> float converts unsigned
    let (mut b, vals) = kernel(&mut ctx, &[bool_ty]);
    cast(vals[0], f32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::UiToFp);
}

fn f32_ptr(ctx: &mut AstContext) -> TypeId {
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    ctx.pointer_to(f32_ty, 1).unwrap()
}

#[test]
fn test_ptr_to_int64_and_back() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i64_ty = ctx.scalar(ScalarTy::Int64);

    let (mut b, vals) = kernel(&mut ctx, &[ptr]);
    let as_int = cast(vals[0], i64_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::PtrToInt);
    assert_eq!(ctx.ty(as_int.ty).scalar_ty(), &ScalarTy::Int64);

    let back = cast(as_int, ptr, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::IntToPtr);
    assert_eq!(back.ty, ptr);
}

#[test]
fn test_ptr_to_bool_compares_against_zero() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let bool_ty = ctx.scalar(ScalarTy::Int1);
    let (mut b, vals) = kernel(&mut ctx, &[ptr]);

    let out = cast(vals[0], bool_ty, &mut ctx, &mut b).unwrap();
    assert!(ctx.ty(out.ty).is_bool());
    let instrs = &b.func().entry_block().instrs;
    assert!(matches!(
        instrs[0],
        IrInstr::Cast {
            op: CastOp::PtrToInt,
            ..
        }
    ));
    assert!(matches!(instrs[1], IrInstr::ConstInt { value: 0, .. }));
    assert!(matches!(
        instrs[2],
        IrInstr::Icmp {
            pred: IcmpPred::Ne,
            ..
        }
    ));
}

#[test]
fn test_ptr_to_ptr_is_a_bitcast() {
    let mut ctx = AstContext::new();
    let src = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let dst = ctx.pointer_to(i32_ty, 1).unwrap();
    let (mut b, vals) = kernel(&mut ctx, &[src]);

    let out = cast(vals[0], dst, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::BitCast);
    assert_eq!(out.ty, dst);
}

#[test]
fn test_block_cast_lifts_destination_to_source_shape() {
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Int32, &[4, 8]).unwrap();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[block]);

    let out = cast(vals[0], f32_ty, &mut ctx, &mut b).unwrap();
    let out_ty = ctx.ty(out.ty);
    assert_eq!(out_ty.block_shape(), Some(&[4u32, 8][..]));
    assert_eq!(out_ty.scalar_ty(), &ScalarTy::Fp32);
}

#[test]
fn test_block_cast_keeps_source_signedness() {
    // the lifted destination takes its signedness from the source, so a
    // block cast that only flips signedness degenerates to the identity
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Int32, &[8]).unwrap();
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[block]);

    let out = cast(vals[0], u32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(out, vals[0]);
    assert!(b.func().entry_block().instrs.is_empty());
}

#[test]
fn test_int_to_bool_truncates_rather_than_comparing() {
    // an integer narrowed to bool goes through the int-cast path, so it
    // keeps the low bit instead of comparing against zero
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Int32, &[8]).unwrap();
    let bool_ty = ctx.scalar(ScalarTy::Int1);
    let (mut b, vals) = kernel(&mut ctx, &[block]);

    let out = cast(vals[0], bool_ty, &mut ctx, &mut b).unwrap();
    let out_ty = ctx.ty(out.ty);
    assert!(out_ty.scalar_ty().is_bool());
    assert_eq!(out_ty.block_shape(), Some(&[8u32][..]));
    assert_eq!(last_cast_op(&b), CastOp::IntCast { sign_extend: true });
}

#[test]
fn test_bitcast_same_size_reinterprets() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);

    let out = bitcast(vals[0], i32_ty, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::BitCast);
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Int32);
}

#[test]
fn test_bitcast_size_mismatch_rejected() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let i64_ty = ctx.scalar(ScalarTy::Int64);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);

    let err = bitcast(vals[0], i64_ty, &mut ctx, &mut b).unwrap_err();
    assert!(matches!(
        err,
        SemanticError::BitcastSizeMismatch {
            src_bits: 32,
            dst_bits: 64
        }
    ));
}

#[test]
fn test_bitcast_with_pointer_falls_back_to_cast() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let dst = ctx.pointer_to(i32_ty, 1).unwrap();
    let (mut b, vals) = kernel(&mut ctx, &[ptr]);

    let out = bitcast(vals[0], dst, &mut ctx, &mut b).unwrap();
    assert_eq!(last_cast_op(&b), CastOp::BitCast);
    assert_eq!(out.ty, dst);
}
