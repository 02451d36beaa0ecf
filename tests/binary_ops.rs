//! Binary operator dispatch: promotion, pointer arithmetic, signedness.

use trellis::ast::{AstContext, AstValue, ScalarTy, TypeId};
use trellis::error::SemanticError;
use trellis::ir::{BinOp, CastOp, IrInstr, IrBuilder, IrType, Param};
use trellis::semantic;

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

fn entry_instrs(b: &IrBuilder) -> &[IrInstr] {
    &b.func().entry_block().instrs
}

#[test]
fn test_add_widens_to_int64() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let i64_ty = ctx.scalar(ScalarTy::Int64);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i64_ty]);

    let out = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Int64);

    // the narrow side is sign-extended, then a single i64 add is emitted
    let instrs = entry_instrs(&b);
    assert!(matches!(
        instrs[0],
        IrInstr::Cast {
            op: CastOp::IntCast { sign_extend: true },
            ty: IrType::Int(64),
            ..
        }
    ));
    match &instrs[1] {
        IrInstr::Binary { op, lhs, rhs, .. } => {
            assert_eq!(*op, BinOp::Add);
            assert_eq!(b.value_type(*lhs), &IrType::Int(64));
            assert_eq!(b.value_type(*rhs), &IrType::Int(64));
        }
        other => panic!("expected add, got {:?}", other),
    }
}

#[test]
fn test_promotion_is_idempotent() {
    // op(a, a) never changes the operand type, except fp16 divide
    let kinds = [
        ScalarTy::Fp16,
        ScalarTy::Fp32,
        ScalarTy::Fp64,
        ScalarTy::Int8,
        ScalarTy::Int32,
        ScalarTy::Int64,
        ScalarTy::UInt8,
        ScalarTy::UInt32,
        ScalarTy::UInt64,
    ];
    for kind in kinds {
        let mut ctx = AstContext::new();
        let ty = ctx.scalar(kind.clone());
        let (mut b, vals) = kernel(&mut ctx, &[ty, ty]);
        let out = semantic::mul(vals[0], vals[1], &mut ctx, &mut b).unwrap();
        assert_eq!(ctx.ty(out.ty).scalar_ty(), &kind, "mul({0}, {0})", kind);
    }
}

#[test]
fn test_fp16_divide_promotes_to_fp32() {
    let mut ctx = AstContext::new();
    let f16 = ctx.scalar(ScalarTy::Fp16);
    let (mut b, vals) = kernel(&mut ctx, &[f16, f16]);

    let out = semantic::truediv(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Fp32);
}

#[test]
fn test_unsigned_wins_at_equal_width() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, u32_ty]);

    let out = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::UInt32);
}

#[test]
fn test_wider_signed_beats_narrow_unsigned() {
    let mut ctx = AstContext::new();
    let i64_ty = ctx.scalar(ScalarTy::Int64);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, i64_ty]);

    let out = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Int64);
}

#[test]
fn test_int_divide_goes_through_fp32() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i32_ty]);

    let out = semantic::truediv(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Fp32);

    let instrs = entry_instrs(&b);
    assert!(matches!(
        instrs[0],
        IrInstr::Cast {
            op: CastOp::SiToFp,
            ..
        }
    ));
    assert!(matches!(
        instrs[1],
        IrInstr::Cast {
            op: CastOp::SiToFp,
            ..
        }
    ));
    assert!(matches!(
        instrs[2],
        IrInstr::Binary {
            op: BinOp::FDiv,
            ..
        }
    ));
}

#[test]
fn test_divide_mixed_signedness_rejected() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, i32_ty]);

    let err = semantic::truediv(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(err.to_string().contains("signedness"), "got: {}", err);
}

#[test]
fn test_mod_mixed_signedness_rejected() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, i32_ty]);

    let err = semantic::mod_(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(
        matches!(err, SemanticError::DivMixedSignedness { .. }),
        "got: {:?}",
        err
    );
    assert!(err.to_string().contains("signedness"));
}

#[test]
fn test_floordiv_picks_divide_by_signedness() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);

    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i32_ty]);
    semantic::floordiv(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::SDiv,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, u32_ty]);
    semantic::floordiv(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::UDiv,
            ..
        })
    ));
}

#[test]
fn test_mod_picks_remainder_by_category() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let i32_ty = ctx.scalar(ScalarTy::Int32);

    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, f32_ty]);
    semantic::mod_(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::FRem,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i32_ty]);
    semantic::mod_(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::SRem,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, u32_ty]);
    semantic::mod_(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::URem,
            ..
        })
    ));
}

#[test]
fn test_fdiv_requires_floats_and_records_rounding() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let i32_ty = ctx.scalar(ScalarTy::Int32);

    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, f32_ty]);
    let out = semantic::fdiv(vals[0], vals[1], true, &mut ctx, &mut b).unwrap();
    let md = b.func().metadata(out.ir).expect("fdiv metadata");
    assert_eq!(md.fdiv_ieee_rounding, Some(true));

    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, i32_ty]);
    let err = semantic::fdiv(vals[0], vals[1], false, &mut ctx, &mut b).unwrap_err();
    assert!(matches!(err, SemanticError::FdivOperandsNotFloat));
}

// ---------------------------------------------------------------------------
// Pointer arithmetic
// ---------------------------------------------------------------------------

fn f32_ptr(ctx: &mut AstContext) -> TypeId {
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    ctx.pointer_to(f32_ty, 1).unwrap()
}

#[test]
fn test_ptr_plus_offset_is_gep() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[ptr, i32_ty]);

    let out = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(ctx.ty(out.ty).scalar_ty().is_pointer());
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Gep { .. })
    ));
}

#[test]
fn test_offset_plus_ptr_emits_the_same_ir() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);

    let (mut b1, vals) = kernel(&mut ctx, &[ptr, i32_ty]);
    let fwd = semantic::add(vals[0], vals[1], &mut ctx, &mut b1).unwrap();

    let (mut b2, vals) = kernel(&mut ctx, &[i32_ty, ptr]);
    let rev = semantic::add(vals[0], vals[1], &mut ctx, &mut b2).unwrap();

    // same instruction, pointer first, either way
    match (entry_instrs(&b1).last(), entry_instrs(&b2).last()) {
        (Some(IrInstr::Gep { ptr: p1, .. }), Some(IrInstr::Gep { ptr: p2, .. })) => {
            assert_eq!(b1.value_type(*p1), b2.value_type(*p2));
        }
        other => panic!("expected geps, got {:?}", other),
    }
    assert_eq!(fwd.ty, rev.ty, "frontend type is the pointer's either way");
}

#[test]
fn test_ptr_minus_offset_negates() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[ptr, i32_ty]);

    let out = semantic::sub(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(ctx.ty(out.ty).scalar_ty().is_pointer());
    // 0 - offset, then gep
    let instrs = entry_instrs(&b);
    assert!(matches!(instrs[0], IrInstr::ConstInt { value: 0, .. }));
    assert!(matches!(
        instrs[1],
        IrInstr::Binary {
            op: BinOp::Sub,
            ..
        }
    ));
    assert!(matches!(instrs[2], IrInstr::Gep { .. }));
}

#[test]
fn test_offset_minus_ptr_rejected() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, ptr]);

    let err = semantic::sub(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(err, SemanticError::IncompatibleTypes { .. }));
}

#[test]
fn test_ptr_plus_ptr_rejected() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let (mut b, vals) = kernel(&mut ctx, &[ptr, ptr]);

    let err = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(err, SemanticError::IncompatibleTypes { .. }));
}

#[test]
fn test_ptr_plus_float_rejected() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[ptr, f32_ty]);

    let err = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(err, SemanticError::IncompatibleTypes { .. }));
}

// ---------------------------------------------------------------------------
// Bitwise
// ---------------------------------------------------------------------------

#[test]
fn test_bitwise_promotes_without_arithmetic_cast() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let i64_ty = ctx.scalar(ScalarTy::Int64);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i64_ty]);

    let out = semantic::and_(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Int64);
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Binary {
            op: BinOp::And,
            ..
        })
    ));
}

#[test]
fn test_bitwise_rejects_floats() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, i32_ty]);

    let err = semantic::xor_(vals[0], vals[1], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(err, SemanticError::IncompatibleTypes { .. }));
}

#[test]
fn test_shifts_emit_shl_and_lshr() {
    let mut ctx = AstContext::new();
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, u32_ty]);
    semantic::shl(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    semantic::lshr(vals[0], vals[1], &mut ctx, &mut b).unwrap();

    let instrs = entry_instrs(&b);
    assert!(matches!(
        instrs[0],
        IrInstr::Binary { op: BinOp::Shl, .. }
    ));
    assert!(matches!(
        instrs[1],
        IrInstr::Binary {
            op: BinOp::LShr,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Operand order and block ops
// ---------------------------------------------------------------------------

#[test]
fn test_operand_order_is_input_then_other() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i32_ty]);

    semantic::sub(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    match entry_instrs(&b).last() {
        Some(IrInstr::Binary { lhs, rhs, .. }) => {
            assert_eq!(*lhs, vals[0].ir);
            assert_eq!(*rhs, vals[1].ir);
        }
        other => panic!("expected sub, got {:?}", other),
    }
}

#[test]
fn test_block_scalar_add_broadcasts_then_adds() {
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Fp32, &[4, 8]).unwrap();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[block, f32_ty]);

    let out = semantic::add(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).block_shape(), Some(&[4u32, 8][..]));
    let instrs = entry_instrs(&b);
    assert!(matches!(instrs[0], IrInstr::Splat { .. }));
    assert!(matches!(
        instrs[1],
        IrInstr::Binary {
            op: BinOp::FAdd,
            ..
        }
    ));
}

// ---------------------------------------------------------------------------
// Unary
// ---------------------------------------------------------------------------

#[test]
fn test_plus_is_identity() {
    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let (mut b, vals) = kernel(&mut ctx, &[i32_ty]);

    let out = semantic::plus(vals[0], &mut ctx, &mut b).unwrap();
    assert_eq!(out, vals[0]);
    assert!(entry_instrs(&b).is_empty());
}

#[test]
fn test_minus_subtracts_from_zero() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);

    let out = semantic::minus(vals[0], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::Fp32);
    let instrs = entry_instrs(&b);
    assert!(matches!(instrs[0], IrInstr::ConstFloat { .. }));
    assert!(matches!(
        instrs[1],
        IrInstr::Binary {
            op: BinOp::FSub,
            ..
        }
    ));
}

#[test]
fn test_minus_rejects_pointers() {
    let mut ctx = AstContext::new();
    let ptr = f32_ptr(&mut ctx);
    let (mut b, vals) = kernel(&mut ctx, &[ptr]);
    let err = semantic::minus(vals[0], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(
        err,
        SemanticError::WrongUnaryOperand { op: "minus", .. }
    ));
}

#[test]
fn test_invert_xors_with_all_ones() {
    let mut ctx = AstContext::new();
    let u8_ty = ctx.scalar(ScalarTy::UInt8);
    let (mut b, vals) = kernel(&mut ctx, &[u8_ty]);

    let out = semantic::invert(vals[0], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::UInt8);
    let instrs = entry_instrs(&b);
    assert!(matches!(instrs[0], IrInstr::ConstInt { value: 255, .. }));
    assert!(matches!(
        instrs[1],
        IrInstr::Binary { op: BinOp::Xor, .. }
    ));
}

#[test]
fn test_invert_rejects_floats() {
    let mut ctx = AstContext::new();
    let f32_ty = ctx.scalar(ScalarTy::Fp32);
    let (mut b, vals) = kernel(&mut ctx, &[f32_ty]);
    let err = semantic::invert(vals[0], &mut ctx, &mut b).unwrap_err();
    assert!(matches!(
        err,
        SemanticError::WrongUnaryOperand { op: "invert", .. }
    ));
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

#[test]
fn test_comparisons_pick_predicates_by_signedness() {
    use trellis::ir::{FcmpPred, IcmpPred};

    let mut ctx = AstContext::new();
    let i32_ty = ctx.scalar(ScalarTy::Int32);
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let f32_ty = ctx.scalar(ScalarTy::Fp32);

    let (mut b, vals) = kernel(&mut ctx, &[i32_ty, i32_ty]);
    let out = semantic::less_than(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(ctx.ty(out.ty).is_bool());
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Icmp {
            pred: IcmpPred::Slt,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, u32_ty]);
    semantic::greater_equal(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Icmp {
            pred: IcmpPred::Uge,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, f32_ty]);
    semantic::not_equal(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Fcmp {
            pred: FcmpPred::Une,
            ..
        })
    ));

    let (mut b, vals) = kernel(&mut ctx, &[f32_ty, f32_ty]);
    semantic::equal(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::Fcmp {
            pred: FcmpPred::Oeq,
            ..
        })
    ));
}

#[test]
fn test_block_comparison_is_elementwise_bool() {
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Int32, &[16]).unwrap();
    let (mut b, vals) = kernel(&mut ctx, &[block, block]);

    let out = semantic::equal(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    let out_ty = ctx.ty(out.ty);
    assert_eq!(out_ty.block_shape(), Some(&[16u32][..]));
    assert!(out_ty.scalar_ty().is_bool());
}

// ---------------------------------------------------------------------------
// Math
// ---------------------------------------------------------------------------

#[test]
fn test_math_unaries_keep_their_type() {
    let mut ctx = AstContext::new();
    let block = ctx.block_of(ScalarTy::Fp32, &[32]).unwrap();
    let (mut b, vals) = kernel(&mut ctx, &[block]);

    type MathFn = fn(AstValue, &mut AstContext, &mut IrBuilder) -> Result<AstValue, SemanticError>;
    let fns: [MathFn; 5] = [
        semantic::exp,
        semantic::log,
        semantic::cos,
        semantic::sin,
        semantic::sqrt,
    ];
    for f in fns {
        let out = f(vals[0], &mut ctx, &mut b).unwrap();
        assert_eq!(out.ty, vals[0].ty);
    }
    assert_eq!(entry_instrs(&b).len(), 5);
}

#[test]
fn test_umulhi_promotes_like_mul() {
    let mut ctx = AstContext::new();
    let u32_ty = ctx.scalar(ScalarTy::UInt32);
    let u64_ty = ctx.scalar(ScalarTy::UInt64);
    let (mut b, vals) = kernel(&mut ctx, &[u32_ty, u64_ty]);

    let out = semantic::umulhi(vals[0], vals[1], &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(out.ty).scalar_ty(), &ScalarTy::UInt64);
    assert!(matches!(
        entry_instrs(&b).last(),
        Some(IrInstr::UMulHi { .. })
    ));
}

#[test]
fn test_program_queries_are_int32() {
    let mut ctx = AstContext::new();
    let (mut b, _) = kernel(&mut ctx, &[]);

    let pid = semantic::program_id(0, &mut ctx, &mut b).unwrap();
    let np = semantic::num_programs(1, &mut ctx, &mut b).unwrap();
    assert_eq!(ctx.ty(pid.ty).scalar_ty(), &ScalarTy::Int32);
    assert_eq!(ctx.ty(np.ty).scalar_ty(), &ScalarTy::Int32);
}
