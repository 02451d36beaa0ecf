use crate::ir::block::BlockId;
use crate::ir::function::{IrFunction, Param};
use crate::ir::instr::{
    BinOp, CacheModifier, CastOp, FcmpPred, IcmpPred, IrInstr, MathOp, RmwOp,
};
use crate::ir::types::IrType;
use crate::ir::value::{ValueDef, ValueId};

/// Builds one `IrFunction`, one instruction at a time.
///
/// The builder owns the function under construction and an insertion point
/// (the current block). Every `create_*` method allocates a fresh result
/// value, records its type, and appends the instruction at the insertion
/// point. Result types are derived from operand types; the builder performs
/// no semantic checking; that is the dispatcher's job.
///
/// Call order:
/// 1. `create_block()`: allocate one or more blocks
/// 2. `set_insertion_point()`: point the cursor at a block
/// 3. `create_*()`: emit instructions
/// 4. `build()`: consume the builder and return the completed function
pub struct IrBuilder {
    func: IrFunction,
    block: Option<BlockId>,
}

impl IrBuilder {
    pub fn new(name: impl Into<String>, params: Vec<Param>, return_ty: IrType) -> Self {
        Self {
            func: IrFunction::new(name, params, return_ty),
            block: None,
        }
    }

    /// Creates a new block and returns its `BlockId`.
    pub fn create_block(&mut self, name: Option<&str>) -> BlockId {
        self.func.add_block(name.map(str::to_owned))
    }

    /// Returns the current insertion block, if one is set.
    pub fn insertion_point(&self) -> Option<BlockId> {
        self.block
    }

    pub fn set_insertion_point(&mut self, block: BlockId) {
        self.block = Some(block);
    }

    /// The `ValueId` of the i-th formal parameter.
    pub fn arg(&self, index: usize) -> ValueId {
        self.func.arg(index)
    }

    /// Returns the IR type of `v`.
    ///
    /// Panics if `v` was not minted by this function.
    pub fn value_type(&self, v: ValueId) -> &IrType {
        self.func
            .value_type(v)
            .expect("IrBuilder: value has no recorded type")
    }

    /// Read-only view of the function under construction.
    pub fn func(&self) -> &IrFunction {
        &self.func
    }

    /// Consumes the builder and returns the completed function.
    ///
    /// Panics in debug builds if any block lacks a terminator.
    pub fn build(self) -> IrFunction {
        #[cfg(debug_assertions)]
        for block in &self.func.blocks {
            assert!(
                block.is_sealed(),
                "build() called with unsealed block {} ({:?})",
                block.id,
                block.name
            );
        }
        self.func
    }

    fn push(&mut self, ty: IrType, make: impl FnOnce(ValueId) -> IrInstr) -> ValueId {
        let block = self
            .block
            .expect("IrBuilder: no insertion point set before emitting");
        let result = self.func.fresh_value();
        self.func.value_defs.insert(result, ValueDef::Instr);
        self.func.value_types.insert(result, ty);
        self.func.blocks[block.0 as usize].instrs.push(make(result));
        result
    }

    fn push_terminator(&mut self, instr: IrInstr) {
        let block = self
            .block
            .expect("IrBuilder: no insertion point set before emitting");
        self.func.blocks[block.0 as usize].instrs.push(instr);
    }

    // ---- Arithmetic and bitwise ----

    fn binary(&mut self, op: BinOp, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs).clone();
        self.push(ty, |result| IrInstr::Binary {
            result,
            op,
            lhs,
            rhs,
        })
    }

    pub fn create_fadd(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::FAdd, lhs, rhs)
    }

    pub fn create_fsub(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::FSub, lhs, rhs)
    }

    pub fn create_fmul(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::FMul, lhs, rhs)
    }

    pub fn create_fdiv(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::FDiv, lhs, rhs)
    }

    pub fn create_frem(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::FRem, lhs, rhs)
    }

    pub fn create_add(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Add, lhs, rhs)
    }

    pub fn create_sub(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Sub, lhs, rhs)
    }

    pub fn create_mul(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Mul, lhs, rhs)
    }

    pub fn create_sdiv(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::SDiv, lhs, rhs)
    }

    pub fn create_udiv(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::UDiv, lhs, rhs)
    }

    pub fn create_srem(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::SRem, lhs, rhs)
    }

    pub fn create_urem(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::URem, lhs, rhs)
    }

    pub fn create_and(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::And, lhs, rhs)
    }

    pub fn create_or(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Or, lhs, rhs)
    }

    pub fn create_xor(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Xor, lhs, rhs)
    }

    pub fn create_shl(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::Shl, lhs, rhs)
    }

    pub fn create_lshr(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        self.binary(BinOp::LShr, lhs, rhs)
    }

    // ---- Comparisons ----

    pub fn create_icmp(&mut self, pred: IcmpPred, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs).elementwise(IrType::Int(1));
        self.push(ty, |result| IrInstr::Icmp {
            result,
            pred,
            lhs,
            rhs,
        })
    }

    pub fn create_fcmp(&mut self, pred: FcmpPred, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs).elementwise(IrType::Int(1));
        self.push(ty, |result| IrInstr::Fcmp {
            result,
            pred,
            lhs,
            rhs,
        })
    }

    // ---- Casts ----

    fn cast(&mut self, op: CastOp, operand: ValueId, ty: IrType) -> ValueId {
        self.push(ty.clone(), |result| IrInstr::Cast {
            result,
            op,
            operand,
            ty,
        })
    }

    pub fn create_fp_trunc(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::FpTrunc, v, ty)
    }

    pub fn create_fp_ext(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::FpExt, v, ty)
    }

    pub fn create_fp_to_ui(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::FpToUi, v, ty)
    }

    pub fn create_fp_to_si(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::FpToSi, v, ty)
    }

    pub fn create_ui_to_fp(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::UiToFp, v, ty)
    }

    pub fn create_si_to_fp(&mut self, v: ValueId, ty: IrType) -> ValueId {
        self.cast(CastOp::SiToFp, v, ty)
    }

    pub fn create_int_cast(&mut self, v: ValueId, ty: IrType, sign_extend: bool) -> ValueId {
        self.cast(CastOp::IntCast { sign_extend }, v, ty)
    }

    /// Generic cast for `BitCast`, `PtrToInt`, and `IntToPtr`.
    pub fn create_cast(&mut self, op: CastOp, v: ValueId, ty: IrType) -> ValueId {
        self.cast(op, v, ty)
    }

    // ---- Memory ----

    pub fn create_gep(&mut self, ptr: ValueId, offset: ValueId) -> ValueId {
        let ty = self.value_type(ptr).clone();
        self.push(ty, |result| IrInstr::Gep {
            result,
            ptr,
            offset,
        })
    }

    fn load_result_ty(&self, ptr: ValueId) -> IrType {
        let ptr_ty = self.value_type(ptr);
        let elem = ptr_ty
            .pointee()
            .expect("IrBuilder: load from a non-pointer value")
            .clone();
        ptr_ty.elementwise(elem)
    }

    pub fn create_load(
        &mut self,
        ptr: ValueId,
        cache: CacheModifier,
        is_volatile: bool,
    ) -> ValueId {
        let ty = self.load_result_ty(ptr);
        self.push(ty, |result| IrInstr::Load {
            result,
            ptr,
            cache,
            is_volatile,
        })
    }

    pub fn create_masked_load(
        &mut self,
        ptr: ValueId,
        mask: ValueId,
        other: ValueId,
        cache: CacheModifier,
        is_volatile: bool,
    ) -> ValueId {
        let ty = self.load_result_ty(ptr);
        self.push(ty, |result| IrInstr::MaskedLoad {
            result,
            ptr,
            mask,
            other,
            cache,
            is_volatile,
        })
    }

    pub fn create_store(&mut self, ptr: ValueId, val: ValueId) -> ValueId {
        self.push(IrType::Void, |result| IrInstr::Store { result, ptr, val })
    }

    pub fn create_masked_store(&mut self, ptr: ValueId, val: ValueId, mask: ValueId) -> ValueId {
        self.push(IrType::Void, |result| IrInstr::MaskedStore {
            result,
            ptr,
            val,
            mask,
        })
    }

    pub fn create_atomic_cas(&mut self, ptr: ValueId, cmp: ValueId, val: ValueId) -> ValueId {
        let ty = self.value_type(val).clone();
        self.push(ty, |result| IrInstr::AtomicCas {
            result,
            ptr,
            cmp,
            val,
        })
    }

    pub fn create_atomic_rmw(
        &mut self,
        op: RmwOp,
        ptr: ValueId,
        val: ValueId,
        mask: ValueId,
    ) -> ValueId {
        let ty = self.value_type(val).clone();
        self.push(ty, |result| IrInstr::AtomicRmw {
            result,
            op,
            ptr,
            val,
            mask,
        })
    }

    // ---- Shape ----

    pub fn create_splat(&mut self, v: ValueId, shape: &[u32]) -> ValueId {
        let ty = IrType::Block {
            elem: Box::new(self.value_type(v).clone()),
            shape: shape.to_vec(),
        };
        self.push(ty.clone(), |result| IrInstr::Splat {
            result,
            operand: v,
            ty,
        })
    }

    pub fn create_broadcast(&mut self, v: ValueId, shape: &[u32]) -> ValueId {
        let ty = IrType::Block {
            elem: Box::new(self.value_type(v).scalar().clone()),
            shape: shape.to_vec(),
        };
        self.push(ty.clone(), |result| IrInstr::Broadcast {
            result,
            operand: v,
            ty,
        })
    }

    pub fn create_reshape(&mut self, v: ValueId, shape: &[u32]) -> ValueId {
        let ty = IrType::Block {
            elem: Box::new(self.value_type(v).scalar().clone()),
            shape: shape.to_vec(),
        };
        self.push(ty.clone(), |result| IrInstr::Reshape {
            result,
            operand: v,
            ty,
        })
    }

    pub fn create_cat(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        let mut shape = self
            .value_type(lhs)
            .shape()
            .expect("IrBuilder: cat of a non-block value")
            .to_vec();
        shape[0] += self
            .value_type(rhs)
            .shape()
            .expect("IrBuilder: cat of a non-block value")[0];
        let ty = IrType::Block {
            elem: Box::new(self.value_type(lhs).scalar().clone()),
            shape,
        };
        self.push(ty, |result| IrInstr::Cat { result, lhs, rhs })
    }

    /// Emits the i32 sequence `[start, end)` as a one-dimensional block.
    pub fn get_range(&mut self, start: i32, end: i32) -> ValueId {
        let ty = IrType::Block {
            elem: Box::new(IrType::Int(32)),
            shape: vec![(end - start) as u32],
        };
        self.push(ty, |result| IrInstr::Range { result, start, end })
    }

    pub fn create_dot(
        &mut self,
        lhs: ValueId,
        rhs: ValueId,
        acc: ValueId,
        allow_tf32: bool,
    ) -> ValueId {
        let ty = self.value_type(acc).clone();
        self.push(ty, |result| IrInstr::Dot {
            result,
            lhs,
            rhs,
            acc,
            allow_tf32,
        })
    }

    pub fn create_reduce(
        &mut self,
        v: ValueId,
        op: crate::ir::instr::ReduceOp,
        axis: u32,
    ) -> ValueId {
        let src = self.value_type(v);
        let elem = src.scalar().clone();
        let mut shape = src
            .shape()
            .expect("IrBuilder: reduce of a non-block value")
            .to_vec();
        shape.remove(axis as usize);
        let ty = if shape.is_empty() {
            elem
        } else {
            IrType::Block {
                elem: Box::new(elem),
                shape,
            }
        };
        self.push(ty, |result| IrInstr::Reduce {
            result,
            op,
            operand: v,
            axis,
        })
    }

    // ---- Math ----

    fn math(&mut self, op: MathOp, operand: ValueId) -> ValueId {
        let ty = self.value_type(operand).clone();
        self.push(ty, |result| IrInstr::MathUnary {
            result,
            op,
            operand,
        })
    }

    pub fn create_exp(&mut self, v: ValueId) -> ValueId {
        self.math(MathOp::Exp, v)
    }

    pub fn create_log(&mut self, v: ValueId) -> ValueId {
        self.math(MathOp::Log, v)
    }

    pub fn create_cos(&mut self, v: ValueId) -> ValueId {
        self.math(MathOp::Cos, v)
    }

    pub fn create_sin(&mut self, v: ValueId) -> ValueId {
        self.math(MathOp::Sin, v)
    }

    pub fn create_sqrt(&mut self, v: ValueId) -> ValueId {
        self.math(MathOp::Sqrt, v)
    }

    pub fn create_umulhi(&mut self, lhs: ValueId, rhs: ValueId) -> ValueId {
        let ty = self.value_type(lhs).clone();
        self.push(ty, |result| IrInstr::UMulHi { result, lhs, rhs })
    }

    // ---- Control ----

    pub fn create_select(&mut self, cond: ValueId, then_val: ValueId, else_val: ValueId) -> ValueId {
        let ty = self.value_type(then_val).clone();
        self.push(ty, |result| IrInstr::Select {
            result,
            cond,
            then_val,
            else_val,
        })
    }

    pub fn create_call(&mut self, callee: &str, args: Vec<ValueId>, return_ty: IrType) -> ValueId {
        let callee = callee.to_owned();
        self.push(return_ty, |result| IrInstr::Call {
            result,
            callee,
            args,
        })
    }

    /// Emits an empty phi of the given type at the insertion point.
    pub fn create_phi(&mut self, ty: IrType) -> ValueId {
        self.push(ty.clone(), |result| IrInstr::Phi {
            result,
            ty,
            incomings: Vec::new(),
        })
    }

    pub fn create_branch(&mut self, target: BlockId) {
        self.push_terminator(IrInstr::Branch { target });
    }

    pub fn create_cond_branch(&mut self, cond: ValueId, then_block: BlockId, else_block: BlockId) {
        self.push_terminator(IrInstr::CondBranch {
            cond,
            then_block,
            else_block,
        });
    }

    pub fn create_return(&mut self, value: Option<ValueId>) {
        self.push_terminator(IrInstr::Return { value });
    }

    pub fn create_barrier(&mut self) -> ValueId {
        self.push(IrType::Void, |result| IrInstr::Barrier { result })
    }

    pub fn create_get_program_id(&mut self, axis: u32) -> ValueId {
        self.push(IrType::Int(32), |result| IrInstr::GetProgramId {
            result,
            axis,
        })
    }

    pub fn create_get_num_programs(&mut self, axis: u32) -> ValueId {
        self.push(IrType::Int(32), |result| IrInstr::GetNumPrograms {
            result,
            axis,
        })
    }

    // ---- Constants ----

    fn const_int(&mut self, value: i64, ty: IrType) -> ValueId {
        self.push(ty.clone(), |result| IrInstr::ConstInt { result, value, ty })
    }

    pub fn get_int1(&mut self, value: bool) -> ValueId {
        self.const_int(value as i64, IrType::Int(1))
    }

    pub fn get_int8(&mut self, value: i8) -> ValueId {
        self.const_int(value as i64, IrType::Int(8))
    }

    pub fn get_int32(&mut self, value: i32) -> ValueId {
        self.const_int(value as i64, IrType::Int(32))
    }

    pub fn get_int64(&mut self, value: i64) -> ValueId {
        self.const_int(value, IrType::Int(64))
    }

    pub fn get_float32(&mut self, value: f32) -> ValueId {
        self.push(IrType::Fp32, |result| IrInstr::ConstFloat {
            result,
            value: value as f64,
            ty: IrType::Fp32,
        })
    }

    /// The zero value of a scalar type.
    pub fn get_null_value(&mut self, ty: &IrType) -> ValueId {
        match ty {
            IrType::Int(_) => self.const_int(0, ty.clone()),
            IrType::Fp8 | IrType::Fp16 | IrType::Bf16 | IrType::Fp32 | IrType::Fp64 => {
                let ty = ty.clone();
                self.push(ty.clone(), |result| IrInstr::ConstFloat {
                    result,
                    value: 0.0,
                    ty,
                })
            }
            other => unreachable!("null value of {}", other),
        }
    }

    /// The all-ones bit pattern of an integer type.
    pub fn get_all_ones_value(&mut self, ty: &IrType) -> ValueId {
        match ty {
            IrType::Int(w) => {
                let value = if *w >= 64 {
                    -1
                } else {
                    ((1u64 << w) - 1) as i64
                };
                self.const_int(value, ty.clone())
            }
            other => unreachable!("all-ones value of {}", other),
        }
    }

    pub fn get_undef(&mut self, ty: &IrType) -> ValueId {
        let ty = ty.clone();
        self.push(ty.clone(), |result| IrInstr::Undef { result, ty })
    }

    // ---- Metadata ----

    pub fn set_multiple_of(&mut self, v: ValueId, value: u32) {
        self.func.metadata_mut(v).multiple_of = Some(value);
    }

    pub fn set_max_contiguous(&mut self, v: ValueId, value: u32) {
        self.func.metadata_mut(v).max_contiguous = Some(value);
    }

    pub fn set_fdiv_ieee_rounding(&mut self, v: ValueId, flag: bool) {
        self.func.metadata_mut(v).fdiv_ieee_rounding = Some(flag);
    }
}
