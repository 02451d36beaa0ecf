use crate::ir::block::BlockId;
use crate::ir::types::IrType;
use crate::ir::value::ValueId;

/// Binary arithmetic and bitwise operations on scalars or blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    Add,
    Sub,
    Mul,
    SDiv,
    UDiv,
    SRem,
    URem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
}

impl std::fmt::Display for BinOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BinOp::FAdd => "fadd",
            BinOp::FSub => "fsub",
            BinOp::FMul => "fmul",
            BinOp::FDiv => "fdiv",
            BinOp::FRem => "frem",
            BinOp::Add => "add",
            BinOp::Sub => "sub",
            BinOp::Mul => "mul",
            BinOp::SDiv => "sdiv",
            BinOp::UDiv => "udiv",
            BinOp::SRem => "srem",
            BinOp::URem => "urem",
            BinOp::And => "and",
            BinOp::Or => "or",
            BinOp::Xor => "xor",
            BinOp::Shl => "shl",
            BinOp::LShr => "lshr",
        };
        f.write_str(s)
    }
}

/// Integer comparison predicates. Signed/unsigned split mirrors the
/// frontend's signedness at the point the compare is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpPred {
    Eq,
    Ne,
    Sgt,
    Sge,
    Slt,
    Sle,
    Ugt,
    Uge,
    Ult,
    Ule,
}

impl std::fmt::Display for IcmpPred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IcmpPred::Eq => "eq",
            IcmpPred::Ne => "ne",
            IcmpPred::Sgt => "sgt",
            IcmpPred::Sge => "sge",
            IcmpPred::Slt => "slt",
            IcmpPred::Sle => "sle",
            IcmpPred::Ugt => "ugt",
            IcmpPred::Uge => "uge",
            IcmpPred::Ult => "ult",
            IcmpPred::Ule => "ule",
        };
        f.write_str(s)
    }
}

/// Floating-point comparison predicates. Ordered except `Une`, which is the
/// predicate emitted for not-equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FcmpPred {
    Oeq,
    Une,
    Ogt,
    Oge,
    Olt,
    Ole,
}

impl std::fmt::Display for FcmpPred {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FcmpPred::Oeq => "oeq",
            FcmpPred::Une => "une",
            FcmpPred::Ogt => "ogt",
            FcmpPred::Oge => "oge",
            FcmpPred::Olt => "olt",
            FcmpPred::Ole => "ole",
        };
        f.write_str(s)
    }
}

/// Conversion operations between scalar kinds (applied element-wise to
/// blocks).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastOp {
    FpTrunc,
    FpExt,
    FpToUi,
    FpToSi,
    UiToFp,
    SiToFp,
    IntCast { sign_extend: bool },
    BitCast,
    PtrToInt,
    IntToPtr,
}

impl std::fmt::Display for CastOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CastOp::FpTrunc => "fptrunc",
            CastOp::FpExt => "fpext",
            CastOp::FpToUi => "fptoui",
            CastOp::FpToSi => "fptosi",
            CastOp::UiToFp => "uitofp",
            CastOp::SiToFp => "sitofp",
            CastOp::IntCast { sign_extend: true } => "sext",
            CastOp::IntCast { sign_extend: false } => "zext",
            CastOp::BitCast => "bitcast",
            CastOp::PtrToInt => "ptrtoint",
            CastOp::IntToPtr => "inttoptr",
        };
        f.write_str(s)
    }
}

/// Atomic read-modify-write operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RmwOp {
    Add,
    FAdd,
    Sub,
    And,
    Or,
    Xor,
    Max,
    Min,
    UMax,
    UMin,
    Xchg,
}

impl std::fmt::Display for RmwOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RmwOp::Add => "add",
            RmwOp::FAdd => "fadd",
            RmwOp::Sub => "sub",
            RmwOp::And => "and",
            RmwOp::Or => "or",
            RmwOp::Xor => "xor",
            RmwOp::Max => "max",
            RmwOp::Min => "min",
            RmwOp::UMax => "umax",
            RmwOp::UMin => "umin",
            RmwOp::Xchg => "xchg",
        };
        f.write_str(s)
    }
}

/// Reduction operators, paired float/int per frontend operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    FAdd,
    Add,
    FMin,
    Min,
    FMax,
    Max,
    Xor,
}

impl std::fmt::Display for ReduceOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReduceOp::FAdd => "fadd",
            ReduceOp::Add => "add",
            ReduceOp::FMin => "fmin",
            ReduceOp::Min => "min",
            ReduceOp::FMax => "fmax",
            ReduceOp::Max => "max",
            ReduceOp::Xor => "xor",
        };
        f.write_str(s)
    }
}

/// Cache hint carried by load instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheModifier {
    None,
    /// Cache at all levels (`.ca`).
    Ca,
    /// Cache at global level (`.cg`).
    Cg,
}

/// Unary math intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathOp {
    Exp,
    Log,
    Cos,
    Sin,
    Sqrt,
}

impl std::fmt::Display for MathOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MathOp::Exp => "exp",
            MathOp::Log => "log",
            MathOp::Cos => "cos",
            MathOp::Sin => "sin",
            MathOp::Sqrt => "sqrt",
        };
        f.write_str(s)
    }
}

/// A single instruction in SSA form.
///
/// Invariants:
/// - Every non-terminator produces exactly one result `ValueId` (possibly of
///   void type, e.g. stores and barriers).
/// - Terminators (`Branch`, `Return`) are the last instruction in a block.
/// - `Phi` instructions appear only at the top of a block.
#[derive(Debug, Clone)]
pub enum IrInstr {
    Binary {
        result: ValueId,
        op: BinOp,
        lhs: ValueId,
        rhs: ValueId,
    },
    Icmp {
        result: ValueId,
        pred: IcmpPred,
        lhs: ValueId,
        rhs: ValueId,
    },
    Fcmp {
        result: ValueId,
        pred: FcmpPred,
        lhs: ValueId,
        rhs: ValueId,
    },
    Cast {
        result: ValueId,
        op: CastOp,
        operand: ValueId,
        ty: IrType,
    },
    /// Pointer + integer offset. Result type equals the pointer operand's.
    Gep {
        result: ValueId,
        ptr: ValueId,
        offset: ValueId,
    },

    // ---- Memory ----
    Load {
        result: ValueId,
        ptr: ValueId,
        cache: CacheModifier,
        is_volatile: bool,
    },
    MaskedLoad {
        result: ValueId,
        ptr: ValueId,
        mask: ValueId,
        other: ValueId,
        cache: CacheModifier,
        is_volatile: bool,
    },
    Store {
        result: ValueId,
        ptr: ValueId,
        val: ValueId,
    },
    MaskedStore {
        result: ValueId,
        ptr: ValueId,
        val: ValueId,
        mask: ValueId,
    },
    AtomicCas {
        result: ValueId,
        ptr: ValueId,
        cmp: ValueId,
        val: ValueId,
    },
    AtomicRmw {
        result: ValueId,
        op: RmwOp,
        ptr: ValueId,
        val: ValueId,
        mask: ValueId,
    },

    // ---- Shape ----
    Splat {
        result: ValueId,
        operand: ValueId,
        ty: IrType,
    },
    Broadcast {
        result: ValueId,
        operand: ValueId,
        ty: IrType,
    },
    Reshape {
        result: ValueId,
        operand: ValueId,
        ty: IrType,
    },
    Cat {
        result: ValueId,
        lhs: ValueId,
        rhs: ValueId,
    },
    Range {
        result: ValueId,
        start: i32,
        end: i32,
    },
    Dot {
        result: ValueId,
        lhs: ValueId,
        rhs: ValueId,
        acc: ValueId,
        allow_tf32: bool,
    },
    Reduce {
        result: ValueId,
        op: ReduceOp,
        operand: ValueId,
        axis: u32,
    },

    // ---- Math ----
    MathUnary {
        result: ValueId,
        op: MathOp,
        operand: ValueId,
    },
    /// High half of the full-width unsigned product.
    UMulHi {
        result: ValueId,
        lhs: ValueId,
        rhs: ValueId,
    },

    // ---- Constants ----
    ConstInt {
        result: ValueId,
        value: i64,
        ty: IrType,
    },
    ConstFloat {
        result: ValueId,
        value: f64,
        ty: IrType,
    },
    Undef {
        result: ValueId,
        ty: IrType,
    },

    // ---- Programming model ----
    GetProgramId {
        result: ValueId,
        axis: u32,
    },
    GetNumPrograms {
        result: ValueId,
        axis: u32,
    },
    Barrier {
        result: ValueId,
    },

    // ---- Control ----
    Select {
        result: ValueId,
        cond: ValueId,
        then_val: ValueId,
        else_val: ValueId,
    },
    Call {
        result: ValueId,
        callee: String,
        args: Vec<ValueId>,
    },
    /// SSA join node. Always at the top of its block; one incoming per
    /// predecessor that reaches it.
    Phi {
        result: ValueId,
        ty: IrType,
        incomings: Vec<(ValueId, BlockId)>,
    },
    Branch {
        target: BlockId,
    },
    CondBranch {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
    Return {
        value: Option<ValueId>,
    },
}

impl IrInstr {
    /// Returns the `ValueId` produced by this instruction, if any.
    /// Terminators produce no value.
    pub fn result(&self) -> Option<ValueId> {
        match self {
            IrInstr::Binary { result, .. }
            | IrInstr::Icmp { result, .. }
            | IrInstr::Fcmp { result, .. }
            | IrInstr::Cast { result, .. }
            | IrInstr::Gep { result, .. }
            | IrInstr::Load { result, .. }
            | IrInstr::MaskedLoad { result, .. }
            | IrInstr::Store { result, .. }
            | IrInstr::MaskedStore { result, .. }
            | IrInstr::AtomicCas { result, .. }
            | IrInstr::AtomicRmw { result, .. }
            | IrInstr::Splat { result, .. }
            | IrInstr::Broadcast { result, .. }
            | IrInstr::Reshape { result, .. }
            | IrInstr::Cat { result, .. }
            | IrInstr::Range { result, .. }
            | IrInstr::Dot { result, .. }
            | IrInstr::Reduce { result, .. }
            | IrInstr::MathUnary { result, .. }
            | IrInstr::UMulHi { result, .. }
            | IrInstr::ConstInt { result, .. }
            | IrInstr::ConstFloat { result, .. }
            | IrInstr::Undef { result, .. }
            | IrInstr::GetProgramId { result, .. }
            | IrInstr::GetNumPrograms { result, .. }
            | IrInstr::Barrier { result }
            | IrInstr::Select { result, .. }
            | IrInstr::Call { result, .. }
            | IrInstr::Phi { result, .. } => Some(*result),
            IrInstr::Branch { .. } | IrInstr::CondBranch { .. } | IrInstr::Return { .. } => None,
        }
    }

    /// Overwrites the result `ValueId`. No-op on terminators.
    pub fn set_result(&mut self, v: ValueId) {
        match self {
            IrInstr::Binary { result, .. }
            | IrInstr::Icmp { result, .. }
            | IrInstr::Fcmp { result, .. }
            | IrInstr::Cast { result, .. }
            | IrInstr::Gep { result, .. }
            | IrInstr::Load { result, .. }
            | IrInstr::MaskedLoad { result, .. }
            | IrInstr::Store { result, .. }
            | IrInstr::MaskedStore { result, .. }
            | IrInstr::AtomicCas { result, .. }
            | IrInstr::AtomicRmw { result, .. }
            | IrInstr::Splat { result, .. }
            | IrInstr::Broadcast { result, .. }
            | IrInstr::Reshape { result, .. }
            | IrInstr::Cat { result, .. }
            | IrInstr::Range { result, .. }
            | IrInstr::Dot { result, .. }
            | IrInstr::Reduce { result, .. }
            | IrInstr::MathUnary { result, .. }
            | IrInstr::UMulHi { result, .. }
            | IrInstr::ConstInt { result, .. }
            | IrInstr::ConstFloat { result, .. }
            | IrInstr::Undef { result, .. }
            | IrInstr::GetProgramId { result, .. }
            | IrInstr::GetNumPrograms { result, .. }
            | IrInstr::Barrier { result }
            | IrInstr::Select { result, .. }
            | IrInstr::Call { result, .. }
            | IrInstr::Phi { result, .. } => *result = v,
            IrInstr::Branch { .. } | IrInstr::CondBranch { .. } | IrInstr::Return { .. } => {}
        }
    }

    /// Returns `true` if this instruction is a block terminator.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            IrInstr::Branch { .. } | IrInstr::CondBranch { .. } | IrInstr::Return { .. }
        )
    }

    pub fn is_phi(&self) -> bool {
        matches!(self, IrInstr::Phi { .. })
    }

    /// Returns all `ValueId`s consumed by this instruction (operands).
    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            IrInstr::Binary { lhs, rhs, .. }
            | IrInstr::Icmp { lhs, rhs, .. }
            | IrInstr::Fcmp { lhs, rhs, .. }
            | IrInstr::Cat { lhs, rhs, .. }
            | IrInstr::UMulHi { lhs, rhs, .. } => vec![*lhs, *rhs],
            IrInstr::Cast { operand, .. }
            | IrInstr::Splat { operand, .. }
            | IrInstr::Broadcast { operand, .. }
            | IrInstr::Reshape { operand, .. }
            | IrInstr::Reduce { operand, .. }
            | IrInstr::MathUnary { operand, .. } => vec![*operand],
            IrInstr::Gep { ptr, offset, .. } => vec![*ptr, *offset],
            IrInstr::Load { ptr, .. } => vec![*ptr],
            IrInstr::MaskedLoad {
                ptr, mask, other, ..
            } => vec![*ptr, *mask, *other],
            IrInstr::Store { ptr, val, .. } => vec![*ptr, *val],
            IrInstr::MaskedStore { ptr, val, mask, .. } => vec![*ptr, *val, *mask],
            IrInstr::AtomicCas { ptr, cmp, val, .. } => vec![*ptr, *cmp, *val],
            IrInstr::AtomicRmw { ptr, val, mask, .. } => vec![*ptr, *val, *mask],
            IrInstr::Dot { lhs, rhs, acc, .. } => vec![*lhs, *rhs, *acc],
            IrInstr::Select {
                cond,
                then_val,
                else_val,
                ..
            } => vec![*cond, *then_val, *else_val],
            IrInstr::Call { args, .. } => args.clone(),
            IrInstr::Phi { incomings, .. } => incomings.iter().map(|(v, _)| *v).collect(),
            IrInstr::CondBranch { cond, .. } => vec![*cond],
            IrInstr::Return { value } => value.iter().copied().collect(),
            IrInstr::ConstInt { .. }
            | IrInstr::ConstFloat { .. }
            | IrInstr::Undef { .. }
            | IrInstr::Range { .. }
            | IrInstr::GetProgramId { .. }
            | IrInstr::GetNumPrograms { .. }
            | IrInstr::Barrier { .. }
            | IrInstr::Branch { .. } => vec![],
        }
    }

    /// Applies `f` to every operand `ValueId` in place. The result id is not
    /// visited; use `set_result` for that.
    pub fn for_each_operand_mut(&mut self, f: &mut dyn FnMut(&mut ValueId)) {
        match self {
            IrInstr::Binary { lhs, rhs, .. }
            | IrInstr::Icmp { lhs, rhs, .. }
            | IrInstr::Fcmp { lhs, rhs, .. }
            | IrInstr::Cat { lhs, rhs, .. }
            | IrInstr::UMulHi { lhs, rhs, .. } => {
                f(lhs);
                f(rhs);
            }
            IrInstr::Cast { operand, .. }
            | IrInstr::Splat { operand, .. }
            | IrInstr::Broadcast { operand, .. }
            | IrInstr::Reshape { operand, .. }
            | IrInstr::Reduce { operand, .. }
            | IrInstr::MathUnary { operand, .. } => f(operand),
            IrInstr::Gep { ptr, offset, .. } => {
                f(ptr);
                f(offset);
            }
            IrInstr::Load { ptr, .. } => f(ptr),
            IrInstr::MaskedLoad {
                ptr, mask, other, ..
            } => {
                f(ptr);
                f(mask);
                f(other);
            }
            IrInstr::Store { ptr, val, .. } => {
                f(ptr);
                f(val);
            }
            IrInstr::MaskedStore { ptr, val, mask, .. } => {
                f(ptr);
                f(val);
                f(mask);
            }
            IrInstr::AtomicCas { ptr, cmp, val, .. } => {
                f(ptr);
                f(cmp);
                f(val);
            }
            IrInstr::AtomicRmw { ptr, val, mask, .. } => {
                f(ptr);
                f(val);
                f(mask);
            }
            IrInstr::Dot { lhs, rhs, acc, .. } => {
                f(lhs);
                f(rhs);
                f(acc);
            }
            IrInstr::Select {
                cond,
                then_val,
                else_val,
                ..
            } => {
                f(cond);
                f(then_val);
                f(else_val);
            }
            IrInstr::Call { args, .. } => {
                for a in args {
                    f(a);
                }
            }
            IrInstr::Phi { incomings, .. } => {
                for (v, _) in incomings {
                    f(v);
                }
            }
            IrInstr::CondBranch { cond, .. } => f(cond),
            IrInstr::Return { value } => {
                if let Some(v) = value {
                    f(v);
                }
            }
            IrInstr::ConstInt { .. }
            | IrInstr::ConstFloat { .. }
            | IrInstr::Undef { .. }
            | IrInstr::Range { .. }
            | IrInstr::GetProgramId { .. }
            | IrInstr::GetNumPrograms { .. }
            | IrInstr::Barrier { .. }
            | IrInstr::Branch { .. } => {}
        }
    }

    /// Applies `f` to every `BlockId` referenced by this instruction.
    pub fn for_each_block_mut(&mut self, f: &mut dyn FnMut(&mut BlockId)) {
        match self {
            IrInstr::Branch { target } => f(target),
            IrInstr::CondBranch {
                then_block,
                else_block,
                ..
            } => {
                f(then_block);
                f(else_block);
            }
            IrInstr::Phi { incomings, .. } => {
                for (_, b) in incomings {
                    f(b);
                }
            }
            _ => {}
        }
    }
}
