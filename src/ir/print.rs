//! IR pretty-printer.
//!
//! Emits a human-readable text representation of a module. Output is
//! deterministic: functions in registration order, blocks in `BlockId`
//! order, instructions in program order.

use std::fmt::Write;

use crate::ir::function::IrFunction;
use crate::ir::instr::IrInstr;
use crate::ir::module::IrModule;

/// Emits a full text dump of the IR module.
pub fn module_text(module: &IrModule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "// module: {}", module.name);
    for func in module.functions() {
        out.push('\n');
        out.push_str(&function_text(func));
    }
    out
}

/// Emits a text dump of a single function.
pub fn function_text(func: &IrFunction) -> String {
    let mut out = String::new();
    let _ = write!(out, "def {}(", func.name);
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            let _ = write!(out, ", ");
        }
        let _ = write!(out, "{} {}: {}", func.arg(i), param.name, param.ty);
    }
    let _ = writeln!(out, ") -> {} {{", func.return_ty);

    for block in func.blocks() {
        match &block.name {
            Some(name) => {
                let _ = writeln!(out, "  {}({}):", block.id, name);
            }
            None => {
                let _ = writeln!(out, "  {}:", block.id);
            }
        }
        for instr in &block.instrs {
            out.push_str("    ");
            write_instr(&mut out, func, instr);
            out.push('\n');
        }
    }
    out.push_str("}\n");
    out
}

fn write_instr(out: &mut String, func: &IrFunction, instr: &IrInstr) {
    if let Some(result) = instr.result() {
        let ty = func
            .value_type(result)
            .map(|t| t.to_string())
            .unwrap_or_else(|| "?".into());
        let _ = write!(out, "{}: {} = ", result, ty);
    }
    match instr {
        IrInstr::Binary { op, lhs, rhs, .. } => {
            let _ = write!(out, "{} {}, {}", op, lhs, rhs);
        }
        IrInstr::Icmp { pred, lhs, rhs, .. } => {
            let _ = write!(out, "icmp {} {}, {}", pred, lhs, rhs);
        }
        IrInstr::Fcmp { pred, lhs, rhs, .. } => {
            let _ = write!(out, "fcmp {} {}, {}", pred, lhs, rhs);
        }
        IrInstr::Cast { op, operand, ty, .. } => {
            let _ = write!(out, "{} {} to {}", op, operand, ty);
        }
        IrInstr::Gep { ptr, offset, .. } => {
            let _ = write!(out, "gep {}, {}", ptr, offset);
        }
        IrInstr::Load {
            ptr,
            cache,
            is_volatile,
            ..
        } => {
            let _ = write!(out, "load {}", ptr);
            write_load_attrs(out, *cache, *is_volatile);
        }
        IrInstr::MaskedLoad {
            ptr,
            mask,
            other,
            cache,
            is_volatile,
            ..
        } => {
            let _ = write!(out, "masked_load {}, {}, {}", ptr, mask, other);
            write_load_attrs(out, *cache, *is_volatile);
        }
        IrInstr::Store { ptr, val, .. } => {
            let _ = write!(out, "store {}, {}", ptr, val);
        }
        IrInstr::MaskedStore { ptr, val, mask, .. } => {
            let _ = write!(out, "masked_store {}, {}, {}", ptr, val, mask);
        }
        IrInstr::AtomicCas { ptr, cmp, val, .. } => {
            let _ = write!(out, "atomic_cas {}, {}, {}", ptr, cmp, val);
        }
        IrInstr::AtomicRmw {
            op, ptr, val, mask, ..
        } => {
            let _ = write!(out, "atomic_rmw.{} {}, {}, {}", op, ptr, val, mask);
        }
        IrInstr::Splat { operand, .. } => {
            let _ = write!(out, "splat {}", operand);
        }
        IrInstr::Broadcast { operand, .. } => {
            let _ = write!(out, "broadcast {}", operand);
        }
        IrInstr::Reshape { operand, .. } => {
            let _ = write!(out, "reshape {}", operand);
        }
        IrInstr::Cat { lhs, rhs, .. } => {
            let _ = write!(out, "cat {}, {}", lhs, rhs);
        }
        IrInstr::Range { start, end, .. } => {
            let _ = write!(out, "range {}, {}", start, end);
        }
        IrInstr::Dot {
            lhs,
            rhs,
            acc,
            allow_tf32,
            ..
        } => {
            let _ = write!(out, "dot {}, {}, {}", lhs, rhs, acc);
            if *allow_tf32 {
                out.push_str(" tf32");
            }
        }
        IrInstr::Reduce {
            op, operand, axis, ..
        } => {
            let _ = write!(out, "reduce.{} {}, axis {}", op, operand, axis);
        }
        IrInstr::MathUnary { op, operand, .. } => {
            let _ = write!(out, "{} {}", op, operand);
        }
        IrInstr::UMulHi { lhs, rhs, .. } => {
            let _ = write!(out, "umulhi {}, {}", lhs, rhs);
        }
        IrInstr::ConstInt { value, ty, .. } => {
            let _ = write!(out, "const.i {} : {}", value, ty);
        }
        IrInstr::ConstFloat { value, ty, .. } => {
            let _ = write!(out, "const.f {} : {}", value, ty);
        }
        IrInstr::Undef { ty, .. } => {
            let _ = write!(out, "undef : {}", ty);
        }
        IrInstr::GetProgramId { axis, .. } => {
            let _ = write!(out, "get_program_id {}", axis);
        }
        IrInstr::GetNumPrograms { axis, .. } => {
            let _ = write!(out, "get_num_programs {}", axis);
        }
        IrInstr::Barrier { .. } => {
            out.push_str("barrier");
        }
        IrInstr::Select {
            cond,
            then_val,
            else_val,
            ..
        } => {
            let _ = write!(out, "select {}, {}, {}", cond, then_val, else_val);
        }
        IrInstr::Call { callee, args, .. } => {
            let _ = write!(out, "call @{}(", callee);
            for (i, a) in args.iter().enumerate() {
                if i > 0 {
                    let _ = write!(out, ", ");
                }
                let _ = write!(out, "{}", a);
            }
            let _ = write!(out, ")");
        }
        IrInstr::Phi { incomings, .. } => {
            out.push_str("phi ");
            for (i, (v, b)) in incomings.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "[{}, {}]", v, b);
            }
            if incomings.is_empty() {
                out.push_str("[]");
            }
        }
        IrInstr::Branch { target } => {
            let _ = write!(out, "br {}", target);
        }
        IrInstr::CondBranch {
            cond,
            then_block,
            else_block,
        } => {
            let _ = write!(out, "br {}, {}, {}", cond, then_block, else_block);
        }
        IrInstr::Return { value } => match value {
            Some(v) => {
                let _ = write!(out, "ret {}", v);
            }
            None => out.push_str("ret"),
        },
    }
}

fn write_load_attrs(out: &mut String, cache: crate::ir::instr::CacheModifier, is_volatile: bool) {
    use crate::ir::instr::CacheModifier;
    match cache {
        CacheModifier::None => {}
        CacheModifier::Ca => out.push_str(" .ca"),
        CacheModifier::Cg => out.push_str(" .cg"),
    }
    if is_volatile {
        out.push_str(" volatile");
    }
}
