//! Function inlining.
//!
//! Splices every called function's body into its call sites and removes the
//! callee from the module. Per site, the parent block is split immediately
//! before the call: the prefix hosts the cloned entry block, the suffix
//! becomes the exit block, and a phi at the top of the exit reconciles the
//! callee's returns. Call sites discovered while cloning are queued and
//! inlined in turn.
//!
//! Recursion (direct or mutual) is out of scope; the caller must ensure the
//! call graph is acyclic before running this pass.

use std::collections::{BTreeMap, HashMap};

use log::{debug, trace};

use crate::error::PassError;
use crate::ir::block::BlockId;
use crate::ir::function::IrFunction;
use crate::ir::instr::IrInstr;
use crate::ir::module::IrModule;
use crate::ir::value::{ValueDef, ValueId};
use crate::pass::Pass;

/// A recorded call site: the calling function and the call's result value.
#[derive(Debug, Clone)]
struct CallSite {
    caller: String,
    call: ValueId,
}

pub struct InlinePass;

impl Pass for InlinePass {
    fn name(&self) -> &'static str {
        "inline"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError> {
        // gather all call sites, keyed by callee
        let mut callsites: BTreeMap<String, Vec<CallSite>> = BTreeMap::new();
        for func in module.functions() {
            for block in func.blocks() {
                for instr in &block.instrs {
                    if let IrInstr::Call { result, callee, .. } = instr {
                        callsites.entry(callee.clone()).or_default().push(CallSite {
                            caller: func.name.clone(),
                            call: *result,
                        });
                    }
                }
            }
        }

        // Replace call sites with function bodies, one callee at a time.
        // Removed callees are retired rather than dropped: cloning may
        // discover sites of a callee after its removal, and those still
        // need a body to splice.
        let mut retired: HashMap<String, IrFunction> = HashMap::new();
        while let Some(callee_name) = callsites.keys().next().cloned() {
            let sites = callsites.remove(&callee_name).unwrap();
            let callee = module
                .function(&callee_name)
                .or_else(|| retired.get(&callee_name))
                .expect("inline: callee body available")
                .clone();
            debug!("inlining {} site(s) of '{}'", sites.len(), callee_name);
            for site in sites {
                let caller: &mut IrFunction = if module.function(&site.caller).is_some() {
                    module.function_mut(&site.caller).unwrap()
                } else {
                    retired
                        .get_mut(&site.caller)
                        .expect("inline: caller body available")
                };
                do_inline(caller, &callee, site.call, &mut callsites);
            }
            if let Some(f) = module.remove_function(&callee_name) {
                retired.insert(callee_name, f);
            }
        }
        Ok(())
    }
}

fn find_call(caller: &IrFunction, call: ValueId) -> (BlockId, usize) {
    for block in caller.blocks() {
        for (i, instr) in block.instrs.iter().enumerate() {
            if instr.result() == Some(call) {
                return (block.id, i);
            }
        }
    }
    unreachable!("inline: call site {} not found in '{}'", call, caller.name)
}

/// Splices `callee`'s body into `caller` at the call producing `call`.
fn do_inline(
    caller: &mut IrFunction,
    callee: &IrFunction,
    call: ValueId,
    callsites: &mut BTreeMap<String, Vec<CallSite>>,
) {
    let (block_id, index) = find_call(caller, call);
    let args = match &caller.blocks[block_id.0 as usize].instrs[index] {
        IrInstr::Call { args, .. } => args.clone(),
        other => unreachable!("inline: {} does not name a call instruction: {:?}", call, other),
    };
    trace!("splicing '{}' into '{}' at {}", callee.name, caller.name, call);

    // Split the parent block immediately before the call. The prefix hosts
    // the cloned entry block; the suffix (which starts with the call
    // itself) resumes the caller and becomes the exit block.
    let exit = caller.split_before(block_id, index);
    // Discard the fall-through branch created by the split; the clone of
    // the callee's entry terminator reconnects the prefix.
    caller.blocks[block_id.0 as usize].instrs.pop();

    // Fresh blocks for every non-entry block of the callee, named after it.
    let mut new_blocks = vec![block_id];
    for block in &callee.blocks()[1..] {
        let name = match &block.name {
            Some(n) => format!("{}_{}", callee.name, n),
            None => format!("{}_{}", callee.name, block.id),
        };
        new_blocks.push(caller.add_block(Some(name)));
    }
    let block_map: HashMap<BlockId, BlockId> = callee
        .blocks()
        .iter()
        .map(|b| b.id)
        .zip(new_blocks.iter().copied())
        .collect();

    // The phi holding the return values of the inlined function.
    let phi_result = caller.fresh_value();
    caller.value_defs.insert(phi_result, ValueDef::Instr);
    caller
        .value_types
        .insert(phi_result, callee.return_ty.clone());
    let mut phi_incomings: Vec<(ValueId, BlockId)> = Vec::new();

    // First pass: allocate a fresh caller value for every callee
    // definition and map formals to actuals. A complete map up front lets
    // uses that precede their definition in clone order (phi incomings on
    // back edges) resolve correctly.
    let mut val_map: HashMap<ValueId, ValueId> = HashMap::new();
    for (i, arg) in callee.args().iter().enumerate() {
        val_map.insert(*arg, args[i]);
    }
    for block in callee.blocks() {
        for instr in &block.instrs {
            if let Some(old) = instr.result() {
                let fresh = caller.fresh_value();
                caller.value_defs.insert(fresh, ValueDef::Instr);
                if let Some(ty) = callee.value_type(old) {
                    caller.value_types.insert(fresh, ty.clone());
                }
                if let Some(md) = callee.metadata(old) {
                    caller.metadata.insert(fresh, *md);
                }
                val_map.insert(old, fresh);
            }
        }
    }

    // Second pass: clone every instruction in order with substitutions. A
    // return is replaced by a branch to the exit block, recording its value
    // as a phi incoming.
    for (i, old_block) in callee.blocks().iter().enumerate() {
        let new_block = new_blocks[i];
        for old_instr in &old_block.instrs {
            if let IrInstr::Return { value } = old_instr {
                if let Some(v) = value {
                    phi_incomings.push((val_map[v], new_block));
                }
                caller.blocks[new_block.0 as usize]
                    .instrs
                    .push(IrInstr::Branch { target: exit });
                continue;
            }
            let mut new_instr = old_instr.clone();
            if let Some(old) = new_instr.result() {
                new_instr.set_result(val_map[&old]);
            }
            new_instr.for_each_operand_mut(&mut |v| {
                if let Some(mapped) = val_map.get(v) {
                    *v = *mapped;
                }
            });
            new_instr.for_each_block_mut(&mut |b| {
                if let Some(mapped) = block_map.get(b) {
                    *b = *mapped;
                }
            });
            // cloned call sites are queued so they get inlined in turn
            if let IrInstr::Call {
                result,
                callee: nested,
                ..
            } = &new_instr
            {
                callsites.entry(nested.clone()).or_default().push(CallSite {
                    caller: caller.name.clone(),
                    call: *result,
                });
            }
            caller.blocks[new_block.0 as usize].instrs.push(new_instr);
        }
    }

    // The exit block: the original call (now its first instruction) is
    // replaced by the phi, and every use of the call's result is forwarded
    // to it.
    let phi = IrInstr::Phi {
        result: phi_result,
        ty: callee.return_ty.clone(),
        incomings: phi_incomings,
    };
    let exit_instrs = &mut caller.blocks[exit.0 as usize].instrs;
    exit_instrs.remove(0);
    exit_instrs.insert(0, phi);
    caller.replace_uses(call, phi_result);
    caller.value_defs.remove(&call);
    caller.value_types.remove(&call);
    caller.metadata.remove(&call);
}
