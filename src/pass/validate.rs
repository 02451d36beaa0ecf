//! Structural SSA validation.
//!
//! Checks a module for the invariants every other pass relies on. The check
//! is shape-only: operand existence, single definition, terminator and phi
//! placement. Dominance is not verified; blocks may legally reference
//! values across back edges through phis.

use std::collections::HashSet;

use crate::error::PassError;
use crate::ir::module::IrModule;
use crate::ir::value::ValueId;
use crate::pass::Pass;

/// Validates SSA invariants across the entire module:
///
/// 1. Every value is defined exactly once (parameters included).
/// 2. Every operand refers to a defined value.
/// 3. Every block ends with exactly one terminator, its last instruction.
/// 4. Phi instructions appear only at the top of a block.
pub struct ValidatePass;

impl Pass for ValidatePass {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError> {
        for func in module.functions() {
            let func_name = &func.name;
            let mut defined: HashSet<ValueId> = HashSet::new();
            for arg in func.args() {
                defined.insert(*arg);
            }

            for block in func.blocks() {
                let block_label = block
                    .name
                    .clone()
                    .unwrap_or_else(|| block.id.to_string());

                let n = block.instrs.len();
                let mut seen_non_phi = false;
                for (i, instr) in block.instrs.iter().enumerate() {
                    if instr.is_phi() {
                        if seen_non_phi {
                            return Err(PassError::MisplacedPhi {
                                func: func_name.clone(),
                                block: block_label.clone(),
                            });
                        }
                    } else {
                        seen_non_phi = true;
                    }

                    // terminator must be the last instruction
                    if instr.is_terminator() && i != n - 1 {
                        return Err(PassError::MissingTerminator {
                            func: func_name.clone(),
                            block: block_label.clone(),
                        });
                    }

                    if let Some(result) = instr.result() {
                        if !defined.insert(result) {
                            return Err(PassError::MultipleDefinition {
                                func: func_name.clone(),
                                value: result.to_string(),
                            });
                        }
                    }
                }

                if !block.is_sealed() {
                    return Err(PassError::MissingTerminator {
                        func: func_name.clone(),
                        block: block_label,
                    });
                }
            }

            // uses are checked after all definitions are collected: phi
            // incomings may name values from blocks that appear later
            for block in func.blocks() {
                for instr in &block.instrs {
                    for operand in instr.operands() {
                        if !defined.contains(&operand) {
                            return Err(PassError::UndefinedValue {
                                func: func_name.clone(),
                                value: operand.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
