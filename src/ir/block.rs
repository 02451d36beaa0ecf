use crate::ir::instr::IrInstr;
use crate::ir::value::ValueId;

/// An opaque index identifying a basic block within an `IrFunction`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlockId(pub u32);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A basic block in SSA form.
///
/// Invariants:
/// 1. A sealed block ends with exactly one terminator, its last instruction.
/// 2. Phi instructions appear only as a prefix of `instrs`.
#[derive(Debug, Clone)]
pub struct IrBlock {
    pub id: BlockId,
    /// Optional display name used by the pretty-printer and the inliner.
    pub name: Option<String>,
    /// Instructions in program order. Terminator is last.
    pub instrs: Vec<IrInstr>,
}

impl IrBlock {
    pub fn new(id: BlockId, name: Option<String>) -> Self {
        Self {
            id,
            name,
            instrs: Vec::new(),
        }
    }

    /// Returns the terminator instruction if the block is sealed.
    pub fn terminator(&self) -> Option<&IrInstr> {
        self.instrs.last().filter(|i| i.is_terminator())
    }

    /// A block is sealed when it ends with a terminator.
    pub fn is_sealed(&self) -> bool {
        self.terminator().is_some()
    }

    /// Iterates over all `ValueId`s defined in this block.
    pub fn all_defs(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.instrs.iter().filter_map(|i| i.result())
    }
}
