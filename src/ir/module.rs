use indexmap::IndexMap;

use crate::ir::function::IrFunction;

/// The top-level IR container.
///
/// Functions are stored in insertion order and looked up by name. Names are
/// unique within a module. Removal preserves the order of the remaining
/// functions, so printing and pass iteration stay deterministic.
#[derive(Debug, Default)]
pub struct IrModule {
    pub name: String,
    pub(crate) functions: IndexMap<String, IrFunction>,
}

impl IrModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
        }
    }

    /// Registers a completed function. Returns `Err` if the name is taken.
    pub fn add_function(&mut self, func: IrFunction) -> Result<(), String> {
        if self.functions.contains_key(&func.name) {
            return Err(format!("function '{}' already defined", func.name));
        }
        self.functions.insert(func.name.clone(), func);
        Ok(())
    }

    pub fn function(&self, name: &str) -> Option<&IrFunction> {
        self.functions.get(name)
    }

    pub(crate) fn function_mut(&mut self, name: &str) -> Option<&mut IrFunction> {
        self.functions.get_mut(name)
    }

    /// Removes a function, returning its body.
    pub fn remove_function(&mut self, name: &str) -> Option<IrFunction> {
        self.functions.shift_remove(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &IrFunction> {
        self.functions.values()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
