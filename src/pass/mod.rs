pub mod inline;
pub mod validate;

pub use inline::InlinePass;
pub use validate::ValidatePass;

use log::debug;

use crate::error::PassError;
use crate::ir::module::IrModule;

/// A compiler pass that operates on an `IrModule` in place.
///
/// Passes must be deterministic: given the same module, the transformed
/// output must be identical across runs (no global mutable state, no
/// randomness).
pub trait Pass {
    /// Human-readable name, used in error messages and diagnostics.
    fn name(&self) -> &'static str;

    /// Run the pass on the module.
    ///
    /// On success, the module is in a valid state for the next pass. On
    /// error, the module state is unspecified and the pipeline aborts.
    fn run(&mut self, module: &mut IrModule) -> Result<(), PassError>;
}

/// Manages and executes an ordered sequence of compiler passes.
///
/// Passes run in the order they were registered; the pipeline aborts at the
/// first error.
#[derive(Default)]
pub struct PassManager {
    passes: Vec<Box<dyn Pass>>,
    /// If set, dumps IR text to stderr after the pass with this name.
    dump_after: Option<String>,
}

impl PassManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a pass to the end of the pipeline.
    pub fn add_pass(&mut self, pass: impl Pass + 'static) {
        self.passes.push(Box::new(pass));
    }

    /// Configures the manager to dump IR to stderr after the named pass.
    pub fn set_dump_after(&mut self, pass_name: impl Into<String>) {
        self.dump_after = Some(pass_name.into());
    }

    /// Runs all passes in registration order on `module`.
    ///
    /// Returns `Err((pass_name, error))` at the first failure.
    pub fn run(&mut self, module: &mut IrModule) -> Result<(), (String, PassError)> {
        for pass in &mut self.passes {
            debug!("running pass '{}'", pass.name());
            pass.run(module).map_err(|e| (pass.name().to_owned(), e))?;
            if self.dump_after.as_deref() == Some(pass.name()) {
                eprintln!(
                    "--- IR after {} ---\n{}",
                    pass.name(),
                    crate::ir::print::module_text(module)
                );
            }
        }
        Ok(())
    }

    /// Returns the names of all registered passes in pipeline order.
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|p| p.name()).collect()
    }
}
