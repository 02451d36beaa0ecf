pub mod context;
pub mod types;

pub use context::{AstContext, AstValue, TypeId};
pub use types::{AstType, ScalarTy, Signedness};
