//! Use-case modules and their registry
//!
//! - `descriptor` - identity and discovery metadata
//! - `module` - the [`UseCase`] hook trait
//! - `registry` - ordered registry that fans lifecycle events out to modules

mod descriptor;
mod module;
mod registry;

pub use descriptor::UseCaseDescriptor;
pub use module::UseCase;
pub use registry::UseCaseRegistry;
