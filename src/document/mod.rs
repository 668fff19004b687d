//! Documents, fragments, the plugin protocol and the registry

mod fragment;
mod plugin;
mod registry;

#[allow(clippy::module_inception)]
mod document;

pub use document::{Document, DocumentError, DocumentResult};
pub use fragment::{Fragment, FragmentKey};
pub use plugin::{RequirementPlugin, ResolveContext};
pub use registry::DocumentRegistry;
