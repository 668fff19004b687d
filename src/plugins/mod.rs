//! Concrete requirement plugins
//!
//! Domain-specific capabilities built on the [`RequirementPlugin`]
//! dispatch protocol: substring match, field and metadata equality,
//! numeric ranges, and store-backed enrichment.
//!
//! [`RequirementPlugin`]: crate::document::RequirementPlugin

mod contains;
mod field;
mod hydrate;
mod metadata;

pub use contains::TextContainsPlugin;
pub use field::FieldEqualsPlugin;
pub use hydrate::StoreHydratePlugin;
pub use metadata::{MetadataEqualsPlugin, MetadataRangePlugin};
