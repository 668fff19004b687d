//! Metadata equality and numeric range plugins

use crate::document::{DocumentResult, Fragment, RequirementPlugin, ResolveContext};
use serde_json::Value;

/// Claims any key with a `meta.` prefix and keeps fragments whose
/// metadata entry for the suffix is deep-equal to the requirement value.
///
/// `meta.act = 3` keeps fragments whose metadata holds `"act": 3`.
pub struct MetadataEqualsPlugin;

const META_PREFIX: &str = "meta.";

impl MetadataEqualsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MetadataEqualsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementPlugin for MetadataEqualsPlugin {
    fn id(&self) -> &str {
        "metadata-equals"
    }

    fn can_handle(&self, key: &str, _value: &Value) -> bool {
        key.len() > META_PREFIX.len() && key.starts_with(META_PREFIX)
    }

    fn filter(
        &self,
        _cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        key: &str,
        value: &Value,
    ) -> DocumentResult<bool> {
        let field = &key[META_PREFIX.len()..];
        Ok(fragment
            .metadata
            .as_ref()
            .and_then(|m| m.get(field))
            .is_some_and(|stored| stored == value))
    }
}

/// Claims one configurable key and keeps fragments whose numeric metadata
/// entry falls within the requirement's bounds.
///
/// The requirement value is an object with optional `min` and `max`
/// numbers (inclusive); anything else is not claimed.
pub struct MetadataRangePlugin {
    id: String,
    key: String,
    field: String,
}

impl MetadataRangePlugin {
    /// Claim `key`, ranging over the metadata entry of the same name
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        let field = key.clone();
        Self::with_field(key, field)
    }

    /// Claim `key`, ranging over a differently named metadata entry
    pub fn with_field(key: impl Into<String>, field: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: format!("metadata-range:{key}"),
            key,
            field: field.into(),
        }
    }
}

impl RequirementPlugin for MetadataRangePlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn can_handle(&self, key: &str, value: &Value) -> bool {
        key == self.key
            && value
                .as_object()
                .is_some_and(|o| o.contains_key("min") || o.contains_key("max"))
    }

    fn filter(
        &self,
        _cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        _key: &str,
        value: &Value,
    ) -> DocumentResult<bool> {
        let Some(stored) = fragment
            .metadata
            .as_ref()
            .and_then(|m| m.get(&self.field))
            .and_then(Value::as_f64)
        else {
            return Ok(false);
        };

        let bound = |name: &str| value.get(name).and_then(Value::as_f64);
        let above_min = bound("min").map_or(true, |min| stored >= min);
        let below_max = bound("max").map_or(true, |max| stored <= max);
        Ok(above_min && below_max)
    }
}
