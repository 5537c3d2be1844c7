use schemars::JsonSchema;
use serde::Deserialize;
use serde::Serialize;

/// How same-named fields of non-root object and interface types are merged.
///
/// Root operation types always rename colliding fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldCollisionPolicy {
    /// Structurally identical fields become one shared field; other collisions are renamed.
    #[default]
    ShareIdentical,
    /// Every collision is renamed with the source name as prefix.
    RenameAll,
}

/// Configuration for one composition.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(deny_unknown_fields, default)]
pub struct CompositionOptions {
    /// Merge strategy for colliding fields outside of the root operation types
    pub field_collisions: FieldCollisionPolicy,
    /// Drop applications of unregistered directives instead of failing
    pub ignore_unknown_directives: bool,
    /// Fail when the composed schema has no query root type
    pub require_query_root: bool,
}

impl Default for CompositionOptions {
    fn default() -> Self {
        Self {
            field_collisions: FieldCollisionPolicy::default(),
            ignore_unknown_directives: false,
            require_query_root: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let options: CompositionOptions =
            serde_json::from_str(r#"{ "field_collisions": "rename_all" }"#).unwrap();
        assert_eq!(
            options,
            CompositionOptions {
                field_collisions: FieldCollisionPolicy::RenameAll,
                ..Default::default()
            }
        );
        assert!(options.require_query_root);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let error =
            serde_json::from_str::<CompositionOptions>(r#"{ "rename": true }"#).unwrap_err();
        assert!(error.to_string().contains("unknown field `rename`"));
    }
}
