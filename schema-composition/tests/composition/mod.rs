mod compose_directives;
mod compose_errors;
mod compose_types;

pub(crate) mod test_helpers {
    use schema_composition::CompositionFailure;
    use schema_composition::CompositionHint;
    use schema_composition::CompositionOptions;
    use schema_composition::DirectiveRegistry;
    use schema_composition::Schema;
    use schema_composition::SourceDocument;
    use schema_composition::directive::cache_control::cache_control_directive;

    pub(crate) struct ServiceDefinition<'a> {
        pub(crate) name: &'a str,
        pub(crate) type_defs: &'a str,
    }

    /// The built-in directives plus `@cacheControl`.
    pub(crate) fn registry() -> DirectiveRegistry {
        let mut registry = DirectiveRegistry::new();
        registry.register(cache_control_directive()).unwrap();
        registry
    }

    pub(crate) fn parse_services(service_list: &[ServiceDefinition<'_>]) -> Vec<SourceDocument> {
        service_list
            .iter()
            .map(|service| SourceDocument::parse(service.name, service.type_defs).unwrap())
            .collect()
    }

    pub(crate) fn compose_services(
        service_list: &[ServiceDefinition<'_>],
    ) -> Result<(Schema, Vec<CompositionHint>), CompositionFailure> {
        schema_composition::compose(
            &parse_services(service_list),
            &registry(),
            &CompositionOptions::default(),
        )
    }

    pub(crate) fn field_names(schema: &Schema, type_name: &str) -> Vec<String> {
        schema
            .try_get_type(type_name)
            .and_then(|ty| ty.fields())
            .into_iter()
            .flatten()
            .map(|(name, _)| name.to_string())
            .collect()
    }
}

pub(crate) use test_helpers::ServiceDefinition;
pub(crate) use test_helpers::compose_services;
pub(crate) use test_helpers::field_names;
pub(crate) use test_helpers::parse_services;
pub(crate) use test_helpers::registry;
