//! An index over an introspected GraphQL schema.
//!
//! The [`Schema`] owns the raw introspection payload and indexes its types by name. Everything else
//! in this module is a lightweight, borrowed view onto that payload:
//! * [`Type`] wraps a named type definition and knows how to classify itself and render itself as a
//!   GraphQL selection set.
//! * [`Field`] wraps a field of an object or interface type.
//! * [`TypeRef`] wraps a possibly wrapped (`LIST`/`NON_NULL`) reference to a named type, as found in
//!   field and argument signatures.
//! * [`InputValue`] wraps an argument or input object field.
//!
//! Views are cheap to construct ([`Copy`], two pointers) and carry no state of their own, so they are
//! created on demand rather than cached.
//!
//! Lookups never fail loudly: an unknown type or field yields [`None`], and callers decide whether
//! absence is an error.

use crate::transport::{QueryOptions, Transport};
use anyhow::Error;
use serde_json::{Map, Value};
use std::collections::HashMap;

mod field;
mod input_value;
mod introspection;
mod ty;
mod type_ref;

pub use field::{Field, UnknownVariable, VariableClause, VariableTypes};
pub use input_value::InputValue;
pub use introspection::*;
pub use ty::Type;
pub use type_ref::TypeRef;

/// Depth bounds for rendering a selection set.
///
/// Rendering recurses into every field of an object type while `depth < max_depth`. Once the bound
/// is reached only scalar fields are emitted, which terminates recursion even over cyclic type
/// graphs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryDepth {
    /// The current nesting level. Also used as the indentation level of rendered fields.
    pub depth: usize,
    /// The level at which to stop recursing into object fields.
    pub max_depth: usize,
}

impl QueryDepth {
    /// Start at the top level, recursing until `max_depth`.
    pub fn max(max_depth: usize) -> Self {
        Self {
            depth: 1,
            max_depth,
        }
    }

    /// The same bound, one level deeper.
    pub fn deeper(self) -> Self {
        Self {
            depth: self.depth + 1,
            ..self
        }
    }
}

impl Default for QueryDepth {
    fn default() -> Self {
        Self::max(1)
    }
}

/// An introspected GraphQL schema, indexed by type name.
#[derive(Clone, Debug)]
pub struct Schema {
    data: SchemaData,
    types: HashMap<String, usize>,
}

impl Schema {
    /// Index a raw introspection payload.
    ///
    /// If several types share a name, the last one wins.
    pub fn new(data: SchemaData) -> Self {
        let types = data
            .types
            .iter()
            .enumerate()
            .filter_map(|(i, ty)| Some((ty.name.clone()?, i)))
            .collect();
        Self { data, types }
    }

    /// Parse an introspection result.
    ///
    /// `json` may be the full response (`{"data": {"__schema": ...}}`), the `{"__schema": ...}`
    /// object, or the schema object itself.
    pub fn from_json(mut json: Value) -> Result<Self, Error> {
        if let Some(data) = json.get_mut("data") {
            json = data.take();
        }
        if let Some(schema) = json.get_mut("__schema") {
            json = schema.take();
        }
        Ok(Self::new(serde_json::from_value(json)?))
    }

    /// Download the schema from a GraphQL server.
    pub async fn fetch(transport: &dyn Transport) -> Result<Self, Error> {
        let res = transport
            .query(
                INTROSPECTION_QUERY,
                &Map::new(),
                &QueryOptions::default(),
            )
            .await?
            .into_result()?;
        Self::from_json(res)
    }

    /// The raw introspection payload.
    pub fn data(&self) -> &SchemaData {
        &self.data
    }

    /// All named types, in introspection order.
    pub fn types(&self) -> impl Iterator<Item = Type<'_>> {
        self.data.types.iter().map(|ty| Type::new(self, ty))
    }

    /// Look up a type by name.
    pub fn get_type(&self, name: &str) -> Option<Type<'_>> {
        let index = *self.types.get(name)?;
        Some(Type::new(self, &self.data.types[index]))
    }

    /// Look up a field of an object or interface type.
    pub fn get_field(&self, type_name: &str, field_name: &str) -> Option<Field<'_>> {
        self.get_type(type_name)?.field(field_name)
    }

    /// Look up a field of an input object type.
    pub fn get_input_field(&self, type_name: &str, field_name: &str) -> Option<InputValue<'_>> {
        self.get_type(type_name)?.input_field(field_name)
    }

    /// The name of the query root type.
    pub fn query_type_name(&self) -> Option<&str> {
        self.data.query_type.as_ref().map(|ty| ty.name.as_str())
    }

    /// The name of the mutation root type.
    pub fn mutation_type_name(&self) -> Option<&str> {
        self.data.mutation_type.as_ref().map(|ty| ty.name.as_str())
    }

    /// The name of the subscription root type.
    pub fn subscription_type_name(&self) -> Option<&str> {
        self.data.subscription_type.as_ref().map(|ty| ty.name.as_str())
    }

    /// Look up a field of the query root type.
    pub fn get_query(&self, name: &str) -> Option<Field<'_>> {
        self.get_field(self.query_type_name()?, name)
    }

    /// Look up a field of the mutation root type.
    pub fn get_mutation(&self, name: &str) -> Option<Field<'_>> {
        self.get_field(self.mutation_type_name()?, name)
    }

    /// Look up a field of the subscription root type.
    pub fn get_subscription(&self, name: &str) -> Option<Field<'_>> {
        self.get_field(self.subscription_type_name()?, name)
    }

    pub fn directives(&self) -> &[DirectiveData] {
        &self.data.directives
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{testing, transport::mock::MockTransport};
    use serde_json::json;

    #[test]
    fn test_get_type() {
        let schema = testing::schema();
        assert_eq!(schema.get_type("Post").unwrap().name(), "Post");
        assert!(schema.get_type("Nope").is_none());
        assert!(schema.types().any(|ty| ty.name() == "PageInfo"));
    }

    #[test]
    fn test_root_fields() {
        let schema = testing::schema();
        assert_eq!(schema.get_query("posts").unwrap().name(), "posts");
        assert_eq!(schema.get_mutation("deleteNode").unwrap().name(), "deleteNode");
        assert!(schema.get_query("deleteNode").is_none());
        // This schema has no subscription root.
        assert!(schema.get_subscription("posts").is_none());
    }

    #[test]
    fn test_get_field() {
        let schema = testing::schema();
        assert_eq!(schema.get_field("Post", "title").unwrap().name(), "title");
        assert!(schema.get_field("Post", "nope").is_none());
        assert!(schema.get_field("Nope", "title").is_none());
        assert_eq!(
            schema.get_input_field("PostAttributes", "title").unwrap().name(),
            "title"
        );
        assert!(schema.get_input_field("Post", "title").is_none());
    }

    #[test]
    fn test_from_json_wrappers() {
        let bare = json!({
            "queryType": { "name": "Query" },
            "types": [{ "kind": "OBJECT", "name": "Query", "fields": [] }],
        });
        for json in [
            bare.clone(),
            json!({ "__schema": bare.clone() }),
            json!({ "data": { "__schema": bare } }),
        ] {
            let schema = Schema::from_json(json).unwrap();
            assert_eq!(schema.query_type_name(), Some("Query"));
            assert!(schema.get_type("Query").unwrap().is_object());
        }
    }

    #[async_std::test]
    async fn test_fetch() {
        let transport = MockTransport::default().respond(json!({
            "__schema": testing::schema_json(),
        }));
        let schema = Schema::fetch(&transport).await.unwrap();
        assert!(schema.get_type("Post").is_some());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].document.contains("__schema"));
    }
}
