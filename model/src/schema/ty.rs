use super::{Field, InputValue, QueryDepth, Schema, TypeData, TypeKind, TypeRefData};
use crate::{
    columns::{Column, Fragment, Fragments},
    registry::Registry,
    resource::ResourceClass,
};
use std::sync::Arc;

const CONNECTION_SUFFIX: &str = "Connection";

/// A named type definition.
#[derive(Clone, Copy, Debug)]
pub struct Type<'a> {
    schema: &'a Schema,
    data: &'a TypeData,
}

impl<'a> Type<'a> {
    pub fn new(schema: &'a Schema, data: &'a TypeData) -> Self {
        Self { schema, data }
    }

    pub fn schema(&self) -> &'a Schema {
        self.schema
    }

    pub fn data(&self) -> &'a TypeData {
        self.data
    }

    pub fn name(&self) -> &'a str {
        self.data.name.as_deref().unwrap_or_default()
    }

    pub fn description(&self) -> Option<&'a str> {
        self.data.description.as_deref()
    }

    pub fn kind(&self) -> TypeKind {
        self.data.kind
    }

    pub fn is_scalar(&self) -> bool {
        self.kind() == TypeKind::Scalar
    }

    pub fn is_object(&self) -> bool {
        self.kind() == TypeKind::Object
    }

    pub fn is_interface(&self) -> bool {
        self.kind() == TypeKind::Interface
    }

    pub fn is_union(&self) -> bool {
        self.kind() == TypeKind::Union
    }

    pub fn is_enum(&self) -> bool {
        self.kind() == TypeKind::Enum
    }

    pub fn is_input_object(&self) -> bool {
        self.kind() == TypeKind::InputObject
    }

    pub fn is_list(&self) -> bool {
        self.kind() == TypeKind::List
    }

    pub fn is_non_null(&self) -> bool {
        self.kind() == TypeKind::NonNull
    }

    /// The interfaces this type implements.
    pub fn interfaces(&self) -> &'a [TypeRefData] {
        self.data.interfaces.as_deref().unwrap_or_default()
    }

    /// Whether this type implements the `Node` interface.
    pub fn is_node(&self) -> bool {
        self.interfaces()
            .iter()
            .any(|interface| interface.name.as_deref() == Some("Node"))
    }

    pub fn fields(&self) -> impl Iterator<Item = Field<'a>> + 'a {
        let schema = self.schema;
        self.data
            .fields
            .iter()
            .flatten()
            .map(move |field| Field::new(schema, field))
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<Field<'a>> {
        self.fields().filter(|field| field.name() == name).last()
    }

    pub fn field_names(&self) -> Vec<&'a str> {
        self.fields().map(|field| field.name()).collect()
    }

    /// Fields whose type is a scalar or a list of scalars.
    pub fn scalar_fields(&self) -> Vec<Field<'a>> {
        self.fields().filter(|field| field.is_scalar()).collect()
    }

    /// Fields whose type is an object or a list of objects.
    pub fn object_fields(&self) -> Vec<Field<'a>> {
        self.fields().filter(|field| field.is_object()).collect()
    }

    /// Fields whose type is a connection.
    pub fn connection_fields(&self) -> Vec<Field<'a>> {
        self.fields().filter(|field| field.is_connection()).collect()
    }

    pub fn input_fields(&self) -> impl Iterator<Item = InputValue<'a>> + 'a {
        let schema = self.schema;
        self.data
            .input_fields
            .iter()
            .flatten()
            .map(move |field| InputValue::new(schema, field))
    }

    /// Look up a field of an input object type by name.
    pub fn input_field(&self, name: &str) -> Option<InputValue<'a>> {
        self.input_fields().filter(|field| field.name() == name).last()
    }

    pub fn input_field_names(&self) -> Vec<&'a str> {
        self.input_fields().map(|field| field.name()).collect()
    }

    /// The input type used to create or update nodes of this type (`<Name>Attributes`).
    ///
    /// Only node types have an input type.
    pub fn input_type(&self) -> Option<Type<'a>> {
        if self.is_node() {
            self.schema.get_type(&format!("{}Attributes", self.name()))
        } else {
            None
        }
    }

    /// Whether this type is a paginated connection.
    ///
    /// A connection has `edges`, `pageInfo` and `nodes` fields and a name ending in `Connection`.
    pub fn is_connection(&self) -> bool {
        let names = self.field_names();
        ["edges", "pageInfo", "nodes"]
            .iter()
            .all(|required| names.contains(required))
            && self.name().ends_with(CONNECTION_SUFFIX)
    }

    /// The name of the resource class associated with this type.
    ///
    /// For a connection this is the name of the type being paginated, otherwise it is the name of
    /// the type itself.
    pub fn resource_class_name(&self) -> &'a str {
        if self.is_connection() {
            self.name()
                .strip_suffix(CONNECTION_SUFFIX)
                .unwrap_or_else(|| self.name())
        } else {
            self.name()
        }
    }

    /// The resource class registered for this type, if any.
    pub fn resource_class(&self, registry: &Registry) -> Option<Arc<ResourceClass>> {
        registry.get(self.resource_class_name())
    }

    /// Render the fields of this type as a selection set body.
    ///
    /// Below `max_depth` every field is rendered, recursing into nested types. At or beyond it only
    /// scalar fields are rendered, so rendering terminates even when the type graph has cycles.
    pub fn to_query_string(&self, depth: QueryDepth) -> String {
        let fields = if depth.depth < depth.max_depth {
            self.fields().collect()
        } else {
            self.scalar_fields()
        };
        fields
            .iter()
            .map(|field| field.to_query_string(depth.deeper()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The default column spec for this type.
    ///
    /// Scalar fields contribute their names. Fields referring to node types contribute a nested
    /// spec for that type. Connections and other object fields are left out, as is any node type
    /// already being expanded further up, so expansion always terminates.
    pub fn expand_columns(&self) -> Vec<Column> {
        self.expand_columns_within(&mut vec![self.name()])
    }

    fn expand_columns_within(&self, path: &mut Vec<&'a str>) -> Vec<Column> {
        let mut columns = vec![];
        for field in self.fields() {
            if field.is_scalar() {
                columns.push(Column::from(field.name()));
            } else if field.is_connection() || !field.is_node() {
                continue;
            } else {
                let type_name = field.type_ref().map(|ty| ty.name()).unwrap_or_default();
                match self.schema.get_type(type_name) {
                    Some(_) if path.contains(&type_name) => {
                        tracing::debug!(
                            "not expanding {}.{}: {type_name} is already being expanded",
                            self.name(),
                            field.name(),
                        );
                    }
                    Some(ty) => {
                        path.push(type_name);
                        let nested = ty.expand_columns_within(path);
                        path.pop();
                        columns.push(Column::nested(field.name(), nested));
                    }
                    None => columns.push(Column::from(field.name())),
                }
            }
        }
        columns
    }

    /// A fragment table for this type.
    ///
    /// Each object field contributes a fragment rendering that field's selection set, and `base`
    /// lists the scalar fields.
    pub fn to_fragments(&self) -> Fragments<'a> {
        let mut fragments: Fragments<'a> = self
            .object_fields()
            .into_iter()
            .map(|field| {
                (
                    field.name().to_string(),
                    Fragment::render(move |depth| field.to_fragment(depth)),
                )
            })
            .collect();
        let base = self
            .scalar_fields()
            .iter()
            .map(|field| field.name())
            .collect::<Vec<_>>()
            .join("\n");
        fragments.insert("base".into(), Fragment::from(base));
        fragments
    }
}
