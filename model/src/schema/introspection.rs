//! Raw introspection data, as returned by the standard introspection query.
//!
//! These types are plain data. The [`Schema`](super::Schema) index and the descriptor wrappers in
//! the sibling modules interpret them.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// The standard introspection query.
pub const INTROSPECTION_QUERY: &str = r#"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#;

/// The kind of a GraphQL type.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumString,
    Deserialize,
    Serialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
    List,
    NonNull,
}

/// The top-level introspection payload.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaData {
    pub query_type: Option<NamedTypeData>,
    pub mutation_type: Option<NamedTypeData>,
    pub subscription_type: Option<NamedTypeData>,
    #[serde(default)]
    pub types: Vec<TypeData>,
    #[serde(default)]
    pub directives: Vec<DirectiveData>,
}

/// A reference to a root operation type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct NamedTypeData {
    pub name: String,
}

/// A named type definition.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeData {
    pub kind: TypeKind,
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<FieldData>>,
    #[serde(default)]
    pub input_fields: Option<Vec<InputValueData>>,
    #[serde(default)]
    pub interfaces: Option<Vec<TypeRefData>>,
    #[serde(default)]
    pub enum_values: Option<Vec<EnumValueData>>,
    #[serde(default)]
    pub possible_types: Option<Vec<TypeRefData>>,
}

/// A field of an object or interface type.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub args: Vec<InputValueData>,
    #[serde(rename = "type", default)]
    pub ty: Option<TypeRefData>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// An argument or an input object field.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValueData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub ty: TypeRefData,
    #[serde(default)]
    pub default_value: Option<String>,
}

/// One layer of a possibly wrapped type reference.
///
/// `LIST` and `NON_NULL` layers are unnamed and wrap `of_type`; the innermost layer is named.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeRefData {
    pub kind: TypeKind,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub of_type: Option<Box<TypeRefData>>,
}

impl TypeRefData {
    /// A reference to the named type `name`.
    pub fn named(kind: TypeKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: Some(name.into()),
            of_type: None,
        }
    }

    /// Wrap this reference in a `NON_NULL` layer.
    pub fn non_null(self) -> Self {
        Self::wrap(TypeKind::NonNull, self)
    }

    /// Wrap this reference in a `LIST` layer.
    pub fn list(self) -> Self {
        Self::wrap(TypeKind::List, self)
    }

    fn wrap(kind: TypeKind, inner: Self) -> Self {
        Self {
            kind,
            name: None,
            of_type: Some(Box::new(inner)),
        }
    }
}

/// A value of an enum type.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValueData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_deprecated: bool,
    #[serde(default)]
    pub deprecation_reason: Option<String>,
}

/// A directive definition.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DirectiveData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default)]
    pub args: Vec<InputValueData>,
}
