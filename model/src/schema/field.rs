use super::{FieldData, InputValue, QueryDepth, Schema, Type, TypeRef};
use crate::{registry::Registry, resource::ResourceClass};
use derive_more::Display;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Depth used when rendering a fragment for a connection field.
///
/// Connection payloads sit two levels below the field (`nodes { ... }`, `pageInfo { ... }`), so any
/// shallower bound would render an empty block.
pub const CONNECTION_FRAGMENT_DEPTH: usize = 3;

/// Variable names mapped to their GraphQL type signatures, in declaration order.
pub type VariableTypes = IndexMap<String, String>;

/// A query variable which is not declared as an argument of the field being queried.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display(fmt = "unknown variable type error {}", _0)]
pub struct UnknownVariable(pub String);

impl std::error::Error for UnknownVariable {}

/// Variable declarations and usages, ready to splice into an operation.
///
/// For variables `id: NodeId!` and `name: String`:
/// * `define` is `$id: NodeId!, $name: String`, for the operation header.
/// * `apply` is `id: $id, name: $name`, for the field's argument list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VariableClause {
    pub define: String,
    pub apply: String,
}

impl VariableClause {
    pub fn is_empty(&self) -> bool {
        self.define.is_empty()
    }
}

/// A field of an object or interface type.
#[derive(Clone, Copy, Debug)]
pub struct Field<'a> {
    schema: &'a Schema,
    data: &'a FieldData,
}

impl<'a> Field<'a> {
    pub fn new(schema: &'a Schema, data: &'a FieldData) -> Self {
        Self { schema, data }
    }

    pub fn data(&self) -> &'a FieldData {
        self.data
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn description(&self) -> &'a str {
        self.data.description.as_deref().unwrap_or_default()
    }

    pub fn is_deprecated(&self) -> bool {
        self.data.is_deprecated
    }

    pub fn arguments(&self) -> impl Iterator<Item = InputValue<'a>> + 'a {
        let schema = self.schema;
        self.data
            .args
            .iter()
            .map(move |arg| InputValue::new(schema, arg))
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<InputValue<'a>> {
        self.arguments().filter(|arg| arg.name() == name).last()
    }

    pub fn has_argument(&self, name: &str) -> bool {
        self.argument(name).is_some()
    }

    /// The declared type of this field.
    pub fn type_ref(&self) -> Option<TypeRef<'a>> {
        Some(TypeRef::new(self.schema, self.data.ty.as_ref()?))
    }

    /// The object, interface or input type this field refers to, if any.
    pub fn full_type(&self) -> Option<Type<'a>> {
        self.type_ref()?.full_type()
    }

    pub fn is_connection(&self) -> bool {
        self.full_type().map_or(false, |ty| ty.is_connection())
    }

    /// The resource class registered for the type of this field.
    pub fn resource_class(&self, registry: &Registry) -> Option<Arc<ResourceClass>> {
        self.full_type()?.resource_class(registry)
    }

    pub fn is_node(&self) -> bool {
        self.type_ref().map_or(false, |ty| ty.is_node())
    }

    pub fn is_scalar(&self) -> bool {
        self.type_ref().map_or(false, |ty| ty.is_scalar())
    }

    pub fn is_object(&self) -> bool {
        self.type_ref().map_or(false, |ty| ty.is_object())
    }

    /// Render this field as a line (or block) of a selection set.
    ///
    /// Fields without a nested type render as their bare name. Otherwise the nested type is
    /// rendered one level deeper. If nothing survives the depth bound, the field is replaced by a
    /// comment rather than an empty (invalid) block.
    pub fn to_query_string(&self, depth: QueryDepth) -> String {
        let padding = indent(depth.depth);
        let Some(ty) = self.full_type() else {
            return format!("{padding}{}", self.name());
        };
        let nested = depth.deeper();
        let body = ty.to_query_string(nested);
        if body.trim().is_empty() {
            format!(
                "{padding}# {} is empty (reach max depth: {}/{})",
                self.name(),
                nested.depth,
                nested.max_depth
            )
        } else {
            format!("{padding}{} {{\n{body}\n{padding}}}", self.name())
        }
    }

    /// Render the selection set of this field's type, without the field itself.
    ///
    /// Connection fields always render with a depth bound of [`CONNECTION_FRAGMENT_DEPTH`]. Fields
    /// without a nested type render as their bare name.
    pub fn to_fragment(&self, depth: QueryDepth) -> String {
        match self.full_type() {
            Some(ty) => {
                let max_depth = if ty.is_connection() {
                    CONNECTION_FRAGMENT_DEPTH
                } else {
                    depth.max_depth
                };
                ty.to_query_string(QueryDepth {
                    depth: depth.depth + 1,
                    max_depth,
                })
            }
            None => self.name().to_string(),
        }
    }

    /// Every argument of this field, mapped to its type signature.
    pub fn to_variable_names(&self) -> VariableTypes {
        self.arguments()
            .map(|arg| (arg.name().to_string(), arg.type_ref().signature()))
            .collect()
    }

    /// The type signatures of the given variables, in the order the variables are given.
    ///
    /// # Errors
    ///
    /// Fails with [`UnknownVariable`] if any variable does not correspond to an argument of this
    /// field.
    pub fn query_variable_types(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<VariableTypes, UnknownVariable> {
        let declared = self.to_variable_names();
        variables
            .keys()
            .map(|name| match declared.get(name) {
                Some(signature) => Ok((name.clone(), signature.clone())),
                None => Err(UnknownVariable(name.clone())),
            })
            .collect()
    }

    /// The variable clause passing the given variables to this field.
    pub fn query_variable_object(
        &self,
        variables: &Map<String, Value>,
    ) -> Result<VariableClause, UnknownVariable> {
        Ok(Self::parse_variable_names(&self.query_variable_types(variables)?))
    }

    /// Build a variable clause from variable names and signatures.
    pub fn parse_variable_names<'v, I, K, V>(variables: I) -> VariableClause
    where
        I: IntoIterator<Item = (&'v K, &'v V)>,
        K: AsRef<str> + ?Sized + 'v,
        V: AsRef<str> + ?Sized + 'v,
    {
        let (define, apply): (Vec<_>, Vec<_>) = variables
            .into_iter()
            .map(|(name, signature)| {
                let (name, signature) = (name.as_ref(), signature.as_ref());
                (format!("${name}: {signature}"), format!("{name}: ${name}"))
            })
            .unzip();
        VariableClause {
            define: define.join(", "),
            apply: apply.join(", "),
        }
    }
}

/// Indentation for a selection set line at `depth`.
pub(crate) fn indent(depth: usize) -> String {
    "   ".repeat(depth)
}
