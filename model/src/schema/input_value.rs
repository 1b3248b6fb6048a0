use super::{InputValueData, Schema, Type, TypeRef};

/// An argument of a field, or a field of an input object type.
#[derive(Clone, Copy, Debug)]
pub struct InputValue<'a> {
    schema: &'a Schema,
    data: &'a InputValueData,
}

impl<'a> InputValue<'a> {
    pub fn new(schema: &'a Schema, data: &'a InputValueData) -> Self {
        Self { schema, data }
    }

    pub fn name(&self) -> &'a str {
        &self.data.name
    }

    pub fn description(&self) -> Option<&'a str> {
        self.data.description.as_deref()
    }

    /// The default value, as a GraphQL literal.
    pub fn default_value(&self) -> Option<&'a str> {
        self.data.default_value.as_deref()
    }

    pub fn type_ref(&self) -> TypeRef<'a> {
        TypeRef::new(self.schema, &self.data.ty)
    }

    pub fn full_type(&self) -> Option<Type<'a>> {
        self.type_ref().full_type()
    }
}
