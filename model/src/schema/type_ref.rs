use super::{Schema, Type, TypeKind, TypeRefData};

/// A possibly wrapped reference to a named type.
///
/// A reference is a chain of layers, outermost first: zero or more `LIST`/`NON_NULL` wrappers
/// terminating in a named type. For example, `[String!]!` is
/// `NON_NULL -> LIST -> NON_NULL -> SCALAR(String)`.
#[derive(Clone, Copy, Debug)]
pub struct TypeRef<'a> {
    schema: &'a Schema,
    data: &'a TypeRefData,
}

impl<'a> TypeRef<'a> {
    pub fn new(schema: &'a Schema, data: &'a TypeRefData) -> Self {
        Self { schema, data }
    }

    /// The raw outermost layer.
    pub fn data(&self) -> &'a TypeRefData {
        self.data
    }

    /// The kind of the outermost layer.
    pub fn kind(&self) -> TypeKind {
        self.data.kind
    }

    /// Every layer of the chain, from the outermost wrapper to the innermost named type.
    pub fn of_types(&self) -> Vec<&'a TypeRefData> {
        let mut layers = vec![self.data];
        let mut layer = self.data;
        while let Some(inner) = &layer.of_type {
            layers.push(inner);
            layer = inner;
        }
        layers
    }

    /// The innermost layer, which names the referenced type.
    pub fn innermost(&self) -> &'a TypeRefData {
        let mut layer = self.data;
        while let Some(inner) = &layer.of_type {
            layer = inner;
        }
        layer
    }

    /// The reference with its outermost layer removed.
    pub fn of_type(&self) -> Option<TypeRef<'a>> {
        Some(Self::new(self.schema, self.data.of_type.as_deref()?))
    }

    /// The name of the referenced type.
    pub fn name(&self) -> &'a str {
        self.innermost().name.as_deref().unwrap_or_default()
    }

    fn has_layer(&self, kind: TypeKind) -> bool {
        self.of_types().iter().any(|layer| layer.kind == kind)
    }

    pub fn is_scalar(&self) -> bool {
        self.has_layer(TypeKind::Scalar)
    }

    pub fn is_object(&self) -> bool {
        self.has_layer(TypeKind::Object)
    }

    pub fn is_list(&self) -> bool {
        self.has_layer(TypeKind::List)
    }

    /// Whether the outermost layer is `NON_NULL`.
    ///
    /// Inner `NON_NULL` layers (such as the element layer of `[T!]`) are not considered.
    pub fn is_non_null(&self) -> bool {
        self.data.kind == TypeKind::NonNull
    }

    pub fn is_null(&self) -> bool {
        !self.is_non_null()
    }

    /// Whether the layer immediately outside the first `LIST` layer is `NON_NULL`.
    pub fn is_list_non_null(&self) -> bool {
        let layers = self.of_types();
        match layers.iter().position(|layer| layer.kind == TypeKind::List) {
            Some(index) if index > 0 => layers[index - 1].kind == TypeKind::NonNull,
            _ => false,
        }
    }

    /// The GraphQL signature of this reference, such as `String`, `[Post!]` or `NodeId!`.
    ///
    /// Every layer of the chain is rendered, not only the outermost and pre-list ones, so this
    /// renders every producible shape exactly: `T`, `T!`, `[T]`, `[T]!`, `[T!]` and `[T!]!`.
    pub fn signature(&self) -> String {
        fn render(layer: &TypeRefData) -> String {
            match (layer.kind, &layer.of_type) {
                (TypeKind::NonNull, Some(inner)) => format!("{}!", render(inner)),
                (TypeKind::List, Some(inner)) => format!("[{}]", render(inner)),
                _ => layer.name.clone().unwrap_or_default(),
            }
        }
        render(self.data)
    }

    /// The definition of the referenced type, if it has fields of its own.
    ///
    /// Only object, interface and input object types resolve; scalars, enums and unions have no
    /// full type.
    pub fn full_type(&self) -> Option<Type<'a>> {
        let innermost = self.innermost();
        match innermost.kind {
            TypeKind::Object | TypeKind::Interface | TypeKind::InputObject => {
                self.schema.get_type(innermost.name.as_deref()?)
            }
            _ => None,
        }
    }

    /// Whether the referenced type implements the `Node` interface.
    pub fn is_node(&self) -> bool {
        self.full_type().map_or(false, |ty| ty.is_node())
    }
}
