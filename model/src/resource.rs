//! Resource classes and their instances.
//!
//! A [`ResourceClass`] binds a GraphQL object type to the operations used to fetch and delete
//! objects of that type: it knows which root query field lists them, which columns to select by
//! default and which named fragments are available for building selections. A [`Resource`] is one
//! fetched object.
//!
//! Classes are plain definitions. Every operation that needs the schema, the transport or other
//! classes takes the [`Registry`] the class is registered in.

use crate::{
    columns::{format_columns, parse_columns, Column, Fragment, Fragments, FRAGMENT_MAX_DEPTH},
    connection::{Connection, RawPage, PAGE_INFO_SELECTION},
    cursor,
    node_id::{self, NodeId},
    registry::Registry,
    schema::{Field, QueryDepth, Schema, Type},
    transport::FetchPolicy,
};
use anyhow::Error;
use futures::future::try_join_all;
use serde_json::{json, Map, Value};
use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, Mutex, PoisonError},
};

/// Page size requested when a list query does not specify one.
pub const DEFAULT_PAGE_SIZE: u64 = 30;

/// Depth to which nodes are selected when looking them up by ID.
pub const NODE_QUERY_DEPTH: usize = 3;

/// Options for fetching resources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    /// Columns to select, instead of the class's `default` fragment.
    pub columns: Option<Column>,
    /// Variables passed to the query field.
    pub variables: Map<String, Value>,
    pub fetch_policy: FetchPolicy,
    /// Root query field to use instead of the class's own list field.
    pub query_name: Option<String>,
    /// Alias for the root query field in the response.
    pub alias: Option<String>,
}

impl FindOptions {
    pub fn with_columns(mut self, columns: impl Into<Column>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn with_fetch_policy(mut self, fetch_policy: FetchPolicy) -> Self {
        self.fetch_policy = fetch_policy;
        self
    }

    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = Some(query_name.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A resource class, bound to the GraphQL type of the same name.
#[derive(Clone, Debug)]
pub struct ResourceClass {
    name: String,
    plural: String,
    objects_name: String,
    columns: Option<Column>,
    fragments: Fragments<'static>,
}

impl ResourceClass {
    /// A class for the type `name`.
    ///
    /// The plural defaults to `<name>s`, and objects are listed by the root query field named after
    /// the plural in lower camel case (`Post` is listed by `posts`).
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let plural = format!("{name}s");
        Self {
            objects_name: lower_first(&plural),
            plural,
            name,
            columns: None,
            fragments: Default::default(),
        }
    }

    /// Override the plural name, and with it the name of the list query field.
    pub fn with_plural(mut self, plural: impl Into<String>) -> Self {
        self.plural = plural.into();
        self.objects_name = lower_first(&self.plural);
        self
    }

    /// Override the name of the list query field.
    pub fn with_objects_name(mut self, objects_name: impl Into<String>) -> Self {
        self.objects_name = objects_name.into();
        self
    }

    /// Columns selected by default.
    pub fn with_columns(mut self, columns: impl Into<Column>) -> Self {
        self.columns = Some(columns.into());
        self
    }

    /// Define a named fragment, overriding any fragment derived from the schema.
    pub fn with_fragment(
        mut self,
        name: impl Into<String>,
        fragment: impl Into<Fragment<'static>>,
    ) -> Self {
        self.fragments.insert(name.into(), fragment.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn plural(&self) -> &str {
        &self.plural
    }

    pub fn objects_name(&self) -> &str {
        &self.objects_name
    }

    pub fn columns(&self) -> Option<&Column> {
        self.columns.as_ref()
    }

    /// The GraphQL type of this class.
    pub fn ty<'s>(&self, schema: &'s Schema) -> Option<Type<'s>> {
        schema.get_type(&self.name)
    }

    /// The root query field listing objects of this class.
    pub fn query_field<'s>(&self, schema: &'s Schema) -> Option<Field<'s>> {
        schema.get_query(&self.objects_name)
    }

    /// The input type used to create and update objects of this class.
    pub fn input_type<'s>(&self, schema: &'s Schema) -> Option<Type<'s>> {
        self.ty(schema)?.input_type()
    }

    /// The columns selected when none are requested: the configured columns if there are any,
    /// otherwise every field of the type down to the default depth.
    pub fn default_columns(&self, schema: &Schema) -> String {
        match (&self.columns, self.ty(schema)) {
            (Some(columns), _) => format_columns(columns, 0),
            (None, Some(ty)) => ty.to_query_string(QueryDepth::default()),
            (None, None) => String::new(),
        }
    }

    /// The fragments available to column specs of this class.
    ///
    /// Fragments defined on the class take precedence over those derived from its type. There is
    /// always a `default` fragment.
    pub fn fragments<'s>(&self, schema: &'s Schema) -> Fragments<'s> {
        let mut fragments = self
            .ty(schema)
            .map(|ty| ty.to_fragments())
            .unwrap_or_default();
        for (name, fragment) in &self.fragments {
            fragments.insert(name.clone(), fragment.clone());
        }
        if !fragments.contains_key("default") {
            fragments.insert("default".into(), self.default_columns(schema).into());
        }
        fragments
    }

    /// Build the selection for nodes of this class.
    ///
    /// `columns` may contain fragment directives. Without columns, the `default` fragment is used.
    pub fn build_columns(&self, registry: &Registry, columns: Option<&Column>) -> String {
        let fragments = self.fragments(registry.schema());
        match columns {
            Some(columns) => parse_columns(columns, &fragments, Some(registry)),
            None => fragments
                .get("default")
                .map(|fragment| fragment.to_query_string(QueryDepth::max(FRAGMENT_MAX_DEPTH)))
                .unwrap_or_default(),
        }
    }

    /// Build the query listing one page of objects of this class.
    ///
    /// If the query field takes `first` or `after` arguments and `options` does not set them, they
    /// are set to [`DEFAULT_PAGE_SIZE`] and the first cursor respectively.
    ///
    /// # Errors
    ///
    /// Fails if the query field does not exist or if any variable is not one of its arguments.
    pub fn build_gql(&self, registry: &Registry, options: &mut FindOptions) -> Result<String, Error> {
        let field_name = options
            .query_name
            .clone()
            .unwrap_or_else(|| self.objects_name.clone());
        let query_field = registry
            .schema()
            .get_query(&field_name)
            .ok_or_else(|| Error::msg(format!("no query field {field_name} for {}", self.name)))?;

        if query_field.has_argument("first") && is_unset(options.variables.get("first")) {
            options
                .variables
                .insert("first".into(), DEFAULT_PAGE_SIZE.into());
        }
        if query_field.has_argument("after") && is_unset(options.variables.get("after")) {
            options
                .variables
                .insert("after".into(), cursor::encode(0).into());
        }
        let variables = query_field.query_variable_object(&options.variables)?;
        let columns = self.build_columns(registry, options.columns.as_ref());

        let name = match &options.alias {
            Some(alias) => format!("{alias}: {field_name}"),
            None => field_name,
        };
        let define = parenthesize(&variables.define);
        let apply = parenthesize(&variables.apply);
        Ok(format!(
            "query find{plural}{define} {{\n{name}{apply} {{\n{PAGE_INFO_SELECTION}\nnodes {{\n{columns}\n}}\n}}\n}}",
            plural = self.plural,
        ))
    }

    /// Fetch one page of objects of this class, as the raw connection payload.
    pub async fn find_all_raw(
        &self,
        registry: &Registry,
        options: &FindOptions,
    ) -> Result<RawPage, Error> {
        let mut options = options.clone();
        let document = self.build_gql(registry, &mut options)?;
        tracing::info!(class = %self.name, variables = ?options.variables, "find all");
        tracing::debug!("find all document:\n{document}");

        let mut data = registry
            .transport()
            .query(&document, &options.variables, &options.fetch_policy.into())
            .await?
            .into_result()?;
        let key = options
            .alias
            .or(options.query_name)
            .unwrap_or_else(|| self.objects_name.clone());
        let page = data
            .get_mut(&key)
            .map(Value::take)
            .ok_or_else(|| Error::msg(format!("response has no field {key}")))?;
        Ok(serde_json::from_value(page)?)
    }

    /// Fetch one page of objects of this class.
    pub async fn find_all(
        self: &Arc<Self>,
        registry: &Registry,
        options: &FindOptions,
    ) -> Result<Vec<Resource>, Error> {
        let page = self.find_all_raw(registry, options).await?;
        Ok(page
            .nodes
            .into_iter()
            .filter(|node| !node.is_null())
            .map(|node| self.instantiate(node))
            .collect())
    }

    /// Fetch objects by ID, as raw JSON.
    ///
    /// IDs may be global node IDs or IDs local to this class.
    ///
    /// # Errors
    ///
    /// Fails if `ids` is empty or if none of the objects exist.
    pub async fn find_raw(
        &self,
        registry: &Registry,
        ids: &[&str],
        options: &FindOptions,
    ) -> Result<Vec<Value>, Error> {
        if ids.is_empty() {
            return Err(Error::msg("invalid id"));
        }
        let ids: Vec<_> = ids.iter().map(|id| self.ensure_node_id(id)).collect();

        let columns = match &options.columns {
            Some(columns) => self.build_columns(registry, Some(columns)),
            None => {
                let columns = self
                    .ty(registry.schema())
                    .map(|ty| ty.to_query_string(QueryDepth::max(NODE_QUERY_DEPTH)))
                    .unwrap_or_default();
                self.build_columns(registry, Some(&columns.into()))
            }
        };
        let document = format!(
            "query findNodes($ids: [NodeId!]!) {{\nnodes(ids: $ids) {{\n... on {} {{\n{columns}\n}}\n}}\n}}",
            self.name
        );
        let mut variables = options.variables.clone();
        variables.insert("ids".into(), json!(ids));
        tracing::info!(class = %self.name, ?ids, "find");
        tracing::debug!("find document:\n{document}");

        let data = registry
            .transport()
            .query(&document, &variables, &options.fetch_policy.into())
            .await?
            .into_result()?;
        let nodes: Vec<Value> = match data.get("nodes") {
            Some(Value::Array(nodes)) => nodes.iter().filter(|node| !node.is_null()).cloned().collect(),
            _ => vec![],
        };
        if nodes.is_empty() {
            return Err(Error::msg(format!("{} not found: {ids:?}", self.name)));
        }
        Ok(nodes)
    }

    /// Fetch one object by ID.
    pub async fn find(
        self: &Arc<Self>,
        registry: &Registry,
        id: &str,
        options: &FindOptions,
    ) -> Result<Resource, Error> {
        let mut nodes = self.find_raw(registry, &[id], options).await?;
        Ok(self.instantiate(nodes.swap_remove(0)))
    }

    /// Fetch several objects by ID.
    pub async fn find_many(
        self: &Arc<Self>,
        registry: &Registry,
        ids: &[&str],
        options: &FindOptions,
    ) -> Result<Vec<Resource>, Error> {
        let nodes = self.find_raw(registry, ids, options).await?;
        Ok(nodes.into_iter().map(|node| self.instantiate(node)).collect())
    }

    /// Delete an object.
    ///
    /// # Errors
    ///
    /// Fails if the server reports errors for the deletion.
    pub async fn destroy(&self, registry: &Registry, id: &str, soft: bool) -> Result<Value, Error> {
        const DOCUMENT: &str = "mutation($id: NodeId!, $isSoft: Boolean) {\n\
                                deleteNode(id: $id, isSoft: $isSoft) {\n\
                                errors\n\
                                }\n\
                                }";
        let id = self.ensure_node_id(id);
        let mut variables = Map::new();
        variables.insert("id".into(), id.clone().into());
        variables.insert("isSoft".into(), soft.into());
        tracing::info!(class = %self.name, %id, soft, "destroy");

        let mut data = registry
            .transport()
            .mutate(DOCUMENT, &variables)
            .await?
            .into_result()?;
        let payload = data
            .get_mut("deleteNode")
            .map(Value::take)
            .unwrap_or_default();
        match payload.get("errors") {
            Some(Value::Array(errors)) if !errors.is_empty() => Err(Error::msg(format!(
                "failed to delete {id}: {}",
                Value::Array(errors.clone())
            ))),
            _ => Ok(payload),
        }
    }

    /// Delete several objects, concurrently.
    pub async fn destroy_all(
        &self,
        registry: &Registry,
        ids: &[&str],
        soft: bool,
    ) -> Result<Vec<Value>, Error> {
        try_join_all(ids.iter().map(|id| self.destroy(registry, id, soft))).await
    }

    /// A connection paginating over all objects of this class.
    pub fn connection(self: &Arc<Self>, registry: &Arc<Registry>) -> Connection {
        Connection::for_class(self.clone(), registry.clone())
    }

    /// An instance of this class with the given raw attributes.
    pub fn instantiate(self: &Arc<Self>, raw: Value) -> Resource {
        Resource::from_value(Some(self.clone()), raw)
    }

    /// `id` as a global node ID: unchanged if it already is one, otherwise qualified by this class.
    pub fn ensure_node_id(&self, id: &str) -> String {
        if NodeId::parse(id).is_some() {
            id.to_string()
        } else {
            node_id::create(id, Some(&self.name))
        }
    }
}

fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parenthesize(s: &str) -> String {
    if s.is_empty() {
        String::new()
    } else {
        format!("({s})")
    }
}

fn is_unset(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

/// An object fetched from the server.
///
/// Nested connections are materialized lazily by [`connection`](Self::connection) and cached per
/// instance. Cloning a resource copies its attributes but not its cached connections.
pub struct Resource {
    class: Option<Arc<ResourceClass>>,
    attributes: Map<String, Value>,
    connections: Mutex<HashMap<String, Arc<Connection>>>,
}

impl Resource {
    pub fn new(class: Option<Arc<ResourceClass>>, attributes: Map<String, Value>) -> Self {
        Self {
            class,
            attributes,
            connections: Default::default(),
        }
    }

    /// An instance built from a raw JSON object.
    ///
    /// Anything other than an object yields an instance without attributes.
    pub fn from_value(class: Option<Arc<ResourceClass>>, raw: Value) -> Self {
        let attributes = match raw {
            Value::Object(attributes) => attributes,
            raw => {
                tracing::warn!("cannot build a resource from {raw}");
                Map::new()
            }
        };
        Self::new(class, attributes)
    }

    pub fn class(&self) -> Option<&Arc<ResourceClass>> {
        self.class.as_ref()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    pub fn id(&self) -> Option<&Value> {
        self.get("id")
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// The raw JSON object.
    pub fn to_raw(&self) -> Value {
        Value::Object(self.attributes.clone())
    }

    /// The connection stored in the field `name` of this resource.
    ///
    /// The connection is created on first access, starting from whatever page of the field was
    /// fetched along with the resource, and the same connection is returned thereafter.
    pub fn connection(
        self: &Arc<Self>,
        registry: &Arc<Registry>,
        name: &str,
    ) -> Arc<Connection> {
        let mut connections = self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        connections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(Connection::for_resource(self, name, registry.clone())))
            .clone()
    }
}

impl Clone for Resource {
    fn clone(&self) -> Self {
        Self::new(self.class.clone(), self.attributes.clone())
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.class.as_ref().map(|class| class.name()) == other.class.as_ref().map(|class| class.name())
            && self.attributes == other.attributes
    }
}

impl Debug for Resource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Resource")
            .field("class", &self.class.as_ref().map(|class| class.name()))
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        testing,
        transport::{mock::MockTransport, GraphqlErrors},
    };

    fn setup(transport: MockTransport) -> (Arc<MockTransport>, Arc<Registry>) {
        let transport = Arc::new(transport);
        let registry = Arc::new(Registry::new(testing::schema(), transport.clone()));
        (transport, registry)
    }

    #[test]
    fn test_names() {
        let post = ResourceClass::new("Post");
        assert_eq!(post.plural(), "Posts");
        assert_eq!(post.objects_name(), "posts");

        let person = ResourceClass::new("Person").with_plural("People");
        assert_eq!(person.plural(), "People");
        assert_eq!(person.objects_name(), "people");

        let custom = ResourceClass::new("Post").with_objects_name("allPosts");
        assert_eq!(custom.objects_name(), "allPosts");
    }

    #[test]
    fn test_schema_bindings() {
        let schema = testing::schema();
        let post = ResourceClass::new("Post");
        assert_eq!(post.ty(&schema).unwrap().name(), "Post");
        assert_eq!(post.query_field(&schema).unwrap().name(), "posts");
        assert_eq!(post.input_type(&schema).unwrap().name(), "PostAttributes");

        let comment = ResourceClass::new("Comment");
        assert!(comment.query_field(&schema).is_none());
        assert!(comment.input_type(&schema).is_none());
    }

    #[test]
    fn test_fragments() {
        let schema = testing::schema();
        let post = ResourceClass::new("Post").with_fragment("user", "id");
        let fragments = post.fragments(&schema);

        // Class fragments override derived ones.
        assert_eq!(
            fragments["user"].to_query_string(QueryDepth::default()),
            "id"
        );
        assert_eq!(
            fragments["base"].to_query_string(QueryDepth::default()),
            "id\ntitle\ntags"
        );
        assert!(fragments.contains_key("comments"));
        assert_eq!(
            fragments["default"].to_query_string(QueryDepth::default()),
            schema
                .get_type("Post")
                .unwrap()
                .to_query_string(QueryDepth::default())
        );

        let post = ResourceClass::new("Post").with_columns(vec!["id".into(), "title".into()]);
        assert_eq!(
            post.fragments(&schema)["default"].to_query_string(QueryDepth::default()),
            "  id\n  title"
        );

        let post = ResourceClass::new("Post").with_fragment("default", "everything");
        assert_eq!(
            post.fragments(&schema)["default"].to_query_string(QueryDepth::default()),
            "everything"
        );
    }

    #[test]
    fn test_build_columns() {
        let (_, registry) = setup(MockTransport::default());
        let post = registry.register(
            ResourceClass::new("Post").with_columns(vec!["id".into(), "title".into()]),
        );
        registry.register(ResourceClass::new("User"));

        assert_eq!(post.build_columns(&registry, None), "  id\n  title");
        assert_eq!(
            post.build_columns(&registry, Some(&"+=base\n+User.base".into())),
            "id\ntitle\ntags\nid\nname"
        );
        assert_eq!(
            post.build_columns(&registry, Some(&"title\n+user:author".into())),
            "title\nauthor {\n         id\n         name\n}"
        );
    }

    #[test]
    fn test_build_gql() {
        let (_, registry) = setup(MockTransport::default());
        let post = registry.register(ResourceClass::new("Post").with_columns("id"));

        let mut options = FindOptions::default();
        let gql = post.build_gql(&registry, &mut options).unwrap();
        assert_eq!(
            gql,
            format!(
                "query findPosts($first: Int, $after: String) {{\n\
                 posts(first: $first, after: $after) {{\n\
                 {PAGE_INFO_SELECTION}\n\
                 nodes {{\n\
                 id\n\
                 }}\n\
                 }}\n\
                 }}"
            )
        );
        assert_eq!(options.variables["first"], json!(30));
        assert_eq!(options.variables["after"], json!(cursor::encode(0)));

        // Explicit values are kept.
        let mut options = FindOptions::default()
            .with_variable("first", 5)
            .with_alias("recent");
        let gql = post.build_gql(&registry, &mut options).unwrap();
        assert!(gql.contains("recent: posts(first: $first, after: $after)"), "{gql}");
        assert_eq!(options.variables["first"], json!(5));
    }

    #[test]
    fn test_build_gql_errors() {
        let (_, registry) = setup(MockTransport::default());

        let post = registry.register(ResourceClass::new("Post"));
        let err = post
            .build_gql(
                &registry,
                &mut FindOptions::default().with_variable("nope", 1),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown variable type error nope");

        let comment = registry.register(ResourceClass::new("Comment"));
        comment
            .build_gql(&registry, &mut FindOptions::default())
            .unwrap_err();
    }

    #[async_std::test]
    async fn test_find_all() {
        let (transport, registry) = setup(MockTransport::default().respond(json!({
            "posts": {
                "pageInfo": {
                    "hasNextPage": false,
                    "hasPreviousPage": false,
                    "startCursor": "MQ==",
                    "endCursor": "Mg==",
                },
                "nodes": [{ "id": "1" }, null, { "id": "2" }],
            },
        })));
        let post = registry.register(ResourceClass::new("Post").with_columns("id"));

        let posts = post
            .find_all(&registry, &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id(), Some(&json!("1")));
        assert_eq!(posts[1].class().unwrap().name(), "Post");

        let requests = transport.requests();
        assert!(requests[0].document.starts_with("query findPosts"));
        assert_eq!(requests[0].variables["first"], json!(30));
        assert_eq!(
            requests[0].options.unwrap().fetch_policy,
            FetchPolicy::NetworkOnly
        );
    }

    #[async_std::test]
    async fn test_find_all_errors() {
        let (_, registry) = setup(MockTransport::default().respond_error("forbidden"));
        let post = registry.register(ResourceClass::new("Post"));
        let err = post
            .find_all_raw(&registry, &FindOptions::default())
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<GraphqlErrors>().is_some());
    }

    #[async_std::test]
    async fn test_find() {
        let (transport, registry) = setup(
            MockTransport::default()
                .respond(json!({ "nodes": [{ "id": "1", "title": "Hello" }] }))
                .respond(json!({ "nodes": [] })),
        );
        let post = registry.register(ResourceClass::new("Post"));

        let found = post
            .find(&registry, "1", &FindOptions::default())
            .await
            .unwrap();
        assert_eq!(found.get("title"), Some(&json!("Hello")));

        let requests = transport.requests();
        assert!(requests[0].document.contains("... on Post {"));
        assert!(requests[0].document.contains("nodes(ids: $ids)"));
        assert_eq!(
            requests[0].variables["ids"],
            json!([node_id::create("1", Some("Post"))])
        );

        post.find(&registry, "2", &FindOptions::default())
            .await
            .unwrap_err();
        post.find_many(&registry, &[], &FindOptions::default())
            .await
            .unwrap_err();
    }

    #[test]
    fn test_ensure_node_id() {
        let post = ResourceClass::new("Post");
        let id = node_id::create("1", Some("User"));
        assert_eq!(post.ensure_node_id(&id), id);
        assert_eq!(post.ensure_node_id("1"), node_id::create("1", Some("Post")));
    }

    #[async_std::test]
    async fn test_destroy() {
        let (transport, registry) = setup(
            MockTransport::default()
                .respond(json!({ "deleteNode": { "errors": [] } }))
                .respond(json!({ "deleteNode": { "errors": ["not allowed"] } })),
        );
        let post = registry.register(ResourceClass::new("Post"));

        post.destroy(&registry, "1", true).await.unwrap();
        let requests = transport.requests();
        assert!(requests[0].document.contains("deleteNode(id: $id, isSoft: $isSoft)"));
        assert_eq!(requests[0].options, None);
        assert_eq!(requests[0].variables["isSoft"], json!(true));
        assert_eq!(
            requests[0].variables["id"],
            json!(node_id::create("1", Some("Post")))
        );

        let err = post.destroy(&registry, "2", false).await.unwrap_err();
        assert!(err.to_string().contains("not allowed"), "{err}");
    }

    #[async_std::test]
    async fn test_destroy_all() {
        let (transport, registry) = setup(
            MockTransport::default()
                .respond(json!({ "deleteNode": { "errors": [] } }))
                .respond(json!({ "deleteNode": { "errors": [] } })),
        );
        let post = registry.register(ResourceClass::new("Post"));
        let results = post.destroy_all(&registry, &["1", "2"], false).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(transport.requests().len(), 2);
    }

    #[test]
    fn test_resource() {
        let post = Arc::new(ResourceClass::new("Post"));
        let resource = post.instantiate(json!({ "id": "1", "title": "Hello" }));
        assert_eq!(resource.id(), Some(&json!("1")));
        assert_eq!(resource.get("title"), Some(&json!("Hello")));
        assert_eq!(resource.to_raw(), json!({ "id": "1", "title": "Hello" }));
        assert_eq!(resource.clone(), resource);

        let bare = Resource::from_value(None, json!(1));
        assert!(bare.attributes().is_empty());
        assert!(bare.id().is_none());
    }

    #[test]
    fn test_resource_connection_cache() {
        let (_, registry) = setup(MockTransport::default());
        let post = registry.register(ResourceClass::new("Post"));
        let resource = Arc::new(post.instantiate(json!({ "id": "1" })));

        let comments = resource.connection(&registry, "comments");
        assert!(Arc::ptr_eq(&comments, &resource.connection(&registry, "comments")));
        assert!(!Arc::ptr_eq(&comments, &resource.connection(&registry, "other")));

        // Clones start with an empty cache.
        let copy = Arc::new((*resource).clone());
        assert!(!Arc::ptr_eq(&comments, &copy.connection(&registry, "comments")));
    }
}
