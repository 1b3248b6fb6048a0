//! Cursor-paginated lists of resources.
//!
//! A [`Connection`] holds the pages of a paginated list fetched so far, along with the pagination
//! state needed to fetch the next page. It is owned either by a [`ResourceClass`] (paginating over
//! every object of the class) or by a [`Resource`] (paginating over a connection field of that
//! object).
//!
//! Nodes may also be added and removed locally. Local insertions are given synthetic cursors (see
//! [`cursor`](crate::cursor)) extending the current page bounds, so the connection remains
//! consistent with however much the server has sent.
//!
//! All state lives behind a mutex which is never held across an `await`, so a connection can be
//! shared between tasks. At most one [`load_more`](Connection::load_more) runs at a time.

use crate::{
    columns::{parse_columns, Fragments},
    cursor,
    registry::Registry,
    resource::{FindOptions, Resource, ResourceClass},
    schema::QueryDepth,
};
use anyhow::Error;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};

/// The selection set requesting every page info field.
pub const PAGE_INFO_SELECTION: &str = "pageInfo {\n\
                                       hasNextPage\n\
                                       hasPreviousPage\n\
                                       startCursor\n\
                                       endCursor\n\
                                       }";

/// Pagination state of a connection.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
    pub has_previous_page: bool,
    pub start_cursor: Option<String>,
    pub end_cursor: Option<String>,
}

impl Default for PageInfo {
    /// Nothing loaded yet, with more to come.
    fn default() -> Self {
        Self {
            has_next_page: true,
            has_previous_page: false,
            start_cursor: Some(cursor::encode(0)),
            end_cursor: Some(cursor::encode(0)),
        }
    }
}

/// A node together with its position in a connection.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Edge {
    #[serde(default)]
    pub node: Value,
    pub cursor: String,
}

/// A page of a connection as it appears in a response.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPage {
    #[serde(default)]
    pub nodes: Vec<Value>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub page_info: Option<PageInfo>,
}

/// A page of resources.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Page {
    pub nodes: Vec<Resource>,
    pub edges: Vec<Edge>,
    /// Page info replacing the connection's, if any.
    pub page_info: Option<PageInfo>,
}

impl Page {
    pub fn new(nodes: Vec<Resource>) -> Self {
        Self {
            nodes,
            ..Default::default()
        }
    }

    pub fn with_page_info(mut self, page_info: PageInfo) -> Self {
        self.page_info = Some(page_info);
        self
    }

    /// Give every node exactly one edge.
    ///
    /// Surplus edges are dropped. Nodes without an edge get one with a cursor counting up from
    /// `after`.
    fn align(mut self, after: Option<&str>) -> Self {
        self.edges.truncate(self.nodes.len());
        let mut last = after.map(str::to_string);
        for node in &self.nodes[self.edges.len()..] {
            let cursor = cursor::next(last.as_deref());
            self.edges.push(Edge {
                node: node.to_raw(),
                cursor: cursor.clone(),
            });
            last = Some(cursor);
        }
        self
    }
}

/// Reasons [`Connection::load_more`] refuses to run.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum LoadError {
    /// Another load is in flight.
    #[display(fmt = "loading")]
    Loading,
    /// There are no more pages.
    #[display(fmt = "complete")]
    Complete,
    #[display(fmt = "the resource owning this connection no longer exists")]
    OwnerDropped,
}

impl std::error::Error for LoadError {}

/// Where the pages of a connection come from.
#[derive(Clone, Debug)]
enum Owner {
    /// The list query of a resource class.
    Class(Arc<ResourceClass>),
    /// A connection field of a resource.
    Resource {
        resource: Weak<Resource>,
        connection_name: String,
    },
}

#[derive(Clone, Debug, Default)]
struct State {
    nodes: Vec<Resource>,
    edges: Vec<Edge>,
    page_info: PageInfo,
    error: Option<String>,
    find_options: FindOptions,
}

/// Marks a connection as loading for as long as it lives.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(loading: &'a AtomicBool) -> Result<Self, LoadError> {
        loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| LoadError::Loading)?;
        Ok(Self(loading))
    }
}

impl<'a> Drop for LoadingGuard<'a> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// A paginated list of resources.
#[derive(Debug)]
pub struct Connection {
    owner: Owner,
    /// The class of the nodes.
    resource_class: Option<Arc<ResourceClass>>,
    registry: Arc<Registry>,
    loading: AtomicBool,
    state: Mutex<State>,
}

impl Connection {
    /// An empty connection over all objects of `class`.
    pub fn for_class(class: Arc<ResourceClass>, registry: Arc<Registry>) -> Self {
        Self {
            owner: Owner::Class(class.clone()),
            resource_class: Some(class),
            registry,
            loading: AtomicBool::new(false),
            state: Default::default(),
        }
    }

    /// The connection in the field `name` of `resource`.
    ///
    /// The connection starts out with whatever page of the field was fetched along with the
    /// resource. Its nodes are instances of the resource class registered for the field's type.
    pub fn for_resource(resource: &Arc<Resource>, name: &str, registry: Arc<Registry>) -> Self {
        let resource_class = resource
            .class()
            .and_then(|class| class.ty(registry.schema()))
            .and_then(|ty| ty.field(name))
            .and_then(|field| field.resource_class(&registry));
        let connection = Self {
            owner: Owner::Resource {
                resource: Arc::downgrade(resource),
                connection_name: name.to_string(),
            },
            resource_class,
            registry,
            loading: AtomicBool::new(false),
            state: Default::default(),
        };

        if let Some(raw) = resource.get(name).filter(|raw| !raw.is_null()) {
            match serde_json::from_value::<RawPage>(raw.clone()) {
                Ok(raw) => {
                    let page = connection.materialize(raw);
                    connection.replace(page);
                }
                Err(err) => tracing::warn!("ignoring malformed connection {name}: {err}"),
            }
        }
        connection
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn resource_class(&self) -> Option<&Arc<ResourceClass>> {
        self.resource_class.as_ref()
    }

    pub fn len(&self) -> usize {
        self.lock().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Whether every page has been loaded.
    pub fn is_completed(&self) -> bool {
        !self.lock().page_info.has_next_page
    }

    pub fn set_completed(&self, completed: bool) {
        self.lock().page_info.has_next_page = !completed;
    }

    /// The error from the last failed load, if it has not been cleared.
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    pub fn nodes(&self) -> Vec<Resource> {
        self.lock().nodes.clone()
    }

    pub fn edges(&self) -> Vec<Edge> {
        self.lock().edges.clone()
    }

    pub fn page_info(&self) -> PageInfo {
        self.lock().page_info.clone()
    }

    /// Everything loaded so far, as a single page.
    pub fn page(&self) -> Page {
        let state = self.lock();
        Page {
            nodes: state.nodes.clone(),
            edges: state.edges.clone(),
            page_info: Some(state.page_info.clone()),
        }
    }

    pub fn find_options(&self) -> FindOptions {
        self.lock().find_options.clone()
    }

    /// Options used for every subsequent load.
    pub fn set_find_options(&self, options: FindOptions) {
        self.lock().find_options = options;
    }

    /// The GraphQL type name of this connection.
    pub fn typename(&self) -> String {
        if let Owner::Resource {
            resource,
            connection_name,
        } = &self.owner
        {
            let typename = resource.upgrade().and_then(|resource| {
                resource
                    .get(connection_name)?
                    .get("__typename")?
                    .as_str()
                    .map(str::to_string)
            });
            if let Some(typename) = typename {
                return typename;
            }
        }
        match &self.resource_class {
            Some(class) => format!("{}Connection", class.name()),
            None => "Connection".into(),
        }
    }

    /// This connection in the shape of a response.
    pub fn to_raw(&self) -> Value {
        let typename = self.typename();
        let state = self.lock();
        json!({
            "__typename": typename,
            "nodes": state.nodes.iter().map(Resource::to_raw).collect::<Vec<_>>(),
            "edges": state.edges,
            "pageInfo": state.page_info,
        })
    }

    /// Add a node at the end, after the current end cursor.
    pub fn append(&self, node: Resource) -> &Self {
        let mut state = self.lock();
        let cursor = cursor::next(state.page_info.end_cursor.as_deref());
        state.edges.push(Edge {
            node: node.to_raw(),
            cursor: cursor.clone(),
        });
        state.nodes.push(node);
        state.page_info.end_cursor = Some(cursor);
        self
    }

    /// Add a node at the start, before the current start cursor.
    pub fn prepend(&self, node: Resource) -> &Self {
        let mut state = self.lock();
        let cursor = cursor::previous(state.page_info.start_cursor.as_deref());
        state.edges.insert(
            0,
            Edge {
                node: node.to_raw(),
                cursor: cursor.clone(),
            },
        );
        state.nodes.insert(0, node);
        state.page_info.start_cursor = Some(cursor);
        self
    }

    /// Add a node at `index`, or at the end if `index` is out of range.
    ///
    /// The node's cursor extends the end cursor wherever the node lands.
    pub fn insert(&self, node: Resource, index: usize) -> &Self {
        let mut state = self.lock();
        let index = index.min(state.nodes.len());
        let cursor = cursor::next(state.page_info.end_cursor.as_deref());
        state.edges.insert(
            index,
            Edge {
                node: node.to_raw(),
                cursor: cursor.clone(),
            },
        );
        state.nodes.insert(index, node);
        state.page_info.end_cursor = Some(cursor);
        self
    }

    /// Remove the node with the given ID, returning whether there was one.
    pub fn remove<I>(&self, id: &I) -> bool
    where
        I: ?Sized,
        Value: PartialEq<I>,
    {
        let mut state = self.lock();
        let Some(index) = state
            .nodes
            .iter()
            .position(|node| node.id().map_or(false, |node_id| node_id == id))
        else {
            return false;
        };
        state.nodes.remove(index);
        if index < state.edges.len() {
            state.edges.remove(index);
        }
        true
    }

    /// Add a page at the end.
    ///
    /// The page's page info, if any, replaces the current page info.
    pub fn merge(&self, page: Page) -> &Self {
        let mut state = self.lock();
        let page = page.align(state.page_info.end_cursor.as_deref());
        state.nodes.extend(page.nodes);
        state.edges.extend(page.edges);
        if let Some(page_info) = page.page_info {
            state.page_info = page_info;
        }
        self
    }

    /// Replace the contents wholesale.
    ///
    /// Without page info in `page`, pagination starts over.
    pub fn replace(&self, page: Page) -> &Self {
        let mut state = self.lock();
        let page = page.align(None);
        state.nodes = page.nodes;
        state.edges = page.edges;
        state.page_info = page.page_info.unwrap_or_default();
        self
    }

    /// Drop every node and start pagination over.
    pub fn reset(&self) -> &Self {
        let mut state = self.lock();
        state.nodes.clear();
        state.edges.clear();
        state.page_info = Default::default();
        state.error = None;
        self
    }

    /// Reload from where pagination left off, even if it was complete.
    pub async fn refresh(&self) -> Result<Option<Page>, Error> {
        self.set_completed(false);
        self.load_more().await
    }

    /// Fetch the page after the end cursor and add it to the connection.
    ///
    /// Returns the page that was added, and clears any error from an earlier load. For a connection
    /// owned by a class, a failed fetch marks the connection complete, records the error and
    /// returns `Ok(None)`. For a connection owned by a resource, the error is recorded and
    /// returned, and the connection can be loaded again.
    ///
    /// # Errors
    ///
    /// Fails with [`LoadError::Loading`] if another load is in flight and with
    /// [`LoadError::Complete`] if there are no more pages.
    pub async fn load_more(&self) -> Result<Option<Page>, Error> {
        let _guard = LoadingGuard::acquire(&self.loading)?;
        let options = {
            let state = self.lock();
            if !state.page_info.has_next_page {
                return Err(LoadError::Complete.into());
            }
            let mut options = state.find_options.clone();
            options.variables.insert(
                "after".into(),
                state
                    .page_info
                    .end_cursor
                    .clone()
                    .map_or(Value::Null, Value::String),
            );
            options
        };

        match &self.owner {
            Owner::Class(class) => self.load_more_by_class(class, options).await,
            Owner::Resource {
                resource,
                connection_name,
            } => {
                self.load_more_by_resource(resource, connection_name, options)
                    .await
            }
        }
    }

    async fn load_more_by_class(
        &self,
        class: &ResourceClass,
        options: FindOptions,
    ) -> Result<Option<Page>, Error> {
        match class.find_all_raw(&self.registry, &options).await {
            Ok(raw) => {
                let page = self.materialize(raw);
                self.merge(page.clone());
                self.lock().error = None;
                Ok(Some(page))
            }
            Err(err) => {
                tracing::warn!("loading more {} failed: {err:#}", class.plural());
                let mut state = self.lock();
                state.page_info.has_next_page = false;
                state.error = Some(err.to_string());
                Ok(None)
            }
        }
    }

    async fn load_more_by_resource(
        &self,
        resource: &Weak<Resource>,
        connection_name: &str,
        mut options: FindOptions,
    ) -> Result<Option<Page>, Error> {
        let result: Result<RawPage, Error> = async {
            let resource = resource.upgrade().ok_or(LoadError::OwnerDropped)?;
            let id = resource
                .id()
                .cloned()
                .ok_or_else(|| Error::msg("resource has no id"))?;
            let document = self.resource_query_string(&options, false)?;
            options.variables.insert("id".into(), id);
            tracing::info!(connection = connection_name, variables = ?options.variables, "load more");
            tracing::debug!("load more document:\n{document}");

            let mut data = self
                .registry
                .transport()
                .query(&document, &options.variables, &options.fetch_policy.into())
                .await?
                .into_result()?;
            let raw = data
                .get_mut("node")
                .and_then(|node| node.get_mut(connection_name))
                .map(Value::take)
                .ok_or_else(|| Error::msg(format!("response has no node.{connection_name}")))?;
            Ok(serde_json::from_value(raw)?)
        }
        .await;

        match result {
            Ok(raw) => {
                let page = self.materialize(raw);
                self.merge(page.clone());
                self.lock().error = None;
                Ok(Some(page))
            }
            Err(err) => {
                tracing::warn!("loading more {connection_name} failed: {err:#}");
                self.lock().error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// The query fetching the next page of a connection owned by a resource.
    ///
    /// With `bare`, only the selection of the connection field is returned, without the enclosing
    /// node query. Variables are validated against the arguments of the connection field; `id`
    /// is reserved for the owning node.
    pub fn resource_query_string(&self, options: &FindOptions, bare: bool) -> Result<String, Error> {
        let Owner::Resource {
            resource,
            connection_name,
        } = &self.owner
        else {
            return Err(Error::msg("connection is not owned by a resource"));
        };
        let resource = resource.upgrade().ok_or(LoadError::OwnerDropped)?;
        let owner_class = resource
            .class()
            .ok_or_else(|| Error::msg("resource has no class"))?;
        let schema = self.registry.schema();
        let field = owner_class
            .ty(schema)
            .and_then(|ty| ty.field(connection_name))
            .ok_or_else(|| {
                Error::msg(format!(
                    "{} has no field {connection_name}",
                    owner_class.name()
                ))
            })?;

        let mut variables = options.variables.clone();
        variables.remove("id");
        let clause = field.query_variable_object(&variables)?;

        let columns = match &self.resource_class {
            Some(class) => class.build_columns(&self.registry, options.columns.as_ref()),
            None => match &options.columns {
                Some(columns) => parse_columns(columns, &Fragments::new(), Some(&*self.registry)),
                None => field
                    .full_type()
                    .and_then(|ty| ty.field("nodes"))
                    .and_then(|nodes| nodes.full_type())
                    .map(|ty| ty.to_query_string(QueryDepth::default()))
                    .unwrap_or_default(),
            },
        };
        let apply = if clause.apply.is_empty() {
            String::new()
        } else {
            format!("({})", clause.apply)
        };
        let selection = format!(
            "{connection_name}{apply} {{\n{PAGE_INFO_SELECTION}\nnodes {{\n{columns}\n}}\n}}"
        );
        if bare {
            return Ok(selection);
        }

        let define = if clause.define.is_empty() {
            String::new()
        } else {
            format!(", {}", clause.define)
        };
        Ok(format!(
            "query($id: NodeId!{define}) {{\nnode(id: $id) {{\n... on {} {{\n{selection}\n}}\n}}\n}}",
            owner_class.name()
        ))
    }

    /// Convert a raw page, dropping null nodes, and give its nodes edges following the current end
    /// cursor.
    fn materialize(&self, raw: RawPage) -> Page {
        let mut edges = raw.edges.into_iter();
        let mut page = Page {
            page_info: raw.page_info,
            ..Default::default()
        };
        for node in raw.nodes {
            let edge = edges.next();
            if node.is_null() {
                continue;
            }
            page.edges.extend(edge);
            page.nodes
                .push(Resource::from_value(self.resource_class.clone(), node));
        }
        let end_cursor = self.lock().page_info.end_cursor.clone();
        page.align(end_cursor.as_deref())
    }
}

impl Clone for Connection {
    /// A deep copy of the loaded nodes and pagination state.
    ///
    /// The copy is not loading, and has no error.
    fn clone(&self) -> Self {
        let mut state = self.lock().clone();
        state.error = None;
        Self {
            owner: self.owner.clone(),
            resource_class: self.resource_class.clone(),
            registry: self.registry.clone(),
            loading: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{testing, transport::mock::MockTransport};
    use base64::prelude::*;
    use futures::{pin_mut, poll};
    use std::task::Poll;

    fn setup(transport: MockTransport) -> (Arc<MockTransport>, Arc<Registry>) {
        let transport = Arc::new(transport);
        let registry = Arc::new(Registry::new(testing::schema(), transport.clone()));
        registry.register(ResourceClass::new("Post").with_columns("id"));
        registry.register(ResourceClass::new("Comment").with_columns("body"));
        (transport, registry)
    }

    fn posts(registry: &Arc<Registry>) -> Connection {
        registry.get("Post").unwrap().connection(registry)
    }

    fn post(registry: &Registry, id: &str) -> Resource {
        registry.get("Post").unwrap().instantiate(json!({ "id": id }))
    }

    fn page_json(ids: &[&str], has_next_page: bool, end_cursor: &str) -> Value {
        json!({
            "pageInfo": {
                "hasNextPage": has_next_page,
                "hasPreviousPage": false,
                "startCursor": cursor::encode(1),
                "endCursor": end_cursor,
            },
            "nodes": ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>(),
        })
    }

    #[test]
    fn test_defaults() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);
        assert!(conn.is_empty());
        assert!(!conn.is_completed());
        assert!(!conn.is_loading());
        assert_eq!(conn.error(), None);
        assert_eq!(
            conn.page_info(),
            PageInfo {
                has_next_page: true,
                has_previous_page: false,
                start_cursor: Some(cursor::encode(0)),
                end_cursor: Some(cursor::encode(0)),
            }
        );
        assert_eq!(conn.typename(), "PostConnection");
    }

    #[test]
    fn test_append_remove() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);

        conn.append(post(&registry, "1")).append(post(&registry, "2"));
        assert_eq!(conn.len(), 2);
        assert_eq!(conn.edges().len(), 2);
        assert_eq!(conn.edges()[1].cursor, cursor::encode(2));
        assert_eq!(conn.page_info().end_cursor, Some(cursor::encode(2)));

        assert!(conn.remove("1"));
        assert!(!conn.remove("1"));
        assert_eq!(conn.len(), 1);
        assert_eq!(conn.edges().len(), 1);
        assert_eq!(conn.nodes()[0].id(), Some(&json!("2")));
    }

    #[test]
    fn test_prepend_insert() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);

        conn.prepend(post(&registry, "a"));
        assert_eq!(conn.edges()[0].cursor, cursor::encode(-1));
        assert_eq!(conn.page_info().start_cursor, Some(cursor::encode(-1)));

        conn.append(post(&registry, "c"));
        conn.insert(post(&registry, "b"), 1);
        let ids: Vec<_> = conn.nodes().iter().map(|n| n.id().cloned()).collect();
        assert_eq!(ids, [Some(json!("a")), Some(json!("b")), Some(json!("c"))]);
        assert_eq!(conn.edges()[1].cursor, cursor::encode(2));
        assert_eq!(conn.page_info().end_cursor, Some(cursor::encode(2)));

        // Out of range indices insert at the end.
        conn.insert(post(&registry, "d"), 100);
        assert_eq!(conn.nodes()[3].id(), Some(&json!("d")));
    }

    #[test]
    fn test_nodes_and_edges_stay_paired() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);
        let paired = |conn: &Connection| {
            assert_eq!(conn.nodes().len(), conn.edges().len());
            conn.len()
        };

        conn.prepend(post(&registry, "1"));
        assert_eq!(paired(&conn), 1);
        conn.insert(post(&registry, "2"), 1);
        assert_eq!(paired(&conn), 2);
        conn.append(post(&registry, "3"));
        assert_eq!(paired(&conn), 3);
        conn.remove("2");
        assert_eq!(paired(&conn), 2);
        conn.remove("nope");
        assert_eq!(paired(&conn), 2);

        // A page whose edges do not match its nodes is repaired on the way in.
        let mut page = Page::new(vec![post(&registry, "4"), post(&registry, "5")]);
        page.edges.push(Edge {
            node: json!({ "id": "4" }),
            cursor: cursor::encode(10),
        });
        conn.merge(page);
        assert_eq!(paired(&conn), 4);
        assert_eq!(conn.edges()[2].cursor, cursor::encode(10));

        let mut page = Page::new(vec![post(&registry, "6")]);
        for i in 0..3 {
            page.edges.push(Edge {
                node: Value::Null,
                cursor: cursor::encode(i),
            });
        }
        conn.replace(page);
        assert_eq!(paired(&conn), 1);
        conn.remove("6");
        assert_eq!(paired(&conn), 0);
    }

    #[test]
    fn test_append_after_extreme_cursor() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);
        let at = |end_cursor: String| PageInfo {
            end_cursor: Some(end_cursor),
            ..Default::default()
        };

        conn.merge(Page::default().with_page_info(at(cursor::encode(i64::MAX))));
        conn.append(post(&registry, "1"));
        assert_eq!(conn.page_info().end_cursor, Some(cursor::encode(i64::MAX)));
        assert_eq!(conn.edges().len(), 1);

        // A decimal cursor too large for i64 never moves the end cursor backwards.
        let huge = BASE64_STANDARD.encode("100000000000000000000");
        conn.merge(Page::default().with_page_info(at(huge)));
        conn.append(post(&registry, "2"));
        assert_eq!(conn.page_info().end_cursor, Some(cursor::encode(i64::MAX)));

        conn.merge(Page::default().with_page_info(PageInfo {
            start_cursor: Some(cursor::encode(i64::MIN)),
            ..Default::default()
        }));
        conn.prepend(post(&registry, "0"));
        assert_eq!(conn.page_info().start_cursor, Some(cursor::encode(i64::MIN)));
        assert_eq!(conn.len(), conn.edges().len());
    }

    #[test]
    fn test_merge_replace_reset() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);

        conn.merge(Page::new(vec![post(&registry, "1"), post(&registry, "2")]));
        assert_eq!(conn.len(), 2);
        assert_eq!(conn.edges().len(), 2);
        assert!(!conn.is_completed());

        let done = PageInfo {
            has_next_page: false,
            ..Default::default()
        };
        conn.merge(Page::new(vec![post(&registry, "3")]).with_page_info(done.clone()));
        assert_eq!(conn.len(), 3);
        assert!(conn.is_completed());

        conn.replace(Page::new(vec![post(&registry, "4")]));
        assert_eq!(conn.len(), 1);
        assert_eq!(conn.page_info(), PageInfo::default());

        conn.reset();
        assert!(conn.is_empty());
        assert!(conn.edges().is_empty());
        assert!(!conn.is_completed());
    }

    #[async_std::test]
    async fn test_load_more() {
        let (transport, registry) = setup(
            MockTransport::default()
                .respond(json!({ "posts": page_json(&["1", "2"], true, "Mg==") }))
                .respond(json!({ "posts": page_json(&["3"], false, "Mw==") })),
        );
        let conn = posts(&registry);

        let page = conn.load_more().await.unwrap().unwrap();
        assert_eq!(page.nodes.len(), 2);
        assert_eq!(conn.len(), 2);
        assert_eq!(conn.page_info().end_cursor.as_deref(), Some("Mg=="));

        conn.load_more().await.unwrap();
        assert_eq!(conn.len(), 3);
        assert_eq!(conn.edges().len(), 3);
        assert!(conn.is_completed());

        let err = conn.load_more().await.unwrap_err();
        assert_eq!(err.downcast_ref::<LoadError>(), Some(&LoadError::Complete));

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].variables["after"], json!(cursor::encode(0)));
        assert_eq!(requests[1].variables["after"], json!("Mg=="));
    }

    #[async_std::test]
    async fn test_load_more_concurrently() {
        let (open, gate) = async_std::channel::unbounded();
        let (_, registry) = setup(
            MockTransport::default()
                .respond(json!({ "posts": page_json(&["1"], true, "MQ==") }))
                .respond(json!({ "posts": page_json(&["2"], false, "Mg==") }))
                .gated(gate),
        );
        let conn = posts(&registry);

        let first = conn.load_more();
        pin_mut!(first);
        assert!(poll!(first.as_mut()).is_pending());
        assert!(conn.is_loading());

        let err = conn.load_more().await.unwrap_err();
        assert_eq!(err.downcast_ref::<LoadError>(), Some(&LoadError::Loading));

        open.send(()).await.unwrap();
        let Poll::Ready(page) = poll!(first.as_mut()) else {
            panic!("load did not finish");
        };
        assert_eq!(page.unwrap().unwrap().nodes.len(), 1);
        assert!(!conn.is_loading());

        // Once the first load has settled, the next one goes through.
        open.send(()).await.unwrap();
        let page = conn.load_more().await.unwrap().unwrap();
        assert_eq!(page.nodes[0].id(), Some(&json!("2")));
        assert_eq!(conn.len(), 2);
        assert!(conn.is_completed());
    }

    #[async_std::test]
    async fn test_load_more_failure_completes_class_connection() {
        let (_, registry) = setup(MockTransport::default().fail("offline"));
        let conn = posts(&registry);

        assert_eq!(conn.load_more().await.unwrap(), None);
        assert!(conn.is_completed());
        assert_eq!(conn.error().as_deref(), Some("offline"));
        assert!(!conn.is_loading());
    }

    #[async_std::test]
    async fn test_refresh() {
        let (_, registry) = setup(
            MockTransport::default().respond(json!({ "posts": page_json(&["1"], false, "MQ==") })),
        );
        let conn = posts(&registry);
        conn.set_completed(true);
        conn.load_more().await.unwrap_err();

        conn.refresh().await.unwrap();
        assert_eq!(conn.len(), 1);
        assert!(conn.is_completed());
    }

    #[test]
    fn test_clone() {
        let (_, registry) = setup(MockTransport::default());
        let conn = posts(&registry);
        conn.append(post(&registry, "1"));

        let copy = conn.clone();
        copy.append(post(&registry, "2"));
        assert_eq!(conn.len(), 1);
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.nodes()[0], conn.nodes()[0]);
    }

    fn post_with_comments(registry: &Arc<Registry>) -> Arc<Resource> {
        Arc::new(registry.get("Post").unwrap().instantiate(json!({
            "id": "UG9zdC8x",
            "comments": {
                "__typename": "CommentConnection",
                "pageInfo": {
                    "hasNextPage": true,
                    "hasPreviousPage": false,
                    "startCursor": "MQ==",
                    "endCursor": "MQ==",
                },
                "nodes": [{ "id": "c1", "body": "first" }],
                "edges": [{ "cursor": "MQ==", "node": { "id": "c1", "body": "first" } }],
            },
        })))
    }

    #[test]
    fn test_resource_connection() {
        let (_, registry) = setup(MockTransport::default());
        let post = post_with_comments(&registry);
        let comments = post.connection(&registry, "comments");

        assert_eq!(comments.len(), 1);
        assert_eq!(comments.nodes()[0].class().unwrap().name(), "Comment");
        assert_eq!(comments.page_info().end_cursor.as_deref(), Some("MQ=="));
        assert_eq!(comments.typename(), "CommentConnection");
        assert_eq!(comments.to_raw()["nodes"], json!([{ "id": "c1", "body": "first" }]));
    }

    #[test]
    fn test_resource_query_string() {
        let (_, registry) = setup(MockTransport::default());
        let post = post_with_comments(&registry);
        let comments = post.connection(&registry, "comments");

        let options = FindOptions::default()
            .with_variable("first", 10)
            .with_variable("id", "ignored");
        assert_eq!(
            comments.resource_query_string(&options, true).unwrap(),
            format!("comments(first: $first) {{\n{PAGE_INFO_SELECTION}\nnodes {{\nbody\n}}\n}}")
        );
        let query = comments.resource_query_string(&options, false).unwrap();
        assert!(query.starts_with("query($id: NodeId!, $first: Int) {\nnode(id: $id) {\n... on Post {\n"), "{query}");

        let err = comments
            .resource_query_string(&FindOptions::default().with_variable("nope", 1), true)
            .unwrap_err();
        assert_eq!(err.to_string(), "unknown variable type error nope");

        let all = posts(&registry);
        all.resource_query_string(&FindOptions::default(), true)
            .unwrap_err();
    }

    #[async_std::test]
    async fn test_resource_load_more() {
        let (transport, registry) = setup(MockTransport::default().respond(json!({
            "node": {
                "comments": {
                    "pageInfo": {
                        "hasNextPage": false,
                        "hasPreviousPage": true,
                        "startCursor": "Mg==",
                        "endCursor": "Mg==",
                    },
                    "nodes": [{ "id": "c2", "body": "second" }],
                },
            },
        })));
        let post = post_with_comments(&registry);
        let comments = post.connection(&registry, "comments");

        comments.load_more().await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments.edges()[1].cursor, cursor::encode(2));
        assert!(comments.is_completed());

        let request = &transport.requests()[0];
        assert_eq!(request.variables["id"], json!("UG9zdC8x"));
        assert_eq!(request.variables["after"], json!("MQ=="));
        assert!(request.document.contains("comments(after: $after)"), "{}", request.document);
    }

    #[async_std::test]
    async fn test_resource_load_more_failure_propagates() {
        let (transport, registry) = setup(
            MockTransport::default()
                .respond_error("forbidden")
                .respond(json!({
                    "node": {
                        "comments": {
                            "nodes": [{ "id": "c2", "body": "second" }],
                        },
                    },
                })),
        );
        let post = post_with_comments(&registry);
        let comments = post.connection(&registry, "comments");

        comments.load_more().await.unwrap_err();
        assert!(!comments.is_completed());
        assert_eq!(comments.error().as_deref(), Some("GraphQL error: forbidden"));
        assert!(!comments.is_loading());

        // The failure leaves the connection retryable, from the same cursor.
        let page = comments.load_more().await.unwrap().unwrap();
        assert_eq!(page.nodes.len(), 1);
        assert_eq!(comments.len(), 2);
        assert_eq!(comments.error(), None);
        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].variables, requests[1].variables);
    }

    #[async_std::test]
    async fn test_owner_dropped() {
        let (_, registry) = setup(MockTransport::default());
        let post = post_with_comments(&registry);
        let comments = post.connection(&registry, "comments");
        drop(post);

        let err = comments.load_more().await.unwrap_err();
        assert_eq!(err.downcast_ref::<LoadError>(), Some(&LoadError::OwnerDropped));
    }
}
