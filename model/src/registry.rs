//! The registry of resource classes.
//!
//! A [`Registry`] is the context every resource operation runs in: it holds the introspected
//! [`Schema`], the [`Transport`] used to reach the server, and the resource classes bound to
//! schema types. Classes are registered once, at startup, and never removed.

use crate::{node_id::NodeId, resource::ResourceClass, schema::Schema, transport::Transport};
use std::{
    collections::HashMap,
    fmt::{self, Debug, Formatter},
    sync::{Arc, PoisonError, RwLock},
};

pub struct Registry {
    schema: Arc<Schema>,
    transport: Arc<dyn Transport>,
    classes: RwLock<HashMap<String, Arc<ResourceClass>>>,
}

impl Registry {
    pub fn new(schema: impl Into<Arc<Schema>>, transport: Arc<dyn Transport>) -> Self {
        Self {
            schema: schema.into(),
            transport,
            classes: Default::default(),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn transport(&self) -> &dyn Transport {
        &*self.transport
    }

    /// Register a resource class under its name.
    ///
    /// If a class with the same name is already registered, it is kept and returned instead.
    pub fn register(&self, class: ResourceClass) -> Arc<ResourceClass> {
        let mut classes = self.classes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = classes.get(class.name()) {
            tracing::warn!("resource class {} is already registered", class.name());
            return existing.clone();
        }
        if self.schema.get_type(class.name()).is_none() {
            tracing::warn!("resource class {} has no type in the schema", class.name());
        }
        tracing::debug!("registering resource class {}", class.name());
        let class = Arc::new(class);
        classes.insert(class.name().to_string(), class.clone());
        class
    }

    /// Look up a resource class by name.
    pub fn get(&self, name: &str) -> Option<Arc<ResourceClass>> {
        self.classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// The names of all registered classes, sorted.
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .classes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// The resource class of the node identified by a global node id.
    pub fn resource_class_for_node_id(&self, id: &str) -> Option<Arc<ResourceClass>> {
        self.get(&NodeId::parse(id)?.type_name)
    }
}

impl Debug for Registry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.class_names())
            .finish_non_exhaustive()
    }
}
