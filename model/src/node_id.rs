//! Globally unique identifiers for objects implementing the `Node` interface.
//!
//! A node ID is the base64 encoding of `<Type>/<id>`, where `<Type>` is the GraphQL type name of
//! the object and `<id>` is its identifier within that type.

use base64::prelude::*;
use std::fmt::{self, Display, Formatter};

/// A decoded node ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    /// The name of the GraphQL type of the object.
    pub type_name: String,
    /// The ID of the object within its type.
    pub id: String,
}

impl NodeId {
    pub fn new(type_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            id: id.into(),
        }
    }

    /// Decode an encoded node ID.
    ///
    /// Returns [`None`] if `encoded` is not valid base64 or does not have both a type and an ID.
    pub fn parse(encoded: &str) -> Option<Self> {
        let bytes = BASE64_STANDARD.decode(encoded).ok()?;
        let decoded = String::from_utf8(bytes).ok()?;
        let (type_name, id) = decoded.split_once('/')?;
        if type_name.is_empty() || id.is_empty() {
            return None;
        }
        Some(Self::new(type_name, id))
    }

    /// The encoded form of this ID.
    pub fn encode(&self) -> String {
        create(&self.id, Some(&self.type_name))
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.encode())
    }
}

/// Encode a node ID.
///
/// When `type_name` is [`None`] the type segment is left empty, which [`NodeId::parse`] rejects;
/// such IDs are only meaningful to servers which infer the type from context.
pub fn create(id: &str, type_name: Option<&str>) -> String {
    BASE64_STANDARD.encode(format!("{}/{id}", type_name.unwrap_or_default()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_node_id() {
        let encoded = create("1", Some("Post"));
        assert_eq!(encoded, BASE64_STANDARD.encode("Post/1"));
        assert_eq!(NodeId::parse(&encoded), Some(NodeId::new("Post", "1")));
        assert_eq!(NodeId::new("Post", "1").to_string(), encoded);
    }

    #[test]
    fn test_malformed_node_id() {
        assert_eq!(NodeId::parse("1"), None);
        assert_eq!(NodeId::parse(&create("1", None)), None);
        assert_eq!(NodeId::parse(&BASE64_STANDARD.encode("Post")), None);
    }
}
