//! Fixtures for testing against a small but representative schema.
//!
//! The schema models a blog: `Post`s written by `User`s, with paginated `Comment`s. Its type graph
//! is cyclic (`User.posts` leads back to `Post` and `Post.user` leads back to `User`), which makes it
//! suitable for exercising depth-bounded rendering.
#![cfg(any(test, feature = "testing"))]

use crate::schema::Schema;
use serde_json::{json, Value};

/// The fixture schema, indexed.
pub fn schema() -> Schema {
    Schema::new(serde_json::from_value(schema_json()).expect("fixture schema is well-formed"))
}

/// The fixture schema, as a bare introspection payload.
pub fn schema_json() -> Value {
    let mut types = vec![
        scalar("ID"),
        scalar("String"),
        scalar("Int"),
        scalar("Boolean"),
        scalar("NodeId"),
        json!({
            "kind": "ENUM",
            "name": "PostStatus",
            "enumValues": [
                { "name": "DRAFT", "isDeprecated": false },
                { "name": "PUBLISHED", "isDeprecated": false },
            ],
        }),
        object(
            "Query",
            &[],
            vec![
                field_with_args(
                    "posts",
                    vec![
                        arg("first", named("SCALAR", "Int"), Some("30"), None),
                        arg("after", named("SCALAR", "String"), None, None),
                        arg(
                            "filter",
                            named("INPUT_OBJECT", "PostFilter"),
                            None,
                            Some("Restrict the posts returned."),
                        ),
                    ],
                    non_null(named("OBJECT", "PostConnection")),
                ),
                field_with_args(
                    "users",
                    vec![
                        arg("first", named("SCALAR", "Int"), None, None),
                        arg("after", named("SCALAR", "String"), None, None),
                    ],
                    non_null(named("OBJECT", "UserConnection")),
                ),
                field_with_args(
                    "node",
                    vec![arg("id", non_null(named("SCALAR", "NodeId")), None, None)],
                    named("INTERFACE", "Node"),
                ),
                field_with_args(
                    "nodes",
                    vec![arg(
                        "ids",
                        non_null(list(non_null(named("SCALAR", "NodeId")))),
                        None,
                        None,
                    )],
                    non_null(list(named("INTERFACE", "Node"))),
                ),
            ],
        ),
        object(
            "Mutation",
            &[],
            vec![field_with_args(
                "deleteNode",
                vec![
                    arg("id", non_null(named("SCALAR", "NodeId")), None, None),
                    arg("isSoft", named("SCALAR", "Boolean"), None, None),
                ],
                named("OBJECT", "DeleteNodePayload"),
            )],
        ),
        object(
            "DeleteNodePayload",
            &[],
            vec![field(
                "errors",
                non_null(list(non_null(named("SCALAR", "String")))),
            )],
        ),
        json!({
            "kind": "INTERFACE",
            "name": "Node",
            "fields": [field("id", non_null(named("SCALAR", "ID")))],
            "possibleTypes": [
                named("OBJECT", "Post"),
                named("OBJECT", "User"),
                named("OBJECT", "Comment"),
            ],
        }),
        object(
            "Post",
            &["Node"],
            vec![
                field("id", non_null(named("SCALAR", "ID"))),
                field("title", named("SCALAR", "String")),
                field("status", named("ENUM", "PostStatus")),
                field("tags", non_null(list(non_null(named("SCALAR", "String"))))),
                field("user", named("OBJECT", "User")),
                field("meta", named("OBJECT", "PostMeta")),
                field_with_args(
                    "comments",
                    vec![
                        arg("first", named("SCALAR", "Int"), None, None),
                        arg("after", named("SCALAR", "String"), None, None),
                    ],
                    non_null(named("OBJECT", "CommentConnection")),
                ),
            ],
        ),
        object(
            "PostMeta",
            &[],
            vec![
                field("views", named("SCALAR", "Int")),
                field("slug", named("SCALAR", "String")),
            ],
        ),
        object(
            "User",
            &["Node"],
            vec![
                field("id", non_null(named("SCALAR", "ID"))),
                field("name", named("SCALAR", "String")),
                field_with_args(
                    "posts",
                    vec![
                        arg("first", named("SCALAR", "Int"), None, None),
                        arg("after", named("SCALAR", "String"), None, None),
                    ],
                    non_null(named("OBJECT", "PostConnection")),
                ),
            ],
        ),
        object(
            "Comment",
            &["Node"],
            vec![
                field("id", non_null(named("SCALAR", "ID"))),
                field("body", named("SCALAR", "String")),
            ],
        ),
        object(
            "PageInfo",
            &[],
            vec![
                field("hasNextPage", non_null(named("SCALAR", "Boolean"))),
                field("hasPreviousPage", non_null(named("SCALAR", "Boolean"))),
                field("startCursor", named("SCALAR", "String")),
                field("endCursor", named("SCALAR", "String")),
            ],
        ),
        json!({
            "kind": "INPUT_OBJECT",
            "name": "PostFilter",
            "inputFields": [
                arg("title", named("SCALAR", "String"), None, None),
                arg("userId", named("SCALAR", "ID"), None, None),
            ],
        }),
        json!({
            "kind": "INPUT_OBJECT",
            "name": "PostAttributes",
            "inputFields": [
                arg("title", named("SCALAR", "String"), None, None),
                arg("tags", list(non_null(named("SCALAR", "String"))), None, None),
            ],
        }),
    ];
    for node in ["Post", "User", "Comment"] {
        types.extend(connection(node));
    }

    json!({
        "queryType": { "name": "Query" },
        "mutationType": { "name": "Mutation" },
        "subscriptionType": null,
        "types": types,
        "directives": [{
            "name": "include",
            "locations": ["FIELD", "FRAGMENT_SPREAD", "INLINE_FRAGMENT"],
            "args": [arg("if", non_null(named("SCALAR", "Boolean")), None, None)],
        }],
    })
}

/// The `<Node>Connection` and `<Node>Edge` types paginating `node`.
pub fn connection(node: &str) -> [Value; 2] {
    let edge = format!("{node}Edge");
    [
        object(
            &format!("{node}Connection"),
            &[],
            vec![
                field("edges", list(named("OBJECT", &edge))),
                field("nodes", list(named("OBJECT", node))),
                field("pageInfo", non_null(named("OBJECT", "PageInfo"))),
                field("totalCount", non_null(named("SCALAR", "Int"))),
            ],
        ),
        object(
            &edge,
            &[],
            vec![
                field("cursor", non_null(named("SCALAR", "String"))),
                field("node", named("OBJECT", node)),
            ],
        ),
    ]
}

pub fn scalar(name: &str) -> Value {
    json!({ "kind": "SCALAR", "name": name })
}

pub fn object(name: &str, interfaces: &[&str], fields: Vec<Value>) -> Value {
    json!({
        "kind": "OBJECT",
        "name": name,
        "fields": fields,
        "interfaces": interfaces
            .iter()
            .map(|interface| named("INTERFACE", interface))
            .collect::<Vec<_>>(),
    })
}

pub fn field(name: &str, ty: Value) -> Value {
    field_with_args(name, vec![], ty)
}

pub fn field_with_args(name: &str, args: Vec<Value>, ty: Value) -> Value {
    json!({
        "name": name,
        "args": args,
        "type": ty,
        "isDeprecated": false,
    })
}

pub fn arg(name: &str, ty: Value, default: Option<&str>, description: Option<&str>) -> Value {
    json!({
        "name": name,
        "description": description,
        "type": ty,
        "defaultValue": default,
    })
}

pub fn named(kind: &str, name: &str) -> Value {
    json!({ "kind": kind, "name": name, "ofType": null })
}

pub fn non_null(inner: Value) -> Value {
    json!({ "kind": "NON_NULL", "name": null, "ofType": inner })
}

pub fn list(inner: Value) -> Value {
    json!({ "kind": "LIST", "name": null, "ofType": inner })
}
