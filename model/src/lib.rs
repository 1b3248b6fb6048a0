//! Client-side resources backed by a GraphQL server.
//!
//! The [`schema`] module indexes an introspected schema and renders selection sets from it. On top
//! of that, [`resource`] binds resource classes to schema types and builds the queries which fetch
//! and delete them, and [`connection`] pages through cursor-paginated lists of resources. All
//! communication with the server goes through a [`transport::Transport`].

use std::sync::Once;
use tracing_subscriber::EnvFilter;

pub mod columns;
pub mod connection;
pub mod cursor;
pub mod node_id;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod testing;
pub mod transport;

/// Install a global `tracing` subscriber writing to stderr.
///
/// The filter is read from `RUST_LOG` and defaults to `info`. Calling this more than once has no
/// further effect.
pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .ok();
    });
}
