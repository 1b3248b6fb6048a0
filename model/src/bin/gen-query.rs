use anyhow::Error;
use clap::{Parser, Subcommand};
use gql_resource::{
    columns::{format_columns, Column},
    init_logging,
    schema::{Field, QueryDepth, Schema, Type},
    transport,
};
use std::{fs, path::PathBuf};

/// Render GraphQL selection sets and variable clauses from a server's schema.
#[derive(Parser)]
struct Options {
    /// Read the introspection result from FILE instead of querying the server.
    #[clap(short, long, env = "GQL_RESOURCE_SCHEMA", name = "FILE")]
    schema: Option<PathBuf>,

    #[clap(flatten)]
    server: transport::Options,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the selection set of a type.
    Type {
        name: String,

        /// Recurse into object fields up to DEPTH levels.
        #[clap(short, long, name = "DEPTH", default_value = "1")]
        max_depth: usize,
    },
    /// Print the fragments derived from a type.
    Fragments { name: String },
    /// Print the default column spec of a type.
    Columns {
        name: String,

        /// Print the spec as JSON instead of as a selection set.
        #[clap(long)]
        json: bool,
    },
    /// Print the variable clause declaring every argument of a root query field.
    Variables { field: String },
}

async fn load_schema(opt: &Options) -> Result<Schema, Error> {
    match &opt.schema {
        Some(path) => Schema::from_json(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Schema::fetch(&opt.server.connect()).await,
    }
}

fn get_type<'s>(schema: &'s Schema, name: &str) -> Result<Type<'s>, Error> {
    schema
        .get_type(name)
        .ok_or_else(|| Error::msg(format!("no type {name} in schema")))
}

#[async_std::main]
async fn main() -> Result<(), Error> {
    init_logging();

    let opt = Options::parse();
    let schema = load_schema(&opt).await?;
    tracing::info!("loaded schema with {} types", schema.types().count());

    match &opt.command {
        Command::Type { name, max_depth } => {
            let ty = get_type(&schema, name)?;
            println!("{}", ty.to_query_string(QueryDepth::max(*max_depth)));
        }
        Command::Fragments { name } => {
            let fragments = get_type(&schema, name)?.to_fragments();
            let mut names: Vec<_> = fragments.keys().collect();
            names.sort();
            for name in names {
                println!("# {name}");
                println!("{}", fragments[name].to_query_string(QueryDepth::default()));
            }
        }
        Command::Columns { name, json } => {
            let columns = Column::List(get_type(&schema, name)?.expand_columns());
            if *json {
                println!("{}", serde_json::to_string_pretty(&columns)?);
            } else {
                println!("{}", format_columns(&columns, 0));
            }
        }
        Command::Variables { field } => {
            let field = schema
                .get_query(field)
                .ok_or_else(|| Error::msg(format!("no query field {field}")))?;
            let clause = Field::parse_variable_names(&field.to_variable_names());
            println!("({})", clause.define);
            println!("{}({})", field.name(), clause.apply);
        }
    }
    Ok(())
}
