use std::path::PathBuf;

use clap::{Parser, Subcommand};

use graphbolt::auth::AuthContext;
use graphbolt::indexes::{AssertOptions, Neo4jDatabase};
use graphbolt::{config, GraphBolt};

/// GraphBolt - generated GraphQL API and Cypher translation for Neo4j
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the type definition document (YAML or JSON)
    #[arg(long, short = 's')]
    schema: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the generated API schema as SDL
    PrintSdl,
    /// Translate a resolved operation file into Cypher plus parameters
    Translate {
        /// Path to the operation document (YAML or JSON)
        #[arg(long)]
        operation: PathBuf,
    },
    /// Reconcile declared full-text indexes and unique constraints
    AssertIndexes {
        /// Create missing indexes and constraints instead of failing
        #[arg(long)]
        create: bool,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let document = config::load_definitions(&cli.schema)?;
    let engine = GraphBolt::new(&document)?;

    match cli.command {
        Command::PrintSdl => {
            println!("{}", engine.schema().to_sdl());
        }
        Command::Translate { operation } => {
            let operation = config::load_operation(&operation)?;
            let statement = engine.translate(&operation, AuthContext::unauthenticated())?;
            println!("{}", statement.cypher);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(statement.params))?
            );
        }
        Command::AssertIndexes { create } => {
            let neo4j = config::Neo4jConfig::from_env();
            let db = Neo4jDatabase::connect(&neo4j).await?;
            engine
                .assert_indexes_and_constraints(&db, AssertOptions { create })
                .await?;
            println!("All indexes and constraints are in place");
        }
    }
    Ok(())
}
