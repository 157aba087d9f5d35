//! Quarry server entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use quarry::{
    create_rest_router, ApiCompletionProvider, ApiDataEngine, Config, Pipeline, PlanCompiler,
    QuerySynthesizer, RestApiConfig, SafeExecutor, SchemaCache,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Quarry: natural-language analytics over a SQL data engine
#[derive(Parser, Debug)]
#[command(name = "quarry")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Ask a question and print the result
    Ask {
        /// Natural-language question
        question: String,
    },
    /// Print the engine's current schema
    Schema,
    /// Run the HTTP server (default behavior)
    Serve {
        /// HTTP port. If not specified, uses config file value.
        #[arg(short, long)]
        port: Option<u16>,
        /// Enable JSON logging format
        #[arg(long)]
        json_logs: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let is_serve = matches!(args.command, Some(Command::Serve { .. }) | None);

    if !is_serve {
        // Minimal logging for one-shot commands
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::stderr)
            .init();
    }

    let config = if let Some(path) = &args.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    match args.command {
        Some(Command::Ask { question }) => run_ask(&config, &question, args.json).await,
        Some(Command::Schema) => run_schema(&config, args.json).await,
        Some(Command::Serve { port, json_logs }) => {
            run_server(config, port, json_logs).await
        }
        None => run_server(config, None, false).await,
    }
}

/// Wire the pipeline from configuration.
fn build_pipeline(config: &Config) -> anyhow::Result<(Arc<Pipeline>, Arc<SchemaCache>)> {
    let completion = Arc::new(ApiCompletionProvider::from_config(&config.completion)?);
    let engine = Arc::new(ApiDataEngine::from_config(&config.engine)?);

    let schema_cache = Arc::new(SchemaCache::new(engine.clone(), &config.schema_cache));
    let max_rows = config.limits.max_rows;

    let pipeline = Arc::new(Pipeline::new(
        schema_cache.clone(),
        PlanCompiler::new(completion.clone()),
        QuerySynthesizer::new(completion, max_rows),
        SafeExecutor::new(
            engine,
            Duration::from_secs(config.limits.execution_timeout_secs),
            max_rows,
        ),
    ));

    Ok((pipeline, schema_cache))
}

/// One-shot question from the command line.
async fn run_ask(config: &Config, question: &str, json: bool) -> anyhow::Result<()> {
    let (pipeline, _) = build_pipeline(config)?;
    let envelope = pipeline.run(question).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
        return Ok(());
    }

    if let Some(data) = &envelope.data {
        println!("{}", data.generated_sql);
        println!();
        if !data.columns.is_empty() {
            println!("{}", data.columns.join("\t"));
        }
        for row in &data.data {
            let cells: Vec<String> = data
                .columns
                .iter()
                .map(|c| {
                    row.get(c)
                        .map(|v| match v {
                            serde_json::Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .unwrap_or_default()
                })
                .collect();
            println!("{}", cells.join("\t"));
        }
        println!();
        println!(
            "{} rows in {:.2}s",
            data.row_count, envelope.execution_time
        );
    } else {
        let message = envelope
            .error_message
            .unwrap_or_else(|| "Unknown failure".to_string());
        anyhow::bail!("{}", message);
    }

    Ok(())
}

/// Print the engine's schema.
async fn run_schema(config: &Config, json: bool) -> anyhow::Result<()> {
    let (_, schema_cache) = build_pipeline(config)?;
    let schema = schema_cache.get().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*schema)?);
    } else {
        print!("{}", schema.to_prompt_block());
    }

    Ok(())
}

/// Run the HTTP server.
async fn run_server(
    mut config: Config,
    port: Option<u16>,
    json_logs: bool,
) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting Quarry server v{}", env!("CARGO_PKG_VERSION"));

    if let Some(p) = port {
        config.server.http_port = p;
    }

    tracing::info!(
        engine = %config.engine.base_url,
        model = %config.completion.model,
        max_rows = config.limits.max_rows,
        "Configuration loaded"
    );

    let (pipeline, schema_cache) = build_pipeline(&config)?;

    let rest_config = RestApiConfig {
        enable_cors: config.server.enable_cors,
        cors_origins: config.server.cors_origins.clone(),
        ..Default::default()
    };
    let router = create_rest_router(pipeline, schema_cache, &rest_config);

    let addr = format!("{}:{}", config.server.bind_addr, config.server.http_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "Listening");

    axum::serve(listener, router).await?;

    Ok(())
}
