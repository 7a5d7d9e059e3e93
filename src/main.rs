use anyhow::{Context, Result};
use ares_research::{
    cli::{output::Output, Cli, Commands, DEFAULT_CONFIG_PATH},
    types::A2AMessage,
    utils::toml_config::{LoggingConfig, ResearchConfig},
    AccessCredentials, MessageRouter, PlanExecutor, PlanRequest, ResearchPlanner, TaskDispatcher,
};
use std::{fs, path::Path, sync::Arc};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    match cli.command {
        Commands::ValidateConfig => validate_config(&cli.config, output)?,
        Commands::Plan {
            request,
            json,
            execute,
        } => {
            let config = prepare(&cli.config, cli.verbose)?;
            let request: PlanRequest = read_json(&request)?;
            let planner = ResearchPlanner::new(&config.planning, AccessCredentials::from_env());
            let plan = planner.create_plan(&request)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                output.banner();
                output.plan(&plan);
            }

            if execute {
                let dispatcher = Arc::new(TaskDispatcher::with_http(&config));
                let execution = PlanExecutor::new(dispatcher).execute(&plan).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&execution)?);
                } else {
                    output.newline();
                    output.execution(&execution);
                }
            }
        }
        Commands::Route { message } => {
            let config = prepare(&cli.config, cli.verbose)?;
            let message: A2AMessage = read_json(&message)?;
            let router = MessageRouter::new(Arc::new(TaskDispatcher::with_http(&config)));
            let outcome = router.route_message(&message).await?;
            output.route_outcome(&outcome);
        }
    }

    Ok(())
}

/// Load the configuration and start logging. A missing file at the default
/// path falls back to the default configuration.
fn prepare(path: &Path, verbose: bool) -> Result<ResearchConfig> {
    let fallback = !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH);
    let config = if fallback {
        ResearchConfig::default()
    } else {
        ResearchConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?
    };

    init_tracing(&config.logging, verbose);
    if fallback {
        tracing::info!("{} not found, using default configuration", DEFAULT_CONFIG_PATH);
    }
    Ok(config)
}

fn validate_config(path: &Path, output: &Output) -> Result<()> {
    let config = ResearchConfig::load(path)
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;

    output.success(&format!("{} is valid", path.display()));
    output.kv("log level", &config.logging.level);
    output.kv(
        "default timeout",
        &format!("{}ms", config.dispatch.default_timeout_ms),
    );
    output.kv(
        "max concurrent tasks",
        &config.dispatch.max_concurrent_tasks.to_string(),
    );

    output.subheader("Agents");
    let agent_types = config.agent_types();
    if agent_types.is_empty() {
        output.warning("No agents configured; dispatch will fail with not found");
        output.hint("Add an [agents.<type>] table with an endpoint for each agent");
    }
    for agent_type in agent_types {
        if let Some(agent) = config.get_agent(agent_type) {
            output.list_item(&format!("{} -> {}", agent_type, agent.endpoint));
        }
    }
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        logging.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
