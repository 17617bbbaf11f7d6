use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use agentflow_api::GeminiClient;
use agentflow_engine::{AgentStore, ChannelLogSink, GeminiTextGenerator, JsonFileAgentStore, WorkflowEngine, parse_agent_file};
use agentflow_types::{Agent, AgentStatus, LogEntry, TriggerInput, workflow::validate_agent};
use agentflow_util::EngineSettings;
use anyhow::{Context, Result, bail};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde_json::{Map as JsonMap, Value};
use tracing::{info, warn};

/// Run workflow agents and stream their logs.
#[derive(Parser, Debug)]
#[command(name = "agentflow", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run an agent definition and stream its log to stdout
    Run(RunArgs),
    /// List agents saved in the agent store
    Agents {
        /// Agent store file; defaults to the path from the engine settings
        #[arg(long)]
        store: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Agent definition file (YAML or JSON)
    agent_file: PathBuf,

    /// Id of the agent to run when the file holds several
    #[arg(long)]
    agent: Option<String>,

    /// JSON object with the trigger's output values
    #[arg(long)]
    trigger_input: Option<PathBuf>,

    /// Replaces the agent's system prompt for this run
    #[arg(long)]
    system_prompt: Option<String>,

    /// Print log entries as JSON lines
    #[arg(long)]
    json: bool,

    /// Save the agent with updated run counters to the agent store
    #[arg(long)]
    record: bool,
}

/// CLI entry point
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            if !run_agent_command(args).await? {
                std::process::exit(1);
            }
        }
        Command::Agents { store } => list_agents(store)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run_agent_command(args: RunArgs) -> Result<bool> {
    let agents = parse_agent_file(&args.agent_file)?;
    let mut agent = select_agent(agents, args.agent.as_deref())?;
    if let Err(problems) = validate_agent(&agent) {
        bail!("agent '{}' is invalid:\n  - {}", agent.id, problems.join("\n  - "));
    }
    if let Some(system_prompt) = args.system_prompt {
        agent.system_prompt = Some(system_prompt);
    }
    let trigger_input = match &args.trigger_input {
        Some(path) => Some(load_trigger_input(path, &agent)?),
        None => None,
    };

    let settings = EngineSettings::load().context("failed to load engine settings")?;
    let client = GeminiClient::new_from_env(settings.text_model.clone())?;
    if !client.is_configured() {
        warn!("GEMINI_API_KEY is not set; text generation steps will fail");
    }
    let store = Arc::new(JsonFileAgentStore::open(settings.agent_store_path())?);
    let store_handle: Arc<dyn AgentStore> = store.clone();
    let engine = WorkflowEngine::from_settings(&settings, Arc::new(GeminiTextGenerator::new(client)), Some(store_handle));

    let (sink, mut receiver) = ChannelLogSink::channel();
    let json = args.json;
    let printer = tokio::spawn(async move {
        while let Some(entry) = receiver.recv().await {
            print_entry(&entry, json);
        }
    });

    let result = engine.run_agent(&agent, &sink, trigger_input.as_ref()).await;
    drop(sink);
    printer.await.context("log printer task failed")?;

    if json {
        println!("{}", serde_json::to_string(&result)?);
    }

    if args.record {
        agent.record_run(result.success, Utc::now());
        store.save_agent(&agent)?;
        info!(agent_id = %agent.id, path = %store.path().display(), "recorded run");
    }

    Ok(result.success)
}

fn print_entry(entry: &LogEntry, json: bool) {
    if json {
        match serde_json::to_string(entry) {
            Ok(line) => println!("{line}"),
            Err(error) => warn!(error = %error, "failed to encode log entry"),
        }
    } else {
        println!("{entry}");
    }
}

/// Picks the agent named by `agent_id`, or the only agent in the file.
fn select_agent(agents: Vec<Agent>, agent_id: Option<&str>) -> Result<Agent> {
    match agent_id {
        Some(agent_id) => agents
            .into_iter()
            .find(|agent| agent.id == agent_id)
            .ok_or_else(|| anyhow::anyhow!("agent '{agent_id}' not found in file")),
        None => {
            let count = agents.len();
            match <[Agent; 1]>::try_from(agents) {
                Ok([agent]) => Ok(agent),
                Err(_) if count == 0 => bail!("the file does not define any agent"),
                Err(_) => bail!("the file defines {count} agents; choose one with --agent"),
            }
        }
    }
}

/// Reads the trigger's output values and keys them by the agent's trigger id.
fn load_trigger_input(path: &Path, agent: &Agent) -> Result<TriggerInput> {
    let trigger = agent
        .trigger
        .as_ref()
        .with_context(|| format!("agent '{}' has no trigger to feed input to", agent.id))?;
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read trigger input: {}", path.display()))?;
    let values: JsonMap<String, Value> =
        serde_json::from_str(&content).with_context(|| format!("trigger input must be a JSON object: {}", path.display()))?;

    let mut input = TriggerInput::new();
    input.insert(trigger.id.clone(), values);
    Ok(input)
}

fn list_agents(store: Option<PathBuf>) -> Result<()> {
    let path = match store {
        Some(path) => path,
        None => EngineSettings::load().context("failed to load engine settings")?.agent_store_path(),
    };
    let store = JsonFileAgentStore::open(&path)?;
    let agents = store.load_agents()?;
    if agents.is_empty() {
        println!("No agents stored in {}", path.display());
        return Ok(());
    }
    for agent in agents {
        println!("{}", agent_summary(&agent));
    }
    Ok(())
}

fn agent_summary(agent: &Agent) -> String {
    let status = match agent.status {
        AgentStatus::Active => "active",
        AgentStatus::Inactive => "inactive",
    };
    format!(
        "{}\t{}\t{}\t{}/{} successful runs",
        agent.id, agent.name, status, agent.successful_runs, agent.total_runs
    )
}
