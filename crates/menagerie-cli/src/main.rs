//! Menagerie CLI - agents, pets and chat
//!
//! Works against a local graph replica persisted between runs and signs every
//! backend call with the logged-in identity.

mod config;
mod workspace;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use dialoguer::Input;

use menagerie::{Agent, AgentDraft, ModelType, Pet, PetDraft, Record, Sender};
use menagerie_sync::logging;

use config::Config;
use workspace::{read_new_password, read_password, Workspace};

#[derive(Parser)]
#[command(name = "menagerie")]
#[command(about = "Menagerie CLI - agents, pets and chat", long_about = None)]
#[command(version)]
struct Cli {
    /// Alias to act as (defaults to the configured alias)
    #[arg(short, long, global = true)]
    alias: Option<String>,

    /// Log sync and backend activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account with a fresh key pair
    Register,

    /// Check credentials and remember the alias as default
    Login,

    /// Manage agents
    Agent {
        #[command(subcommand)]
        action: AgentAction,
    },

    /// Manage pets (toolbox)
    Pet {
        #[command(subcommand)]
        action: PetAction,
    },

    /// Chat with an agent
    Chat {
        /// Agent ID
        agent_id: String,
    },

    /// Ask the backend to improve a system prompt
    ImprovePrompt {
        /// Prompt text (will prompt if not provided)
        prompt: Option<String>,
    },

    /// Show current configuration
    Config,
}

#[derive(Subcommand)]
enum AgentAction {
    /// List your agents
    List,
    /// Create an agent
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        /// GPT_4O_MINI, GPT_4O or GPT_3_5_TURBO
        #[arg(short, long, default_value = "GPT_4O_MINI")]
        model: String,
        #[arg(short, long)]
        system_prompt: Option<String>,
    },
    /// Edit an agent
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(short, long)]
        model: Option<String>,
        #[arg(short, long)]
        system_prompt: Option<String>,
    },
    /// Delete an agent
    Delete { id: String },
}

#[derive(Subcommand)]
enum PetAction {
    /// List your pets
    List,
    /// Create a pet
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long, default_value = "prompt_llm")]
        tool_type: String,
        /// Tool config as a JSON object
        #[arg(long)]
        tool_config: Option<String>,
        /// Sprite params as a JSON object
        #[arg(long)]
        sprite: Option<String>,
    },
    /// Edit a pet
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        #[arg(long)]
        tool_type: Option<String>,
        #[arg(long)]
        tool_config: Option<String>,
        #[arg(long)]
        sprite: Option<String>,
    },
    /// Delete a pet
    Delete { id: String },
    /// Run a pet's tool on a task
    Run {
        id: String,
        task: String,
        /// Parent agent ID
        #[arg(long)]
        agent: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose { "debug" } else { "warn" });
    let alias = cli.alias.as_deref();

    match cli.command {
        Commands::Register => cmd_register(alias).await,
        Commands::Login => cmd_login(alias).await,
        Commands::Agent { action } => cmd_agent(alias, action).await,
        Commands::Pet { action } => cmd_pet(alias, action).await,
        Commands::Chat { agent_id } => cmd_chat(alias, &agent_id).await,
        Commands::ImprovePrompt { prompt } => cmd_improve_prompt(alias, prompt).await,
        Commands::Config => cmd_config(),
    }
}

// ============================================
// Command Implementations
// ============================================

async fn cmd_register(alias: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    let alias = match alias {
        Some(a) => a.to_string(),
        None => Input::new()
            .with_prompt("Alias")
            .interact_text()
            .context("Failed to read alias")?,
    };
    let password = read_new_password()?;

    let workspace = Workspace::open(&config)?;
    let public_key = workspace.ctx().session().register(&alias, &password).await?;
    workspace.persist()?;

    println!("{} Registered {}", "✓".green(), alias.cyan());
    println!("  Public key: {}", public_key.to_string().dimmed());

    if config.default_alias.is_none() {
        config.default_alias = Some(alias);
        config.save()?;
    }
    Ok(())
}

async fn cmd_login(alias: Option<&str>) -> Result<()> {
    let mut config = Config::load()?;
    let alias = config
        .alias(alias)
        .context("No alias given. Use -a <alias>.")?;
    let password = read_password(&alias)?;

    let workspace = Workspace::open(&config)?;
    let identity = workspace.ctx().session().login(&alias, &password).await?;

    config.default_alias = Some(alias.clone());
    config.save()?;
    println!("{} Logged in as {} ({})", "✓".green(), alias.cyan(), identity.public_key());
    Ok(())
}

async fn cmd_agent(alias: Option<&str>, action: AgentAction) -> Result<()> {
    let config = Config::load()?;
    let workspace = Workspace::login(&config, alias).await?;
    let ctx = workspace.ctx();

    match action {
        AgentAction::List => {
            let agents: Vec<Agent> = ctx.reader().read().await?;
            if agents.is_empty() {
                println!("No agents yet.");
                println!("\n{}", "Create one with:".dimmed());
                println!("  menagerie agent create <name>");
                return Ok(());
            }

            println!("{}", "Agents:".bold());
            for agent in agents {
                println!(
                    "  {} {} [{}] {}",
                    agent.id.dimmed(),
                    agent.name.cyan().bold(),
                    agent.model,
                    truncate_string(&agent.description, 50).dimmed()
                );
            }
        }

        AgentAction::Create { name, description, model, system_prompt } => {
            let mut draft = AgentDraft::new(name).with_model(parse_model(&model)?);
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            if let Some(p) = system_prompt {
                draft = draft.with_system_prompt(p);
            }
            let agent = ctx.writer().save(draft).await?;
            workspace.persist()?;
            println!("{} Agent {} created ({})", "✓".green(), agent.name.cyan(), agent.id);
        }

        AgentAction::Edit { id, name, description, model, system_prompt } => {
            let current = find_agent(&workspace, &id).await?;
            let mut draft = AgentDraft::editing(&current);
            if let Some(n) = name {
                draft.name = n;
            }
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            if let Some(m) = model {
                draft = draft.with_model(parse_model(&m)?);
            }
            if let Some(p) = system_prompt {
                draft = draft.with_system_prompt(p);
            }
            let agent = ctx.writer().save(draft).await?;
            workspace.persist()?;
            println!("{} Agent {} updated", "✓".green(), agent.name.cyan());
        }

        AgentAction::Delete { id } => {
            let agent = find_agent(&workspace, &id).await?;
            ctx.writer().delete::<Agent>(&agent.id).await?;
            workspace.persist()?;
            println!("{} Agent {} deleted ({})", "✓".green(), agent.name.cyan(), agent.id);
        }
    }

    Ok(())
}

async fn cmd_pet(alias: Option<&str>, action: PetAction) -> Result<()> {
    let config = Config::load()?;
    let workspace = Workspace::login(&config, alias).await?;
    let ctx = workspace.ctx();

    match action {
        PetAction::List => {
            let pets: Vec<Pet> = ctx.reader().read().await?;
            if pets.is_empty() {
                println!("Toolbox is empty.");
                return Ok(());
            }

            println!("{}", "Pets:".bold());
            for pet in pets {
                println!(
                    "  {} {} [{}] {}",
                    pet.id.dimmed(),
                    pet.name.cyan().bold(),
                    pet.tool_snippet.kind,
                    truncate_string(&pet.description, 50).dimmed()
                );
            }
        }

        PetAction::Create { name, description, tool_type, tool_config, sprite } => {
            let mut draft = PetDraft::new(name);
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            let config_text = tool_config.unwrap_or_else(|| draft.tool_config.clone());
            draft = draft.with_tool(tool_type, config_text);
            if let Some(s) = sprite {
                draft = draft.with_sprite_params(s);
            }
            let pet = ctx.writer().save(draft).await?;
            workspace.persist()?;
            println!("{} Pet {} created ({})", "✓".green(), pet.name.cyan(), pet.id);
        }

        PetAction::Edit { id, name, description, tool_type, tool_config, sprite } => {
            let current = find_pet(&workspace, &id).await?;
            let mut draft = PetDraft::editing(&current);
            if let Some(n) = name {
                draft.name = n;
            }
            if let Some(d) = description {
                draft = draft.with_description(d);
            }
            if let Some(t) = tool_type {
                draft.tool_type = t;
            }
            if let Some(c) = tool_config {
                draft.tool_config = c;
            }
            if let Some(s) = sprite {
                draft = draft.with_sprite_params(s);
            }
            let pet = ctx.writer().save(draft).await?;
            workspace.persist()?;
            println!("{} Pet {} updated", "✓".green(), pet.name.cyan());
        }

        PetAction::Delete { id } => {
            let pet = find_pet(&workspace, &id).await?;
            ctx.writer().delete::<Pet>(&pet.id).await?;
            workspace.persist()?;
            println!("{} Pet {} deleted ({})", "✓".green(), pet.name.cyan(), pet.id);
        }

        PetAction::Run { id, task, agent } => {
            let pet = find_pet(&workspace, &id).await?;
            let response = ctx
                .prompts(workspace.backend()?)
                .run_pet_task(&pet, &task, agent.as_deref())
                .await?;
            println!("{} {}", format!("{}:", pet.name).cyan().bold(), response.pet_response);
        }
    }

    Ok(())
}

async fn cmd_chat(alias: Option<&str>, agent_id: &str) -> Result<()> {
    let config = Config::load()?;
    let workspace = Workspace::login(&config, alias).await?;
    let agent = find_agent(&workspace, agent_id).await?;
    let mut chat = workspace.ctx().chat(workspace.backend()?, agent);

    println!(
        "Chatting with {}. {}",
        chat.agent().name.cyan().bold(),
        "/switch <agent-id> changes agent, /quit exits".dimmed()
    );

    loop {
        let line: String = Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read input")?;
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == "/quit" || line == "/exit" {
            break;
        }
        if let Some(id) = line.strip_prefix("/switch ") {
            match find_agent(&workspace, id.trim()).await {
                Ok(agent) => {
                    chat.switch_agent(agent);
                    println!("Now chatting with {}", chat.agent().name.cyan().bold());
                }
                Err(e) => println!("{}", e.to_string().red()),
            }
            continue;
        }

        match chat.send(line).await {
            Ok(reply) => println!("{} {}", format!("{}:", chat.agent().name).cyan().bold(), reply),
            Err(_) => {
                if let Some(turn) = chat.history().last().filter(|t| t.sender == Sender::System) {
                    println!("{}", turn.text.red());
                }
            }
        }
    }

    Ok(())
}

async fn cmd_improve_prompt(alias: Option<&str>, prompt: Option<String>) -> Result<()> {
    let config = Config::load()?;
    let workspace = Workspace::login(&config, alias).await?;

    let prompt = match prompt {
        Some(p) => p,
        None => Input::new()
            .with_prompt("Prompt")
            .interact_text()
            .context("Failed to read input")?,
    };

    let improved = workspace
        .ctx()
        .prompts(workspace.backend()?)
        .improve_prompt(&prompt)
        .await?;

    eprintln!("{}", "Improved prompt:".dimmed());
    // stdout stays clean for piping
    println!("{}", improved.improved_prompt);
    Ok(())
}

fn cmd_config() -> Result<()> {
    let config = Config::load()?;
    let sync = config.sync_config()?;

    println!("{}", "Configuration:".bold());
    println!("  Path: {:?}", Config::config_path()?);
    println!("  Backend URL: {}", sync.backend_url);
    println!("  Replica: {:?}", config.replica_path()?);
    println!(
        "  Default Alias: {}",
        config.default_alias.as_deref().unwrap_or("None").cyan()
    );
    println!("  Read timeout: {:?}", sync.read_timeout);
    println!("  History limit: {}", sync.history_limit);

    Ok(())
}

async fn find_agent(workspace: &Workspace, id: &str) -> Result<Agent> {
    find_record(workspace.ctx().reader().read().await?, id)
}

async fn find_pet(workspace: &Workspace, id: &str) -> Result<Pet> {
    find_record(workspace.ctx().reader().read().await?, id)
}

/// Pick `id` out of the caller's own records
fn find_record<R: Record>(records: Vec<R>, id: &str) -> Result<R> {
    match records.into_iter().find(|r| r.id() == id) {
        Some(record) => Ok(record),
        None => bail!("{} '{}' not found", capitalize(R::KIND), id),
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn parse_model(value: &str) -> Result<ModelType> {
    value.parse::<ModelType>().map_err(anyhow::Error::msg)
}

/// Truncate string safely for UTF-8 (by char count, not bytes)
fn truncate_string(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
