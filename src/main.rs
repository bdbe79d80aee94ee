use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use ipa_guardian::{PhaseEngine, Result};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ipa-guardian")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Workflow guardian MCP server", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Managed root directory (defaults to the current directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP server on stdio, guarding the root directory
    Serve,

    /// Show the current workflow state
    Status {
        /// Output the raw state document as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show derived metrics over the archived history
    Metrics,

    /// Discard the current cycle and return to IDLE (history is kept)
    Reset,

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");

    if let Err(e) = runtime.block_on(run_async(cli)) {
        eprintln!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

async fn run_async(cli: Cli) -> Result<()> {
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Serve => {
            let server = ipa_guardian::mcp::McpServer::new(&root)?;
            server.run().await?;
        }

        Commands::Status { json } => {
            let engine = PhaseEngine::new(&root)?;
            if json {
                println!("{}", engine.status_json()?);
            } else {
                print_status(&engine)?;
            }
        }

        Commands::Metrics => {
            let engine = PhaseEngine::new(&root)?;
            println!("{}", serde_json::to_string_pretty(&engine.metrics()?)?);
        }

        Commands::Reset => {
            let engine = PhaseEngine::new(&root)?;
            let message = engine.reset()?;
            println!("{}", message.yellow());
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "ipa-guardian", &mut io::stdout());
        }
    }

    Ok(())
}

fn print_status(engine: &PhaseEngine) -> Result<()> {
    let state = engine.snapshot()?;

    println!("{} {}", "Phase:".bold(), state.current_phase.to_string().cyan());

    match &state.current_intent {
        Some(intent) => println!(
            "{} {} ({})",
            "Intent:".bold(),
            intent.description,
            intent.component
        ),
        None => println!("{} -", "Intent:".bold()),
    }

    match &state.current_contract {
        Some(contract) => println!(
            "{} {} invariant(s)",
            "Contract:".bold(),
            contract.invariants.len()
        ),
        None => println!("{} -", "Contract:".bold()),
    }

    if let Some(failure) = &state.current_failure {
        println!("{} {}", "Failure:".bold().red(), failure.root_cause);
    }

    if let Some(command) = &state.last_validation_command {
        println!("{} {}", "Last validation:".bold(), command);
    }

    println!("{} {} archived cycle(s)", "History:".bold(), state.history.len());

    Ok(())
}
