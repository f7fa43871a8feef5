//! medlit-bot - console entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at the configured level
//!   4. Build the LLM provider and Entrez client, inject into the agent
//!   5. Run the console loop until Ctrl-C or stdin closes

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use medlit_bot::agent::ResearchAgent;
use medlit_bot::config;
use medlit_bot::entrez::EntrezClient;
use medlit_bot::error::AppError;
use medlit_bot::llm::{LlmProvider, providers};
use medlit_bot::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present - ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        assistant = %config.assistant_name,
        llm_provider = %config.llm.provider,
        entrez_db = %config.entrez.db,
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.llm_api_key.clone())
        .map_err(|e| AppError::Config(format!("llm provider: {e}")))?;

    // Credential/endpoint probe up front rather than on the first turn.
    if let LlmProvider::OpenAiCompatible(p) = &provider {
        match p.ping().await {
            Ok(()) => info!("llm endpoint reachable"),
            Err(e) => warn!(error = %e, "llm endpoint unreachable, turns may fail"),
        }
    }

    let entrez = EntrezClient::new(&config.entrez)
        .map_err(|e| AppError::Config(format!("entrez client: {e}")))?;

    let mut agent = ResearchAgent::new(provider, entrez, config.display.clone());
    run_console(&config.assistant_name, &mut agent).await
}

/// Read lines from stdin, hand each to the agent, print the reply.
/// Runs until Ctrl-C, stdin close, or a quit command.
async fn run_console(name: &str, agent: &mut ResearchAgent) -> Result<(), AppError> {
    println!("─────────────────────────────────");
    println!(" {name}  (Ctrl-C to quit)");
    println!("─────────────────────────────────");
    println!("Try:");
    println!("  - Show papers by Dr. Jane Doe");
    println!("  - Tell me about paper 37635766");
    println!("  - Find the paper titled \"HgutMgene-Miner\"");
    println!();

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        });
    }

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    loop {
        print!("> ");
        use std::io::Write as _;
        let _ = std::io::stdout().flush();

        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                println!("\nshutting down");
                info!("console shutting down");
                break;
            }

            line = lines.next_line() => {
                match line {
                    Err(e) => {
                        warn!("console read error: {e}");
                        break;
                    }
                    Ok(None) => {
                        info!("stdin closed");
                        break;
                    }
                    Ok(Some(input)) => {
                        let input = input.trim();
                        if input.is_empty() { continue; }
                        if matches!(input.to_lowercase().as_str(), "quit" | "exit" | "bye") {
                            println!("Goodbye!");
                            break;
                        }

                        let reply = agent.handle_turn(input).await;
                        println!("{}\n", reply.to_text());
                    }
                }
            }
        }
    }

    Ok(())
}
