//! Ask command handler
//!
//! One-shot question answering: discover and select tools for the
//! question, answer it, then tear every handle down again. Release runs on
//! every exit path, including Ctrl-C.

use colored::Colorize;

use crate::agent;
use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::ToolOrchestrator;

/// Answers a single question and prints the result.
pub async fn run_ask(config: Config, question: String) -> Result<()> {
    let (orchestrator, llm) = super::build_session(&config)?;

    let answer = tokio::select! {
        result = async {
            super::prepare_tools(&orchestrator, &llm, &question).await?;
            agent::answer(&llm, &orchestrator, &question).await
        } => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nInterrupted.");
            release_and_report(&orchestrator).await;
            return Ok(());
        }
    };

    release_and_report(&orchestrator).await;

    let answer = answer?;
    println!("{}", answer);
    Ok(())
}

/// Releases all handles, surfacing per-server teardown failures as
/// warnings.
pub(super) async fn release_and_report(orchestrator: &ToolOrchestrator) {
    for failure in orchestrator.release().await {
        eprintln!(
            "{}",
            format!(
                "warning: failed to release server '{}': {}",
                failure.server_key, failure.message
            )
            .yellow()
        );
    }
}
