//! Chat command handler
//!
//! Interactive readline session. All discovered tools are activated up
//! front so any question in the session can be answered, and every handle
//! is released when the session ends, however it ends.

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::agent;
use crate::config::Config;
use crate::error::Result;
use crate::llm::ChatMessage;
use crate::orchestrator::selection;

/// Inputs that end the session.
const EXIT_WORDS: &[&str] = &["quit", "exit", "退出", "q"];

/// Runs the interactive chat loop.
pub async fn run_chat(config: Config) -> Result<()> {
    let (orchestrator, llm) = super::build_session(&config)?;

    let (tools, failures) = orchestrator.discover_tools().await?;
    for failure in &failures {
        eprintln!(
            "warning: server '{}' unavailable: {}",
            failure.server_key, failure.message
        );
    }

    // A chat session has no single question to narrow by, so every
    // discovered tool is activated for its duration.
    let selection = selection::select_all(&tools);
    let activated = match orchestrator.activate(&selection).await {
        Ok(n) => n,
        Err(e) => {
            super::ask::release_and_report(&orchestrator).await;
            return Err(e);
        }
    };

    println!(
        "Connected to {} server(s) with {} tool(s). Type 'quit' to leave.",
        activated,
        tools.len()
    );

    let mut rl = DefaultEditor::new()?;
    let mut history = vec![ChatMessage::system(agent::ANSWER_SYSTEM_PROMPT)];

    loop {
        match rl.readline(&"you> ".cyan().to_string()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if EXIT_WORDS.contains(&trimmed.to_lowercase().as_str()) {
                    break;
                }
                rl.add_history_entry(trimmed)?;

                match agent::answer_with_history(&llm, &orchestrator, &mut history, trimmed).await {
                    Ok(answer) => println!("{}\n", answer),
                    Err(e) => eprintln!("{}", format!("error: {}", e).red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("{}", format!("readline error: {}", e).red());
                break;
            }
        }
    }

    super::ask::release_and_report(&orchestrator).await;
    println!("Session closed.");
    Ok(())
}
