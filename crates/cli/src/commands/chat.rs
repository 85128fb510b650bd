//! Interactive chat — reads from stdin, streams steps to stdout.

use confidant_agent::AgentSession;
use confidant_config::Settings;
use confidant_core::diag::{DiagnosticSink, NoopSink, TracingSink};
use confidant_core::step::{StepKind, StepResult};
use confidant_providers::OpenAiCompatClient;
use confidant_store::FileStore;
use confidant_tools::default_registry;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>, verbose: bool) -> anyhow::Result<()> {
    let settings = Settings::load(&Settings::default_path())?;
    let server = settings.selected()?;
    let llm = Arc::new(OpenAiCompatClient::from_server(server)?);

    let store = Arc::new(FileStore::new(FileStore::default_path()));
    let sink: Arc<dyn DiagnosticSink> = if verbose {
        Arc::new(TracingSink)
    } else {
        Arc::new(NoopSink)
    };

    let mut session = AgentSession::new(llm)
        .with_store(store)
        .with_sink(sink)
        .with_tools(default_registry())
        .restore()
        .await;

    match message {
        Some(input) => {
            run_turn(&mut session, &input).await;
        }
        None => {
            println!("Confidant is listening. Type 'exit' to quit.");
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                print!("you> ");
                std::io::stdout().flush()?;

                match lines.next_line().await? {
                    Some(line) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        if matches!(line, "exit" | "quit" | "/exit" | "/quit" | ":q") {
                            break;
                        }
                        run_turn(&mut session, line).await;
                    }
                    None => break, // EOF (Ctrl+D)
                }
            }
        }
    }

    Ok(())
}

async fn run_turn(session: &mut AgentSession, input: &str) {
    let observer = |step: &StepResult| match step.kind {
        StepKind::Final => println!("confidant> {}", step.content),
        other => println!("  · {}: {}", other, step.content),
    };
    session.process(input, Some(&observer)).await;
}
