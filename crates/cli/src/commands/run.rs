//! `taskweave run`: Execute a goal, optionally as an explicit task chain.

use std::sync::Arc;
use taskweave_agent::{RunRequest, RunResult, ServiceRequest};
use taskweave_core::event::DomainEvent;
use taskweave_core::message::ConversationId;
use tokio::sync::broadcast::error::RecvError;

use super::CommandResult;

pub struct RunArgs {
    pub goal: String,
    pub steps: Vec<String>,
    pub persona: Option<String>,
    pub user: Option<String>,
    pub conversation: Option<i64>,
    pub backend: Option<String>,
    pub json: bool,
    pub verbose: bool,
}

pub async fn run(args: RunArgs) -> CommandResult {
    let config = super::load_config()?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  WARNING: No API key configured.");
        eprintln!("  Set TASKWEAVE_API_KEY or OPENAI_API_KEY, or add api_key to");
        eprintln!("    {}", taskweave_config::AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let memory = Arc::new(super::load_memory(&config)?);
    let service = super::build_service(&config, Arc::clone(&memory)).await?;

    let printer = args.verbose.then(|| {
        let mut rx = service.event_bus().subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) => print_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        eprintln!("  [events] {skipped} events dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let user = args.user.unwrap_or_else(|| config.agent.default_user.clone());
    let persona = args.persona.unwrap_or_else(|| config.agent.default_persona.clone());

    let request = ServiceRequest {
        run: RunRequest::new(user, args.goal)
            .with_steps(args.steps)
            .with_persona(persona),
        backend: args.backend,
        conversation: args.conversation.map(ConversationId),
    };

    let outcome = service.handle(request).await;

    // Dropping the service closes the event bus so the printer drains and exits.
    drop(service);
    if let Some(printer) = printer {
        let _ = printer.await;
    }

    let result = outcome?;
    super::save_memory(&config, &memory).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(())
}

fn print_result(result: &RunResult) {
    println!("Persona: {} ({})", result.persona_name, result.persona_id);
    println!();

    for (i, step) in result.steps.iter().enumerate() {
        if !result.task_chain.is_empty() {
            println!("Step {}: {}", i + 1, step.sub_goal);
        }
        for line in &step.lines {
            println!("  {line}");
        }
        println!();
    }

    println!("Result:");
    println!("{}", result.result);

    if !result.memory.is_empty() {
        println!();
        println!("Memory:");
        println!("{}", result.memory.render());
    }
}

fn print_event(event: &DomainEvent) {
    match event {
        DomainEvent::StepCompleted { index, sub_goal, tool_calls, .. } => {
            eprintln!("  [step {}] {sub_goal} ({tool_calls} tool calls)", index + 1);
        }
        DomainEvent::ToolExecuted { tool_name, success, duration_ms, .. } => {
            let status = if *success { "ok" } else { "failed" };
            eprintln!("  [tool] {tool_name} {status} in {duration_ms}ms");
        }
        DomainEvent::MemoryWritten { key, .. } => eprintln!("  [memory] stored {key}"),
        DomainEvent::RunFailed { step, error_message, .. } => {
            eprintln!("  [failed] step {}: {error_message}", step + 1);
        }
        _ => {}
    }
}
