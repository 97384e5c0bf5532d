//! `taskweave tools`: List registered tools.

use super::CommandResult;

pub async fn run() -> CommandResult {
    let config = super::load_config()?;
    let registry = super::build_tools(&config);

    println!("Tools ({})", registry.len());
    println!("=========");
    for tool in registry.describe_all() {
        println!("  {:<12} {}", tool.name, tool.description);
    }
    println!();
    println!("Invoke from a reply line: {} tool-name: parameter", taskweave_agent::TOOL_MARKER);

    Ok(())
}
