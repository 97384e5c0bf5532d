//! `taskweave personas`: List the persona catalog.

use super::CommandResult;

pub async fn run() -> CommandResult {
    let config = super::load_config()?;
    let catalog = config.persona_catalog();
    let default_id = &config.agent.default_persona;

    println!("Personas");
    println!("========");
    for persona in catalog.list() {
        let marker = if &persona.id == default_id { "*" } else { " " };
        println!(" {marker} {:<10} {:<20} {}", persona.id, persona.name, persona.description);
    }

    Ok(())
}
