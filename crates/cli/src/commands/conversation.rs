//! `taskweave conversation`: Start conversations and read their history.

use taskweave_core::message::ConversationId;

use super::CommandResult;

pub async fn start(title: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let store = super::open_conversations(&config).await?;

    let id = store.create(title.as_deref()).await?;
    println!("{id}");

    Ok(())
}

pub async fn history(id: i64) -> CommandResult {
    let config = super::load_config()?;
    let store = super::open_conversations(&config).await?;
    let id = ConversationId(id);

    if !store.exists(id).await? {
        return Err(format!("Conversation {id} not found").into());
    }

    let turns = store.history(id).await?;
    if turns.is_empty() {
        println!("(no messages yet)");
    }
    for turn in turns {
        println!(
            "[{}] {:<9} {}",
            turn.timestamp.format("%Y-%m-%d %H:%M:%S"),
            turn.role.as_str(),
            turn.content
        );
    }

    Ok(())
}
