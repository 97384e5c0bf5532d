//! `taskweave memory`: Inspect and edit per-user memory.

use super::CommandResult;

pub async fn show(user: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    let store = super::load_memory(&config)?;
    let user = user.unwrap_or_else(|| config.agent.default_user.clone());

    println!("Memory for '{user}'");
    println!("{}", store.get(&user).await.render());

    Ok(())
}

pub async fn set(key: String, value: String, user: Option<String>) -> CommandResult {
    let config = super::load_config()?;
    if !config.memory.persist {
        return Err("Memory persistence is disabled ([memory] persist = false)".into());
    }

    let store = super::load_memory(&config)?;
    let user = user.unwrap_or_else(|| config.agent.default_user.clone());

    store.set(&user, key.as_str(), value).await;
    super::save_memory(&config, &store).await?;
    println!("Stored '{key}' for '{user}'");

    Ok(())
}
