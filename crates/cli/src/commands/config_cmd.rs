//! `taskweave config`: Print the default configuration.

use taskweave_config::AppConfig;

use super::CommandResult;

pub async fn run() -> CommandResult {
    println!("# {}", AppConfig::config_dir().join("config.toml").display());
    print!("{}", AppConfig::default_toml());
    Ok(())
}
