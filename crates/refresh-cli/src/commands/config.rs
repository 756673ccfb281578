use std::io::BufRead;

use clap::Subcommand;
use refresh_auth::{CredentialStore, KeyringStore, TOKEN_KEY};
use refresh_core::config::RefreshConfig;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Initialize ~/.refresh/ with a default config file
    Init,
    /// Show the effective configuration
    Show,
    /// Store the API token in the OS keychain (read from stdin if omitted)
    SetToken { token: Option<String> },
    /// Remove the API token from the OS keychain
    ClearToken,
}

pub fn run(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let home = RefreshConfig::init()?;
            println!("Initialized refresh at {}", home.display());
            println!("  config: {}", RefreshConfig::config_path()?.display());
            Ok(())
        }
        ConfigAction::Show => {
            let config = RefreshConfig::load()?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{toml_str}");
            Ok(())
        }
        ConfigAction::SetToken { token } => {
            let token = match token {
                Some(t) => t,
                None => {
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line
                }
            };
            let token = token.trim();
            if token.is_empty() {
                anyhow::bail!("no token given");
            }
            KeyringStore::new().store(TOKEN_KEY, token)?;
            println!("Token stored in the OS keychain.");
            Ok(())
        }
        ConfigAction::ClearToken => {
            KeyringStore::new().delete(TOKEN_KEY)?;
            println!("Token removed from the OS keychain.");
            Ok(())
        }
    }
}
