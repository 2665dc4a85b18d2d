use crate::config::AppConfig;
use clap::Subcommand;

/// Per-host configuration subcommands
#[derive(Subcommand, PartialEq, Debug)]
pub enum ConfigCommands {
    /// Print a host setting
    Get {
        /// Host the setting belongs to
        host: String,
        /// One of: token, skip_tls_verify, ca_cert, api_protocol
        key: String,
    },

    /// Store a host setting (an empty value removes it)
    Set {
        /// Host the setting belongs to
        host: String,
        /// One of: token, skip_tls_verify, ca_cert, api_protocol
        key: String,
        value: String,
    },
}

impl ConfigCommands {
    pub fn run(self, mut config: AppConfig) -> Result<(), String> {
        match self {
            ConfigCommands::Get { host, key } => {
                if let Some(value) = config.file.get(&host, &key) {
                    println!("{}", value);
                }
            }
            ConfigCommands::Set { host, key, value } => {
                config
                    .file
                    .set(&host, &key, &value)
                    .map_err(|e| e.to_string())?;
                config.save()?;
                println!("Saved {} for {}", key, host);
            }
        }
        Ok(())
    }
}
