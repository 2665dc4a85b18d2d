use crate::config::AppConfig;
use clap::Subcommand;
use lab_api::ApiClient;

pub mod api;
pub mod config;

pub use self::api::ApiArgs;
pub use self::config::ConfigCommands;

#[derive(Subcommand, PartialEq, Debug)]
pub enum Commands {
    /// Get CLI Version
    Version,

    /// Show how the API client resolves for a host
    Status {
        /// Host to connect to (default: gitlab.com or $LAB_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Resolve the GraphQL endpoint instead of REST
        #[arg(long, default_value_t = false)]
        graphql: bool,
    },

    /// Make an authenticated request to the REST or GraphQL API
    Api(ApiArgs),

    /// Read and write per-host settings
    #[command(subcommand)]
    Config(ConfigCommands),
}

impl Commands {
    pub async fn run(self, config: AppConfig) -> Result<(), String> {
        match self {
            Commands::Version => {
                println!("lab v{}", env!("CARGO_PKG_VERSION"));
            }
            Commands::Status { host, graphql } => {
                let mut client = ApiClient::new();
                let handle = client
                    .connect_with_config(host.as_deref().unwrap_or_default(), &config, graphql)
                    .map_err(|e| e.to_string())?;
                let base_url = handle.base_url().clone();
                let transport = handle.transport_kind();

                println!("host:      {}", client.host());
                println!("base url:  {}", base_url);
                println!("protocol:  {}", client.protocol());
                println!("transport: {}", transport);
                println!("auth:      {:?}", client.auth_mode());
            }
            Commands::Api(args) => {
                args.run(&config).await?;
            }
            Commands::Config(command) => {
                command.run(config)?;
            }
        }
        Ok(())
    }
}
