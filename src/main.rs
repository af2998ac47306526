use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use echobody::{CALLABLE_ECHO_NAME, FunctionServer, FunctionsClient, Payload, ServerConfig, ServerTrait};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "echobody", version, about = "Echo probes for function-platform clients")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the echoBody (callable) and echoBodyHttp (HTTP) functions
    Serve(ServeArgs),
    /// Invoke a callable function and print its result
    Call {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        #[arg(default_value = CALLABLE_ECHO_NAME)]
        function: String,
        /// JSON payload
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// POST a JSON body to an HTTP function and print the response
    Post {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: SocketAddr,
        function: String,
        /// JSON body
        #[arg(default_value = "{}")]
        body: String,
    },
}

/// Options left unset take their values from `ServerConfig::default()`
#[derive(Debug, Args)]
struct ServeArgs {
    /// Address to bind to
    #[arg(long)]
    bind: Option<SocketAddr>,
    /// Maximum number of concurrent connections
    #[arg(long)]
    max_connections: Option<usize>,
    /// Largest request body accepted, in bytes
    #[arg(long)]
    max_body_size: Option<usize>,
    /// Seconds to wait for a request on an open connection
    #[arg(long)]
    read_timeout: Option<u64>,
    /// Seconds a response write may take
    #[arg(long)]
    write_timeout: Option<u64>,
    /// Value of the Server response header
    #[arg(long)]
    server_name: Option<String>,
}

impl ServeArgs {
    fn into_config(self) -> ServerConfig {
        let defaults = ServerConfig::default();
        ServerConfig {
            bind_addr: self.bind.unwrap_or(defaults.bind_addr),
            max_connections: self.max_connections.unwrap_or(defaults.max_connections),
            max_body_size: self.max_body_size.unwrap_or(defaults.max_body_size),
            read_timeout: self.read_timeout.map_or(defaults.read_timeout, Duration::from_secs),
            write_timeout: self.write_timeout.map_or(defaults.write_timeout, Duration::from_secs),
            server_name: self.server_name.or(defaults.server_name),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("echobody=info")),
        )
        .init();

    match Cli::parse().command {
        Command::Serve(args) => {
            let config = args.into_config();
            info!(address = %config.bind_addr, max_connections = config.max_connections, "Starting function server");
            let server = FunctionServer::new(config, echobody::echo::registry());
            server.run().await.wrap_err("Failed to run function server")?;
        }
        Command::Call {
            addr,
            function,
            payload,
        } => {
            let payload: Payload = serde_json::from_str(&payload).wrap_err("Payload is not valid JSON")?;
            let mut client = FunctionsClient::connect(addr)
                .await
                .wrap_err_with(|| format!("Failed to connect to {addr}"))?;
            let result = client
                .call(&function, payload)
                .await
                .wrap_err_with(|| format!("Call to {function} failed"))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Post {
            addr,
            function,
            body,
        } => {
            let body: Payload = serde_json::from_str(&body).wrap_err("Body is not valid JSON")?;
            let mut client = FunctionsClient::connect(addr)
                .await
                .wrap_err_with(|| format!("Failed to connect to {addr}"))?;
            let (status, response) = client
                .post_json(&function, &body)
                .await
                .wrap_err_with(|| format!("Request to {function} failed"))?;
            println!("{status}");
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    }

    Ok(())
}
