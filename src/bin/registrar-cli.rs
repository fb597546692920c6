use clap::{Parser, Subcommand};

use upstream_registrar::admin::AdminClient;
use upstream_registrar::config::AdminClientConfig;
use upstream_registrar::upstream::{Reconciler, UpstreamRef};

#[derive(Parser)]
#[command(name = "registrar-cli")]
#[command(about = "Management CLI for gateway upstream registrations", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:9180/apisix/admin")]
    url: String,

    #[arg(short, long, env = "APISIX_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an upstream document
    Show { upstream_id: String },
    /// Add a node to an upstream, creating it if needed
    Join {
        upstream_id: String,
        node: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long = "type", default_value = "roundrobin")]
        lb_type: String,
    },
    /// Remove a node from an upstream
    RemoveNode { upstream_id: String, node: String },
    /// Create or replace a route bound to an upstream
    CreateRoute {
        route_id: String,
        uri: String,
        upstream_id: String,
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Delete a route
    DeleteRoute { route_id: String },
    /// Delete an upstream with all of its nodes
    DeleteUpstream { upstream_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = AdminClient::new(&cli.url, &cli.key, &AdminClientConfig::default())?;

    match cli.command {
        Commands::Show { upstream_id } => match client.get_upstream(&upstream_id).await? {
            Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
            None => eprintln!("Upstream '{}' not found", upstream_id),
        },
        Commands::Join {
            upstream_id,
            node,
            name,
            lb_type,
        } => {
            let name = if name.is_empty() { upstream_id.clone() } else { name };
            let upstream = UpstreamRef {
                id: upstream_id,
                lb_type,
            };
            let outcome = Reconciler::new(client, Default::default())
                .create_or_join(&upstream, &name, &node)
                .await?;
            println!("{:?}", outcome);
        }
        Commands::RemoveNode { upstream_id, node } => {
            let outcome = Reconciler::new(client, Default::default())
                .remove_node(&upstream_id, &node)
                .await?;
            println!("{:?}", outcome);
        }
        Commands::CreateRoute {
            route_id,
            uri,
            upstream_id,
            name,
        } => {
            let name = if name.is_empty() { route_id.clone() } else { name };
            client.create_route(&route_id, &name, &uri, &upstream_id).await?;
            println!("Route '{}' → upstream '{}'", route_id, upstream_id);
        }
        Commands::DeleteRoute { route_id } => {
            client.delete_route(&route_id).await?;
            println!("Route '{}' deleted", route_id);
        }
        Commands::DeleteUpstream { upstream_id } => {
            client.delete_upstream(&upstream_id).await?;
            println!("Upstream '{}' deleted", upstream_id);
        }
    }

    Ok(())
}
