use clap::Parser;
use daprside::{
    method_handler, ClientOptions, CommunicationProtocol, DaprServer, InvocationResponse,
    ServerConfig,
};
use log::info;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "daprside")]
#[command(about = "Application-side runtime companion for a Dapr-style sidecar", long_about = None)]
struct Args {
    /// Host to listen on for sidecar callbacks
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on, digits only
    #[arg(short, long, default_value = "50050")]
    port: String,

    /// Host of the sidecar process
    #[arg(long, default_value = "127.0.0.1")]
    dapr_host: String,

    /// Port of the sidecar process, digits only
    #[arg(long, default_value = "50051")]
    dapr_port: String,

    /// Wire protocol: http or grpc (unknown values fall back to http)
    #[arg(long, default_value = "http")]
    protocol: String,

    /// Disable connection reuse on the sidecar client
    #[arg(long, default_value_t = false)]
    no_keep_alive: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    let config = ServerConfig::new()
        .with_server_host(args.host)
        .with_server_port(args.port)
        .with_dapr_host(args.dapr_host)
        .with_dapr_port(args.dapr_port)
        .with_protocol(CommunicationProtocol::parse(&args.protocol))
        .with_client_options(ClientOptions {
            is_keep_alive: !args.no_keep_alive,
        });

    let server = DaprServer::new(config)?;

    // Echo method so the wiring can be exercised end to end
    server
        .invoker()
        .listen(
            "echo",
            method_handler(|request| async move {
                Ok(InvocationResponse {
                    data: request.data,
                    content_type: request.content_type,
                })
            }),
        )
        .await?;
    info!("Registered echo method");

    server.start().await?;
    info!(
        "Serving {} callbacks on {}:{}",
        server.protocol().as_str(),
        server.server_host(),
        server.server_port()
    );
    info!("Press Ctrl+C to shut down");

    signal::ctrl_c().await?;

    server.stop_server().await?;
    info!("Server shut down");

    Ok(())
}
