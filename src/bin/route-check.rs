use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Value};

use resource_router::config::{build_registry, load_config};
use resource_router::routing::{DispatchError, RequestHead, Stage};

#[derive(Parser)]
#[command(name = "route-check")]
#[command(about = "Resolve a request against a router configuration without serving it", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: PathBuf,

    /// HTTP method (case-sensitive).
    #[arg(short, long, default_value = "GET")]
    method: String,

    /// Value of the Accept header.
    #[arg(short, long)]
    accept: Option<String>,

    /// Value of the Content-Type header.
    #[arg(short = 't', long)]
    content_type: Option<String>,

    /// Request path, percent-encoded as it would appear on the wire.
    path: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;
    let registry = build_registry(&config.services)?;

    let head = RequestHead::new(&cli.method, &cli.path)
        .content_type(cli.content_type.as_deref())
        .accept(cli.accept.as_deref());

    let report = match registry.select(&head) {
        Ok(selection) => json!({
            "status": 200,
            "stage": Stage::Dispatched.to_string(),
            "service": selection.service.root().as_str(),
            "route": {
                "name": selection.route.name(),
                "method": selection.route.method(),
                "path": selection.route.template().as_str(),
                "produces": selection.route.produces().iter().map(ToString::to_string).collect::<Vec<_>>(),
            },
            "params": selection.params,
        }),
        Err(error) => failure(&error),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn failure(error: &DispatchError) -> Value {
    let mut report = json!({
        "status": error.status().as_u16(),
        "stage": Stage::of(error).to_string(),
        "error": error.to_string(),
    });
    if let DispatchError::MethodNotAllowed { allowed } = error {
        report["allow"] = json!(allowed);
    }
    report
}
