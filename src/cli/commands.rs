use crate::middleware::OpenApiMiddleware;
use crate::runtime_config::RuntimeConfig;
use crate::server::HttpRequest;
use crate::spec::{load_spec, OperationDefinition};
use anyhow::Context;
use clap::{Parser, Subcommand};
use http::Method;
use std::io::Write;
use std::path::PathBuf;

/// Exit status of a successful run.
pub const EXIT_OK: i32 = 0;
/// Exit status when `check` rejects the request.
pub const EXIT_INVALID: i32 = 1;
/// Exit status when the document cannot be loaded or the arguments are unusable.
pub const EXIT_ERROR: i32 = 2;

/// Command-line interface for openapi-guard
#[derive(Parser, Debug)]
#[command(name = "openapi-guard", version)]
#[command(about = "Validate HTTP requests against an OpenAPI document", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List every operation and the locations it validates
    Inspect {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,
    },
    /// Validate one request against the document
    ///
    /// Prints `ok` when the request passes, `no operation` when nothing in
    /// the document matches it, and the validation error otherwise.
    Check {
        /// Path to the OpenAPI specification file (YAML or JSON)
        #[arg(short, long)]
        spec: PathBuf,

        /// HTTP method, e.g. GET or post
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path including the query string, e.g. /pets?limit=10
        #[arg(short, long)]
        path: String,

        /// Request header as NAME:VALUE (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Raw request body. Defaults the content-type to application/json.
        #[arg(short, long)]
        body: Option<String>,
    },
}

/// Parse the process arguments and run the selected command.
///
/// # Errors
///
/// Returns an error if the OpenAPI document cannot be loaded or an argument
/// cannot be turned into a request.
pub fn run_cli() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

/// Run `cli`, writing results to `out`. Returns the process exit status.
pub fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Inspect { spec } => {
            let mut operations = load_spec(&spec)?;
            operations.sort_by(|a, b| {
                a.path_template
                    .cmp(&b.path_template)
                    .then_with(|| a.method.as_str().cmp(b.method.as_str()))
            });
            for op in &operations {
                writeln!(out, "{}", describe(op))?;
            }
            Ok(EXIT_OK)
        }
        Commands::Check {
            spec,
            method,
            path,
            headers,
            body,
        } => {
            let middleware = OpenApiMiddleware::with_config(load_spec(&spec)?, RuntimeConfig::from_env())?;
            let mut request = build_request(&method, &path, &headers, body)?;
            match middleware.validate(&mut request) {
                Ok(Some(_)) => {
                    writeln!(out, "ok")?;
                    Ok(EXIT_OK)
                }
                Ok(None) => {
                    writeln!(out, "no operation")?;
                    Ok(EXIT_OK)
                }
                Err(err) => {
                    writeln!(out, "{err}")?;
                    for detail in err.details().iter().skip(1) {
                        writeln!(out, "  {detail}")?;
                    }
                    Ok(EXIT_INVALID)
                }
            }
        }
    }
}

/// `METHOD TEMPLATE locations=[...]`
fn describe(op: &OperationDefinition) -> String {
    let locations: Vec<&str> = op.locations().map(|l| l.as_str()).collect();
    format!(
        "{} {} locations=[{}]",
        op.method,
        op.path_template,
        locations.join(",")
    )
}

fn build_request(
    method: &str,
    path: &str,
    headers: &[String],
    body: Option<String>,
) -> anyhow::Result<HttpRequest> {
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid HTTP method '{method}'"))?;
    let mut request = HttpRequest::new(method, path);
    for header in headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("header '{header}' is not NAME:VALUE"))?;
        request = request.with_header(name.trim(), value.trim());
    }
    if let Some(body) = body {
        if request.header("content-type").is_none() {
            request = request.with_header("content-type", "application/json");
        }
        request = request.with_body(body);
    }
    Ok(request)
}
