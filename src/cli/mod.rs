//! # CLI Module
//!
//! Command-line front end for the validation middleware, shipped as the
//! `openapi-guard` binary.
//!
//! ## Commands
//!
//! ### `inspect`
//!
//! List every operation in a document and the locations it validates:
//!
//! ```bash
//! openapi-guard inspect --spec openapi.yml
//! # GET /pets locations=[query]
//! # POST /pets locations=[body]
//! ```
//!
//! ### `check`
//!
//! Run one request through the middleware:
//!
//! ```bash
//! openapi-guard check --spec openapi.yml --method POST --path /pets --body '{"name": "Rex"}'
//! openapi-guard check --spec openapi.yml --path '/pets?tags[]=good&tags[]=boi'
//! ```
//!
//! Exit status: `0` when the request passes (or no operation matches), `1`
//! when validation fails, `2` when the document cannot be loaded.
//!
//! ## Logging
//!
//! Set `RUST_LOG` (e.g. `RUST_LOG=openapi_guard=debug`) to see resolution
//! and cache events on stderr.

mod commands;


pub use commands::{run, run_cli, Cli, Commands, EXIT_ERROR, EXIT_INVALID, EXIT_OK};
