//! typed-config: check application configuration against a schema
//!
//! Runs the same load → merge → normalize → validate pipeline an application
//! would run at startup, and prints either the resolved configuration or the
//! validation report.

use anyhow::Result;

mod cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
