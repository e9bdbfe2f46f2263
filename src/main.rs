mod cli;
mod db;
mod error;
mod frequency;
mod lifecycle;
mod occurrence;
mod store;
mod types;

use std::rc::Rc;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let db_path = db::default_db_path();
    let conn = Rc::new(db::init(&db_path)?);
    let cli_opts = cli::Cli::parse();
    cli::run(cli_opts.command, conn)
}
