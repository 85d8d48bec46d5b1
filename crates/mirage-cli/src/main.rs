//! Mirage CLI - inspect routes, check fixtures and resolve requests
#![cfg_attr(
    test,
    allow(
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        reason = "Allow for tests"
    )
)]

use clap::Parser as _;
use cli::{Cli, Command};
use mirage_deps::anyhow::Result;

mod cli;
mod handlers;

fn main() -> Result<()> {
    let cli = Cli::parse();
    handlers::init_logging();

    let config = handlers::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Parse { href } => handlers::handle_parse(&config, &href),
        Command::Check { dir } => handlers::handle_check(&config, &dir),
        Command::Resolve {
            fixtures,
            seed,
            route,
            method,
            path,
        } => handlers::handle_resolve(
            config,
            &handlers::ResolveArgs {
                fixtures,
                seed,
                route,
                method,
                path,
            },
        ),
    }
}
