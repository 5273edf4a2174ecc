mod cli;
mod config;
mod report;
mod subcommand {
    pub mod extract;
    pub mod trace;
}

use crate::{
    cli::{Arguments, Subcommands},
    config::Config,
    subcommand::{extract::run_extract, trace::run_trace},
};

use std::path::Path;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    pretty_env_logger::init();
    let arguments = Arguments::parse();
    let config = Config::load(Path::new(&arguments.config))?;

    match arguments.subcommand {
        Subcommands::Trace(args) => run_trace(args),
        Subcommands::Extract(args) => run_extract(args, &config),
    }
}
