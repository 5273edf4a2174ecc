use clap::{Args, Parser, Subcommand};

/// Represents CLI arguments.
#[derive(Parser)]
#[clap(author, version)]
pub struct Arguments {
    /// Specifies the configuration file path.
    #[clap(short = 'c', long, default_value = "wfdump.toml")]
    pub config: String,

    /// Subcommand
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

/// Represents available subcommands.
#[derive(Subcommand)]
pub enum Subcommands {
    /// Prints every recognized command of an OBJ file and an optional MTL file.
    Trace(TraceArguments),

    /// Prints the geometry, groups and materials extracted from an OBJ file.
    Extract(ExtractArguments),
}

#[derive(Args)]
pub struct TraceArguments {
    /// Specifies the OBJ file path.
    pub obj: String,

    /// Specifies an MTL file traced after the OBJ file.
    #[clap(short, long)]
    pub mtl: Option<String>,
}

#[derive(Args)]
pub struct ExtractArguments {
    /// Specifies the OBJ file path.
    pub obj: String,

    /// Reads this MTL file instead of following `mtllib` lines.
    #[clap(short, long)]
    pub mtl: Option<String>,

    /// Lists the faces of each group under the material they use.
    #[clap(long)]
    pub combine: bool,
}
