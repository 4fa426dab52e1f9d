use std::net::SocketAddr;

use clap::{Parser, Subcommand};

/// Valentine's countdown puzzle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a newline-delimited dictionary file (replaces the embedded
    /// word list)
    #[arg(short = 'i', long = "wordbank")]
    pub wordbank_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Walk through the puzzle in the terminal (the default)
    Play,
    /// Run the stateless validation endpoints and email triggers
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        bind: SocketAddr,
    },
}

#[must_use]
pub fn parse_cli() -> Cli {
    Cli::parse()
}
