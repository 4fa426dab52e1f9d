use std::sync::Arc;

use valentine_puzzle::cli::{Command, parse_cli};
use valentine_puzzle::config::AppConfig;
use valentine_puzzle::server::{self, AppState};
use valentine_puzzle::wordbank::WordBank;
use valentine_puzzle::{logging, tui};

fn main() {
    let cli = parse_cli();
    let wordbank = match &cli.wordbank_path {
        Some(path) => match WordBank::from_file(path) {
            Ok(bank) => bank,
            Err(e) => {
                eprintln!("Failed to load word bank from '{path}': {e}");
                return;
            }
        },
        None => WordBank::embedded(),
    };
    let config = Arc::new(AppConfig::from_env());
    let wordbank = Arc::new(wordbank);

    match cli.command.unwrap_or(Command::Play) {
        Command::Play => {
            if let Err(e) = tui::run(config, wordbank) {
                eprintln!("Puzzle error: {e}");
            }
        }
        Command::Serve { bind } => {
            logging::init();
            let state = AppState::new(config, wordbank);
            let runtime = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    eprintln!("Failed to start async runtime: {e}");
                    return;
                }
            };
            if let Err(e) = runtime.block_on(server::serve(bind, state)) {
                eprintln!("Server error: {e}");
            }
        }
    }
}
