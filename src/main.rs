use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use console_synth::config::ConfigError;
use console_synth::console::{ConsoleCommand, ParseError, help_text, parse};
use console_synth::{Console, Engine, EngineConfig};
use env_logger::Env;

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    println!("=== console_synth ===");

    let config = match load_config(std::env::args().nth(1).map(PathBuf::from)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = match Engine::new(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!("Enter 'help' to see the available commands\n");
    print_notifications(&mut engine);

    let mut console = Console::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                log::error!("Could not read from stdin: {}", e);
                break;
            }
        }

        let feedback = match parse(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(ConsoleCommand::Help) => help_text(),
            Ok(command) => console.execute(&engine, command),
            Err(ParseError::Empty) => String::new(),
            Err(e) => e.to_string(),
        };

        print_notifications(&mut engine);
        if !feedback.is_empty() {
            println!("{}", feedback.trim_end());
        }
    }

    engine.sequencer().stop_playback();
    println!("bye");
}

fn load_config(path: Option<PathBuf>) -> Result<EngineConfig, ConfigError> {
    match path {
        Some(path) => EngineConfig::load_from(&path),
        None => EngineConfig::load_or_default(),
    }
}

fn print_notifications(engine: &mut Engine) {
    for notification in engine.drain_notifications() {
        println!("{}", notification);
    }
}
