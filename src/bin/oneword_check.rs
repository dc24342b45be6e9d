use std::io::{self, BufRead};
use std::process::ExitCode;

use log::{debug, info, warn};

use oneword::config::FeedConfig;
use oneword::validation::{normalize_word, validate_word};

fn main() -> ExitCode {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(path) => info!("Environment variables loaded from {}", path.display()),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let config = match FeedConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    debug!("Configuration: {:?}", config);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let words: Vec<String> = if args.is_empty() {
        io::stdin().lock().lines().map_while(|line| line.ok()).collect()
    } else {
        args
    };

    let mut rejected = 0usize;
    for word in &words {
        match validate_word(word) {
            None => println!("{}\tok", normalize_word(word)),
            Some(err) => {
                rejected += 1;
                println!("{}\t{}", word.trim(), err);
            }
        }
    }

    info!("Checked {} words, {} rejected", words.len(), rejected);
    if rejected > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
