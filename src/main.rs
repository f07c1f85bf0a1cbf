//! # Command Line Interface
//!
//! Dispatch commands to `commands` module.

use env_logger;
use tsvkit::commands;
use tsvkit::commands::CommandError;
mod cli;

fn main() -> Result<(),Box<dyn std::error::Error>>
{
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let main_cmd = cli::build_cli();
    let matches = main_cmd.get_matches();

    // Create a volume image

    if let Some(cmd) = matches.subcommand_matches("mkvol") {
        return commands::mkvol::mkvol(cmd);
    }

    // Read a byte range to stdout

    if let Some(cmd) = matches.subcommand_matches("get") {
        return commands::get::get(cmd);
    }

    // Write bytes from a file or stdin

    if let Some(cmd) = matches.subcommand_matches("put") {
        return commands::put::put(cmd);
    }

    // Output the volume parameters as a JSON string

    if let Some(cmd) = matches.subcommand_matches("stat") {
        return commands::stat::stat(cmd);
    }

    log::error!("No subcommand was found, try `tsvkit --help`");
    return Err(Box::new(CommandError::InvalidCommand));
}
