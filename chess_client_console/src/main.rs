// Legend for various fix-this comments:
//   * "TODO" - bug or missing crucial feature.
//   * "Improvement potential" - missing nice-to-have feature or an opportunity
//       to make code better or faster.

#![forbid(unsafe_code)]
#![cfg_attr(feature = "strict", deny(warnings))]

pub mod network;
pub mod tui;

mod client_config;
mod client_main;

use std::time::Duration;

use anyhow::Context;
use chess_client::session::{GameMode, PlayerSide};
use clap::{Command, arg};
use url::Url;

use client_config::ConsoleConfig;


fn main() -> anyhow::Result<()> {
    // The board owns stdout, so logs go to stderr. Redirect it to a file to read them.
    env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let matches = Command::new("Chess client")
        .version(clap::crate_version!())
        .about("Terminal client for the chess server")
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Create or continue a game")
                .arg(arg!(<url> "Game URL").long_help(concat!(
                    "Game URL, e.g. http://localhost:8080/ for a new game or ",
                    "http://localhost:8080/game/17/position/4?debug=true&desiredSide=BLACK"
                )))
                .arg(arg!(
                    --"config" <file> "Path to the configuration file: yaml-serialized ConsoleConfig."
                ))
                .arg(
                    arg!(--"mode" <mode> "Game mode to pick for new games")
                        .value_parser(["pvp", "ai", "single"]),
                )
                .arg(
                    arg!(--"side" <side> "Side to pick when the server asks")
                        .value_parser(["white", "black", "viewer"]),
                )
                .arg(arg!(
                    --"poll-interval" <duration> "How often to check for opponent moves, e.g. 500ms"
                )),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("play", sub_matches)) => {
            let mut config = match sub_matches.get_one::<String>("config") {
                Some(filename) => read_config_file(filename)?,
                None => ConsoleConfig::default(),
            };
            if let Some(mode) = sub_matches.get_one::<String>("mode") {
                config.default_mode = Some(mode.parse::<GameMode>().context("Parsing --mode")?);
            }
            if let Some(side) = sub_matches.get_one::<String>("side") {
                config.default_side = Some(side.parse::<PlayerSide>().context("Parsing --side")?);
            }
            if let Some(interval) = sub_matches.get_one::<String>("poll-interval") {
                config.poll_interval = Some(parse_duration(interval)?);
            }
            let url = sub_matches.get_one::<String>("url").context("Missing game URL")?;
            let url = Url::parse(url).with_context(|| format!("Parsing game URL '{}'", url))?;
            client_main::run(client_main::ClientConfig::new(url, config)?)
        }
        _ => unreachable!("Exhausted list of subcommands and subcommand_required prevents `None`"),
    }
}

fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    humantime::parse_duration(s).with_context(|| format!("Parsing duration '{}'", s))
}

fn read_config_file(filename: &str) -> anyhow::Result<ConsoleConfig> {
    let contents = std::fs::read_to_string(filename)
        .with_context(|| format!("Reading config file '{}'", filename))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Parsing config file '{}'", filename))
}
