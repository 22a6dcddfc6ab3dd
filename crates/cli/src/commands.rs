//! Clap command definition and argument extraction.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Arg, ArgAction, ArgMatches, Command};
use conduit_core::{Method, RequestSpec};

use crate::format::OutputMode;

/// Build the CLI command.
pub fn build_cli() -> Command {
    Command::new("conduit")
        .about("Fetch URLs concurrently through the conduit transaction manager")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Config file (default: ./conduit.toml when present)"),
        )
        .arg(
            Arg::new("init-config")
                .long("init-config")
                .help("Write a default config file and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("method")
                .long("method")
                .short('X')
                .value_name("METHOD")
                .default_value("GET")
                .help("Request method: GET or POST"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .short('d')
                .value_name("BODY")
                .help("Request body (required for POST, also sent with GET)"),
        )
        .arg(
            Arg::new("timeout-ms")
                .long("timeout-ms")
                .value_name("N")
                .value_parser(clap::value_parser!(u64))
                .help("Per-request timeout in milliseconds"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("JSON output mode")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("urls")
                .value_name("URL")
                .num_args(1..)
                .required_unless_present("init-config")
                .help("URLs to fetch"),
        )
}

/// What the user asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub init_config: bool,
    pub output: OutputMode,
    pub requests: Vec<RequestSpec>,
}

/// Turn parsed matches into request specs.
pub fn matches_to_invocation(matches: &ArgMatches) -> anyhow::Result<Invocation> {
    let method_name = matches
        .get_one::<String>("method")
        .map(String::as_str)
        .unwrap_or("GET");
    let method = Method::parse(method_name)
        .with_context(|| format!("invalid --method '{}'", method_name))?;

    let data = matches.get_one::<String>("data");
    let timeout = matches
        .get_one::<u64>("timeout-ms")
        .map(|ms| Duration::from_millis(*ms));
    if timeout == Some(Duration::ZERO) {
        bail!("--timeout-ms must be greater than zero");
    }

    let requests = matches
        .get_many::<String>("urls")
        .into_iter()
        .flatten()
        .map(|url| {
            let mut spec = RequestSpec::new(url.as_str(), method);
            if let Some(body) = data {
                spec = spec.with_body(body.as_str());
            }
            if let Some(timeout) = timeout {
                spec = spec.with_timeout(timeout);
            }
            spec
        })
        .collect();

    Ok(Invocation {
        config: matches.get_one::<String>("config").map(PathBuf::from),
        init_config: matches.get_flag("init-config"),
        output: if matches.get_flag("json") {
            OutputMode::Json
        } else {
            OutputMode::Human
        },
        requests,
    })
}
