mod config;
mod http;
mod interrupt;
mod reporting;

use crate::config::{Config, FileConfig};
use crate::http::FetchExecutor;
use crate::reporting::{dispatch, Outcome, Registry, ReporterSelection};
use anyhow::{Context, Error};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use slog::{debug, info, o, warn, Drain, Level};

fn root_logger(level: Level) -> slog::Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let async_drain = slog_async::Async::new(drain).build().fuse();
    let level_filter = slog::LevelFilter(async_drain, level).fuse();
    slog::Logger::root(level_filter, o!())
}

fn cli() -> Command {
    Command::new("tracer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetch a single URI and report how the time was spent")
        .arg(
            Arg::new("uri")
                .long("uri")
                .value_name("URI")
                .help("http:// or https:// URI to fetch"),
        )
        .arg(
            Arg::new("out-file")
                .long("out-file")
                .value_name("PATH")
                .help("Where to write the response body [default: /dev/null]"),
        )
        .arg(
            Arg::new("reporters")
                .long("reporters")
                .value_name("LIST")
                .help("Comma separated reporters to run, or 'list' to show them"),
        )
        .arg(
            Arg::new("no-cache")
                .long("no-cache")
                .action(ArgAction::SetTrue)
                .help("Ask caches along the way not to serve the content"),
        )
        .arg(
            Arg::new("header")
                .short('H')
                .long("header")
                .value_name("NAME: VALUE")
                .action(ArgAction::Append)
                .help("Extra request header, may be repeated"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .value_name("PATH")
                .help("Write the collected trace as JSON"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .help("Overall timeout for the fetch [default: 30]"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to config file"),
        )
        .arg(
            Arg::new("v")
                .short('v')
                .action(ArgAction::Count)
                .help("Sets verbosity level"),
        )
}

fn cli_overrides(matches: &ArgMatches) -> FileConfig {
    let string = |name: &str| matches.get_one::<String>(name).cloned();
    FileConfig {
        uri: string("uri"),
        out_file: string("out-file"),
        reporters: string("reporters").map(|l| l.split(',').map(String::from).collect()),
        no_cache: if matches.get_flag("no-cache") {
            Some(true)
        } else {
            None
        },
        headers: matches
            .get_many::<String>("header")
            .map(|h| h.cloned().collect()),
        json: string("json"),
        timeout_secs: matches.get_one::<u64>("timeout").copied(),
    }
}

fn list_reporters(registry: &Registry) {
    for (name, reporter) in registry.iter() {
        println!("{}: {}", name, reporter.title());
    }
}

fn unknown_reporter(registry: &Registry, name: &str) -> String {
    let known: Vec<&str> = registry.names().collect();
    format!(
        "Unknown reporter '{}', skipping (available: {})",
        name,
        known.join(", ")
    )
}

fn print_outcomes(logger: &slog::Logger, registry: &Registry, outcomes: Vec<(String, Outcome)>) {
    for (name, outcome) in outcomes {
        match outcome {
            Outcome::Report {
                title,
                description,
                body,
            } => {
                println!("{}: {}", name, title);
                println!("{}", description);
                println!("{}", body);
            }
            Outcome::Failed(error) => println!("Reporter {} failed: {}", name, error),
            Outcome::Unknown => warn!(logger, "{}", unknown_reporter(registry, &name)),
        }
    }
}

fn run_fetch(logger: slog::Logger, config: Config, registry: &Registry) -> Result<(), Error> {
    let interrupted = interrupt::register().context("Could not install Ctrl+C handler")?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let json_path = config.json.clone();
    let selection = config.reporters.clone();
    let executor = FetchExecutor::new(config, logger.clone());
    let fetched = rt.block_on(executor.execute(&interrupted))?;
    drop(rt);
    info!(logger, "{}", fetched);
    if fetched.interrupted {
        warn!(logger, "Reports below cover only the data received before the interrupt");
    }

    let json = serde_json::to_string_pretty(&fetched.trace)?;
    debug!(logger, "Collected trace:\n{}", json);
    if let Some(path) = json_path {
        std::fs::write(&path, json)
            .with_context(|| format!("Could not write trace to {}", path.display()))?;
    }

    if let ReporterSelection::Names(names) = selection {
        print_outcomes(&logger, registry, dispatch(registry, &fetched.trace, &names));
    }
    Ok(())
}

fn run(logger: slog::Logger, matches: &ArgMatches) -> Result<(), Error> {
    let file_config = match matches.get_one::<String>("config") {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let merged = file_config.merge(cli_overrides(matches));
    let registry = Registry::builtin();
    if merged.reporter_selection() == ReporterSelection::List {
        list_reporters(&registry);
        return Ok(());
    }
    let config = Config::fill_defaults(merged)?;
    run_fetch(logger, config, &registry)
}

fn main() {
    let matches = cli().get_matches();
    let level = match matches.get_count("v") {
        0 => Level::Warning,
        1 => Level::Info,
        2 => Level::Debug,
        3 => Level::Trace,
        _ => {
            eprintln!("WARNING: more than -vvv is ignored");
            Level::Trace
        }
    };
    let logger = root_logger(level);
    let result = run(logger.clone(), &matches);
    // flush the async drain before exiting
    drop(logger);
    if let Err(e) = result {
        eprintln!("Error running tracer: {:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn cli_values_become_overrides() {
        let matches = cli().get_matches_from(vec![
            "tracer",
            "--uri",
            "https://example.com/ipfs/x",
            "--reporters",
            "Connection,Saturn",
            "-H",
            "A: 1",
            "--header",
            "B: 2",
            "--timeout",
            "5",
        ]);
        let o = cli_overrides(&matches);
        assert_eq!(o.uri.as_deref(), Some("https://example.com/ipfs/x"));
        assert_eq!(
            o.reporters,
            Some(vec!["Connection".to_string(), "Saturn".to_string()])
        );
        assert_eq!(o.headers, Some(vec!["A: 1".to_string(), "B: 2".to_string()]));
        assert_eq!(o.timeout_secs, Some(5));
        assert_eq!(o.no_cache, None);
        assert_eq!(o.out_file, None);
    }

    #[test]
    fn list_needs_no_uri() {
        let matches = cli().get_matches_from(vec!["tracer", "--reporters", "list"]);
        let merged = FileConfig::default().merge(cli_overrides(&matches));
        assert_eq!(merged.reporter_selection(), ReporterSelection::List);
    }

    #[test]
    fn unknown_reporter_names_the_catalog() {
        assert_eq!(
            unknown_reporter(&Registry::builtin(), "Bogus"),
            "Unknown reporter 'Bogus', skipping (available: Connection, Header, IPFSGW, Saturn)"
        );
    }

    #[test]
    fn no_cache_flag() {
        let matches = cli().get_matches_from(vec!["tracer", "--no-cache"]);
        assert_eq!(cli_overrides(&matches).no_cache, Some(true));
    }
}
