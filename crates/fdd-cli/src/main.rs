//! `fdd` command line
//!
//! Prints one JSON document on stdout per invocation. Logs go to stderr.
//! Exit codes: 0 PASS, 2 FAIL, 1 setup or file error.

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use fdd_core::{scan_ids, ArtifactReport, IdLocation, IdentifierIndex, Project, Validator};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_SETUP: u8 = 1;

fn cli() -> Command {
    Command::new("fdd")
        .version(fdd_core::VERSION)
        .about("Cross-artifact consistency and code traceability for FDD documentation")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs on stderr as JSON lines"),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate an artifact, an artifact directory or the whole project")
                .arg(
                    Arg::new("path")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Artifact file or directory; the project root validates everything"),
                )
                .arg(
                    Arg::new("code-root")
                        .long("code-root")
                        .value_parser(value_parser!(PathBuf))
                        .help("Code corpus root, relative to the project root"),
                )
                .arg(
                    Arg::new("jobs")
                        .long("jobs")
                        .short('j')
                        .value_parser(value_parser!(usize))
                        .help("Worker threads (0 picks one per core)"),
                )
                .arg(
                    Arg::new("skip-code")
                        .long("skip-code")
                        .action(ArgAction::SetTrue)
                        .help("Skip the code traceability scan"),
                ),
        )
        .subcommand(
            Command::new("where-defined")
                .about("List definitions of an identifier")
                .arg(Arg::new("id").required(true).help("Identifier"))
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("where-used")
                .about("List references to an identifier")
                .arg(Arg::new("id").required(true).help("Identifier"))
                .arg(root_arg()),
        )
        .subcommand(
            Command::new("scan-ids")
                .about("List every identifier occurrence in one file")
                .arg(
                    Arg::new("path")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Artifact file"),
                ),
        )
}

fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .default_value(".")
        .value_parser(value_parser!(PathBuf))
        .help("Any path inside the project")
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("serializing output")?;
    println!("{text}");
    Ok(())
}

fn path_arg(args: &ArgMatches, name: &str) -> anyhow::Result<PathBuf> {
    args.get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing argument '{name}'"))
}

fn validate(args: &ArgMatches) -> anyhow::Result<u8> {
    let path = path_arg(args, "path")?;
    let code_root = args.get_one::<PathBuf>("code-root").cloned();
    let jobs = args.get_one::<usize>("jobs").copied();

    let run = || -> fdd_core::CoreResult<ArtifactReport> {
        let project = Project::discover_with(&path, |mut config| {
            if let Some(code_root) = code_root {
                config = config.with_code_root(code_root);
            }
            if let Some(jobs) = jobs {
                config = config.with_jobs(jobs);
            }
            config
        })?;
        Validator::new(&project)?
            .with_skip_code(args.get_flag("skip-code"))
            .validate(&path)
    };

    match run() {
        Ok(report) => {
            print_json(&report)?;
            Ok(u8::try_from(report.status.exit_code()).unwrap_or(EXIT_SETUP))
        }
        Err(e) => {
            tracing::error!(error = %e, "validation could not run");
            let target = e.path().map_or_else(|| path.clone(), Path::to_path_buf);
            print_json(&ArtifactReport::foundational(target, e.to_string()))?;
            Ok(EXIT_SETUP)
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryOutput<'a> {
    id: &'a str,
    count: usize,
    locations: Vec<IdLocation>,
}

fn query(args: &ArgMatches, defined: bool) -> anyhow::Result<u8> {
    let id = args
        .get_one::<String>("id")
        .context("missing argument 'id'")?;
    let root = path_arg(args, "root")?;
    let project = Project::discover(&root)
        .with_context(|| format!("opening project at {}", root.display()))?;
    let index = IdentifierIndex::build(&project);
    let locations = if defined {
        index.where_defined(id)
    } else {
        index.where_used(id)
    };
    print_json(&QueryOutput {
        id,
        count: locations.len(),
        locations,
    })?;
    Ok(0)
}

#[derive(Debug, Serialize)]
struct ScanOutput {
    path: PathBuf,
    count: usize,
    ids: Vec<IdLocation>,
}

fn scan(args: &ArgMatches) -> anyhow::Result<u8> {
    let path = path_arg(args, "path")?;
    let project = Project::discover(&path)
        .with_context(|| format!("opening project for {}", path.display()))?;
    let ids = scan_ids(&project, &path)
        .with_context(|| format!("scanning {}", path.display()))?;
    print_json(&ScanOutput {
        path,
        count: ids.len(),
        ids,
    })?;
    Ok(0)
}

fn run(matches: &ArgMatches) -> anyhow::Result<u8> {
    match matches.subcommand() {
        Some(("validate", args)) => validate(args),
        Some(("where-defined", args)) => query(args, true),
        Some(("where-used", args)) => query(args, false),
        Some(("scan-ids", args)) => scan(args),
        _ => anyhow::bail!("unknown command"),
    }
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("log-json"));

    match run(&matches) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!(error = %e, "fdd failed");
            eprintln!("error: {e:#}");
            ExitCode::from(EXIT_SETUP)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn validate_arguments() {
        let matches = cli()
            .try_get_matches_from(["fdd", "--log-json", "validate", "docs/PRD.md", "-j", "4", "--skip-code"])
            .unwrap();
        assert!(matches.get_flag("log-json"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "validate");
        assert_eq!(path_arg(args, "path").unwrap(), PathBuf::from("docs/PRD.md"));
        assert_eq!(args.get_one::<usize>("jobs"), Some(&4));
        assert!(args.get_flag("skip-code"));
        assert!(args.get_one::<PathBuf>("code-root").is_none());
    }

    #[test]
    fn validate_defaults_to_current_directory() {
        let matches = cli().try_get_matches_from(["fdd", "validate"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(path_arg(args, "path").unwrap(), PathBuf::from("."));
    }

    #[test]
    fn queries_require_an_id() {
        assert!(cli().try_get_matches_from(["fdd", "where-used"]).is_err());
        let matches = cli()
            .try_get_matches_from(["fdd", "where-defined", "app-req-auth", "--root", "docs"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(args.get_one::<String>("id").map(String::as_str), Some("app-req-auth"));
        assert_eq!(path_arg(args, "root").unwrap(), PathBuf::from("docs"));
    }
}
