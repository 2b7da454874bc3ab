use anyhow::Result;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use extforge_cli::{
    export_project, import_icons, init_tracing, load_config, validate_project, ExportArgs,
    LogFormat,
};
use extforge_core::{EntryPointPolicy, ExportError, Visibility};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

fn cli() -> Command {
    Command::new("extforge")
        .version(extforge_cli::VERSION)
        .about("Repair and package generated browser extensions")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Pipeline configuration file (TOML)"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .global(true)
                .default_value("info")
                .help("Default log filter when RUST_LOG is unset"),
        )
        .subcommand(
            Command::new("validate")
                .about("Run the integrity pass over a project directory")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Project directory containing manifest.json"),
                )
                .arg(
                    Arg::new("policy")
                        .long("policy")
                        .value_parser(["warn", "stub"])
                        .help("Entry point policy; overrides the config file"),
                )
                .arg(
                    Arg::new("write")
                        .long("write")
                        .action(ArgAction::SetTrue)
                        .help("Write repaired files back to the directory"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Package a project directory into a ZIP archive")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Project directory containing manifest.json"),
                )
                .arg(
                    Arg::new("assets")
                        .long("assets")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of per-project uploads"),
                )
                .arg(
                    Arg::new("icons")
                        .long("icons")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of shared PNG icons"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file, or directory to place the archive in"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Display name used for the archive file name"),
                ),
        )
        .subcommand(
            Command::new("import-icons")
                .about("List the shared icon records a directory would produce")
                .arg(
                    Arg::new("dir")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory of PNG icons"),
                )
                .arg(
                    Arg::new("visibility")
                        .long("visibility")
                        .default_value(Visibility::GLOBAL)
                        .help("Visibility scope of the imported icons"),
                ),
        )
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn path_arg(args: &ArgMatches, name: &str) -> Option<PathBuf> {
    args.get_one::<PathBuf>(name).cloned()
}

async fn run(matches: ArgMatches) -> Result<ExitCode> {
    let config = load_config(matches.get_one::<PathBuf>("config").map(PathBuf::as_path))?;

    match matches.subcommand() {
        Some(("validate", args)) => {
            let policy = match args.get_one::<String>("policy").map(String::as_str) {
                Some("stub") => EntryPointPolicy::Stub,
                Some(_) => EntryPointPolicy::Warn,
                None => config.entry_point_policy,
            };
            let dir = path_arg(args, "dir").unwrap_or_default();
            let summary = validate_project(&dir, policy, args.get_flag("write"))?;
            let clean = summary.report.is_clean();
            print_json(&summary)?;
            Ok(if clean || summary.written {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            })
        }
        Some(("export", args)) => {
            let export = ExportArgs {
                project_dir: path_arg(args, "dir").unwrap_or_default(),
                assets_dir: path_arg(args, "assets"),
                icons_dir: path_arg(args, "icons"),
                out: path_arg(args, "out").unwrap_or_else(|| PathBuf::from(".")),
                display_name: args.get_one::<String>("name").cloned(),
            };
            match export_project(config, &export).await {
                Ok(summary) => {
                    print_json(&summary)?;
                    Ok(ExitCode::SUCCESS)
                }
                Err(err) => match err.downcast_ref::<ExportError>() {
                    Some(export_err) => {
                        eprintln!("{}", serde_json::to_string_pretty(&export_err.body())?);
                        tracing::error!(
                            status = export_err.status_code(),
                            error = %export_err,
                            "export failed"
                        );
                        Ok(ExitCode::FAILURE)
                    }
                    None => Err(err),
                },
            }
        }
        Some(("import-icons", args)) => {
            let dir = path_arg(args, "dir").unwrap_or_default();
            let visibility = args
                .get_one::<String>("visibility")
                .map_or_else(Visibility::global, |scope| Visibility::scoped(scope.as_str()));
            print_json(&import_icons(&dir, &visibility)?)?;
            Ok(ExitCode::SUCCESS)
        }
        _ => Ok(ExitCode::FAILURE),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let matches = cli().get_matches();
    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };
    let level = matches
        .get_one::<String>("log-level")
        .map_or("info", String::as_str);
    init_tracing(format, level);

    match run(matches).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
