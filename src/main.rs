//! Template Resolver CLI
//!
//! Usage:
//!   template-resolver --config <FILE> <COMMAND>
//!
//! Commands:
//!   format   Format fields into a string
//!   parse    Parse a string into fields
//!   pattern  Show a template's placeholder pattern
//!   paths    Search the filesystem with a path template
//!   list     List tokens and templates

use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use template_resolver::{Fields, Resolver, DEFAULT_GROUP, PATH_GROUP};

#[derive(Parser)]
#[command(name = "template-resolver")]
#[command(about = "Format and parse strings through named templates")]
struct Cli {
    /// Token and template definitions (TOML format)
    #[arg(short, long)]
    config: PathBuf,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Format fields into a string
    Format {
        template: String,
        /// Field values as KEY=VALUE
        fields: Vec<String>,
        #[arg(short, long, default_value = DEFAULT_GROUP)]
        group: String,
    },
    /// Parse a string into fields
    Parse {
        template: String,
        input: String,
        #[arg(short, long, default_value = DEFAULT_GROUP)]
        group: String,
        /// Point at the first segment that fails to match
        #[arg(short, long)]
        debug: bool,
    },
    /// Show a template's placeholder pattern
    Pattern {
        template: String,
        #[arg(short, long, default_value = DEFAULT_GROUP)]
        group: String,
        /// Include each token's format spec
        #[arg(short, long)]
        specs: bool,
    },
    /// Search the filesystem with a path template
    Paths {
        template: String,
        /// Field values as KEY=VALUE
        fields: Vec<String>,
        /// Fields to match with a wildcard
        #[arg(short, long)]
        wildcard: Vec<String>,
        #[arg(short, long, default_value = PATH_GROUP)]
        group: String,
    },
    /// List tokens and templates
    List,
}

fn setup_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let resolver = match template_resolver::from_file(&cli.config) {
        Ok(resolver) => resolver,
        Err(e) => {
            eprintln!("Error loading definitions '{}': {}", cli.config.display(), e);
            process::exit(1);
        }
    };

    if let Err(message) = run(&resolver, cli.command) {
        eprintln!("Error: {}", message);
        process::exit(1);
    }
}

fn run(resolver: &Resolver, command: Command) -> Result<(), String> {
    match command {
        Command::Format {
            template,
            fields,
            group,
        } => {
            let template = resolver
                .template(&group, &template)
                .map_err(|e| e.to_string())?;
            let fields = parse_fields(resolver, &fields)?;
            let formatted = template.format(&fields).map_err(|e| e.to_string())?;
            println!("{}", formatted);
        }
        Command::Parse {
            template,
            input,
            group,
            debug,
        } => {
            let template = resolver
                .template(&group, &template)
                .map_err(|e| e.to_string())?;
            let fields = if debug {
                template
                    .parse_debug(&input)
                    .map_err(|e| e.report(&template, &input, "input"))?
            } else {
                template.parse(&input).map_err(|e| e.to_string())?
            };
            for (name, value) in &fields {
                println!("{}={}", name, value);
            }
        }
        Command::Pattern {
            template,
            group,
            specs,
        } => {
            let template = resolver
                .template(&group, &template)
                .map_err(|e| e.to_string())?;
            println!("{}", template.pattern(specs));
        }
        Command::Paths {
            template,
            fields,
            wildcard,
            group,
        } => {
            let template = resolver
                .template(&group, &template)
                .map_err(|e| e.to_string())?;
            let search = template
                .as_path()
                .ok_or_else(|| format!("'{}' is not a path template", template.name()))?;
            let fields = parse_fields(resolver, &fields)?;
            let wildcards: Vec<&str> = wildcard.iter().map(String::as_str).collect();
            let matches = search
                .paths(&fields, &wildcards)
                .map_err(|e| e.to_string())?;
            for (path, _) in matches {
                println!("{}", path.display());
            }
        }
        Command::List => {
            for token in resolver.tokens() {
                println!("token {} ({}): {}", token.name(), token.kind(), token.regex());
            }
            for group in resolver.groups() {
                for template in resolver.templates(group) {
                    println!("{}.{}", group, template);
                }
            }
        }
    }
    Ok(())
}

/// Parse `KEY=VALUE` arguments through the token each key names
fn parse_fields(resolver: &Resolver, args: &[String]) -> Result<Fields, String> {
    let mut fields = Fields::new();
    for arg in args {
        let (name, text) = arg
            .split_once('=')
            .ok_or_else(|| format!("Expected KEY=VALUE, got '{}'", arg))?;
        let token = resolver.token(name).map_err(|e| e.to_string())?;
        let value = token.parse(text).map_err(|e| e.to_string())?;
        fields.insert(name.to_string(), value);
    }
    Ok(fields)
}
