//! Molt CLI - rule-driven API migrations
//!
//! Upgrades Java, XML and properties sources between library versions.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use molt::catalogue::{Catalogue, MigrationPlan, Version};
use molt::config::{ColorMode, Config, OutputFormat};
use molt::output::{JsonFormatter, OutputFormatter, TextFormatter};
use molt::pipeline::Pipeline;
use molt::writer::{WriteMode, Writer};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "molt",
    version,
    about = "Rule-driven API migration engine",
    long_about = "Migrates Java, XML and properties sources between library versions using versioned recipes."
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Additional catalogue directory (repeatable)
    #[arg(long, global = true)]
    catalogue: Vec<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Migrate files from one version to another
    Run {
        /// Version the sources are written against
        #[arg(long)]
        from: Version,

        /// Version to migrate to
        #[arg(long)]
        to: Version,

        /// Files, directories or glob patterns (default: current directory)
        paths: Vec<PathBuf>,

        /// Write migrated files in place
        #[arg(long, conflicts_with = "diff")]
        write: bool,

        /// Print unified diffs instead of writing
        #[arg(long)]
        diff: bool,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<Format>,

        /// Exit with 1 when manual migration is needed
        #[arg(long)]
        strict: bool,

        /// Number of parallel jobs (0 = auto)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Also report applied rewrites and informational notices
        #[arg(short, long)]
        verbose: bool,

        /// Skip recipes (comma-separated ids)
        #[arg(long, value_delimiter = ',')]
        disable: Option<Vec<String>>,
    },

    /// List registered version steps
    Plans {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Show the recipes a migration would run
    Recipes {
        #[arg(long)]
        from: Version,

        #[arg(long)]
        to: Version,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: Format,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::load_default().context("Failed to load config")?,
    };

    match config.output.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
    if cli.no_color {
        colored::control::set_override(false);
    }

    config.recipes.catalogues.extend(cli.catalogue.iter().cloned());
    let catalogue = load_catalogue(&config)?;

    match cli.command {
        Commands::Run {
            from,
            to,
            paths,
            write,
            diff,
            format,
            strict,
            jobs,
            verbose,
            disable,
        } => {
            config.merge_cli(
                format.map(OutputFormat::from),
                verbose.then_some(true),
                jobs,
                strict.then_some(true),
                disable,
            );
            let mode = if write {
                WriteMode::Write
            } else if diff {
                WriteMode::Diff
            } else {
                WriteMode::Check
            };
            handle_run(&catalogue, config, from, to, paths, mode)
        }
        Commands::Plans { format } => {
            handle_plans(&catalogue, format);
            Ok(0)
        }
        Commands::Recipes { from, to, format } => {
            let plan = catalogue.resolve(from, to)?;
            handle_recipes(&plan, format);
            Ok(0)
        }
    }
}

fn load_catalogue(config: &Config) -> Result<Catalogue> {
    let mut catalogue = Catalogue::builtin().context("Built-in catalogue is invalid")?;
    for dir in &config.recipes.catalogues {
        let count = catalogue
            .extend_from_dir(dir)
            .with_context(|| format!("Failed to load catalogue from {}", dir.display()))?;
        log::info!("Loaded {} recipe(s) from {}", count, dir.display());
    }
    Ok(catalogue)
}

fn handle_run(
    catalogue: &Catalogue,
    config: Config,
    from: Version,
    to: Version,
    paths: Vec<PathBuf>,
    mode: WriteMode,
) -> Result<i32> {
    let plan = catalogue.resolve(from, to)?;
    for id in &config.recipes.disabled {
        if !plan.recipes.iter().any(|r| &r.id == id) {
            log::warn!("Disabled recipe {} is not part of the {} -> {} plan", id, from, to);
        }
    }
    let plan = plan.without(&config.recipes.disabled);

    let inputs = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let strict = config.engine.strict;
    let format = config.output.format;
    let verbose = config.output.verbose;
    let pipeline = Pipeline::new(config);
    let files = pipeline.discover(&inputs)?;
    if files.is_empty() {
        eprintln!("{}: No files found to migrate", "warning".yellow().bold());
        return Ok(0);
    }

    let result = pipeline.run_batch(&plan, &files);

    let writer = Writer::new(mode);
    let written = writer.write_all(&result.artifacts);
    if mode == WriteMode::Diff {
        print!("{}", written.format_diffs());
    }

    let formatter: Box<dyn OutputFormatter> = match format {
        OutputFormat::Json => Box::new(JsonFormatter::new().pretty()),
        OutputFormat::Text => {
            let text = TextFormatter::new();
            let text = if colored::control::SHOULD_COLORIZE.should_colorize() {
                text
            } else {
                text.without_color()
            };
            Box::new(if verbose { text.verbose() } else { text })
        }
    };
    print!("{}", formatter.format(&result));

    if format == OutputFormat::Text {
        match mode {
            WriteMode::Write => println!("{} file(s) written", written.files_written),
            WriteMode::Check if !written.files.is_empty() => println!(
                "{} file(s) would change; rerun with --write or --diff",
                written.files.len()
            ),
            _ => {}
        }
    }

    for error in &written.errors {
        eprintln!("{}: {}", "error".red().bold(), error);
    }
    if !written.errors.is_empty() {
        return Ok(2);
    }

    Ok(result.exit_code(strict))
}

fn handle_plans(catalogue: &Catalogue, format: Format) {
    let steps = catalogue.steps();
    match format {
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&steps).unwrap_or_default());
        }
        Format::Text => {
            println!("{}", "Registered steps:".bold());
            println!();
            for step in steps {
                let pair = format!("{:<14}", format!("{} -> {}", step.from, step.to));
                println!("  {} {}", pair.green(), step.recipes.join(", "));
            }
        }
    }
}

#[derive(Serialize)]
struct RecipeSummary<'a> {
    id: &'a str,
    display_name: &'a str,
    kind: String,
    from: String,
    to: String,
    rules: Vec<RuleSummary<'a>>,
}

#[derive(Serialize)]
struct RuleSummary<'a> {
    id: &'a str,
    summary: String,
}

fn handle_recipes(plan: &MigrationPlan, format: Format) {
    match format {
        Format::Json => {
            let recipes: Vec<RecipeSummary> = plan
                .recipes
                .iter()
                .map(|r| RecipeSummary {
                    id: &r.id,
                    display_name: &r.display_name,
                    kind: r.kind.to_string(),
                    from: r.from.to_string(),
                    to: r.to.to_string(),
                    rules: r
                        .rules
                        .iter()
                        .map(|rule| RuleSummary {
                            id: &rule.id,
                            summary: rule.summary(),
                        })
                        .collect(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&recipes).unwrap_or_default());
        }
        Format::Text => {
            println!(
                "{} {} -> {} ({} recipes, {} rules)",
                "Plan".bold(),
                plan.from,
                plan.to,
                plan.recipes.len(),
                plan.rule_count()
            );
            for recipe in &plan.recipes {
                println!();
                println!(
                    "  {} [{}] {}",
                    recipe.id.cyan(),
                    recipe.kind,
                    recipe.display_name.dimmed()
                );
                for rule in &recipe.rules {
                    println!("    {:<40} {}", rule.id, rule.summary());
                }
            }
        }
    }
}
