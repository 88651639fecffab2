//! Partsguard administration CLI
//!
//! Generates and checks catalog codes offline, and inspects or initialises a
//! catalog database.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use partsguard::store::schema;
use partsguard::{
    connect_with, CategoryTreeNode, ChecksumCodec, DatabaseConfig, HierarchyManager,
    IdentityConfig, MayPostgresExecutor, PartsguardConfig, PgCatalogStore,
};
use std::process;

#[derive(Parser)]
#[command(name = "partsguard-admin")]
#[command(about = "Administration tool for the Partsguard parts catalog")]
#[command(version = "0.1.0")]
struct Cli {
    /// Database connection URL
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog code generation and validation (no database needed)
    Code {
        #[command(subcommand)]
        command: CodeCommand,
    },

    /// Catalog schema management
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },

    /// Category hierarchy inspection
    Categories {
        #[command(subcommand)]
        command: CategoriesCommand,
    },
}

#[derive(Subcommand)]
enum CodeCommand {
    /// Generate a catalog code
    Generate {
        /// Category name; its first two letters become the prefix
        #[arg(long)]
        category: String,

        /// Sequence number (0-999999)
        #[arg(long)]
        sequence: u32,

        /// Four-digit year (default: configured or current year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Check a catalog code's shape and check digit
    Validate {
        code: String,
    },
}

#[derive(Subcommand)]
enum SchemaCommand {
    /// Create missing catalog tables
    Init {
        /// Print the DDL instead of running it
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum CategoriesCommand {
    /// Print the category tree
    Tree {
        /// Emit JSON instead of an indented listing
        #[arg(long)]
        json: bool,
    },

    /// Report categories the tree cannot reach
    Audit,
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = match PartsguardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::warn!("using default configuration: {}", e);
            PartsguardConfig::default()
        }
    };

    let outcome = run(&cli, &config);
    match &outcome {
        Ok(true) if !cli.quiet => println!("{}", "✅ Success".green()),
        Err(e) => eprintln!("{} {:#}", "❌ Error:".red(), e),
        _ => {}
    }
    process::exit(exit_code(&outcome));
}

/// 0 on success; 1 for a negative answer or an error.
fn exit_code(outcome: &Result<bool>) -> i32 {
    match outcome {
        Ok(true) => 0,
        Ok(false) | Err(_) => 1,
    }
}

/// Runs the selected command. `Ok(false)` is a clean negative answer (an invalid code).
fn run(cli: &Cli, config: &PartsguardConfig) -> Result<bool> {
    match &cli.command {
        Commands::Code { command } => match command {
            CodeCommand::Generate {
                category,
                sequence,
                year,
            } => handle_generate(config, category, *sequence, *year),
            CodeCommand::Validate { code } => Ok(handle_validate(code)),
        },
        Commands::Schema {
            command: SchemaCommand::Init { dry_run: true },
        } => {
            for sql in schema::schema_sql() {
                println!("{};\n", sql);
            }
            Ok(true)
        }
        Commands::Schema {
            command: SchemaCommand::Init { dry_run: false },
        } => {
            let executor = open(cli, config)?;
            schema::initialize_schema(&executor).context("schema initialisation failed")?;
            Ok(true)
        }
        Commands::Categories { command } => {
            let executor = open(cli, config)?;
            let store = PgCatalogStore::new(&executor);
            let hierarchy = HierarchyManager::new(&store);
            match command {
                CategoriesCommand::Tree { json } => handle_tree(&hierarchy, *json),
                CategoriesCommand::Audit => handle_audit(&hierarchy),
            }
        }
    }
}

fn open(cli: &Cli, config: &PartsguardConfig) -> Result<MayPostgresExecutor> {
    let database_url =
        resolve_database_url(cli.database_url.as_deref(), &config.database, |key: &str| {
            std::env::var(key).ok()
        });
    let database = DatabaseConfig {
        url: database_url,
        ..config.database.clone()
    };

    let client = connect_with(&database).context("error connecting to database")?;
    Ok(MayPostgresExecutor::new(client))
}

/// `--database-url`, then `PARTSGUARD_DATABASE_URL`, then `DATABASE_URL`, then the config file.
fn resolve_database_url(
    flag: Option<&str>,
    database: &DatabaseConfig,
    env: impl Fn(&str) -> Option<String>,
) -> String {
    flag.map(str::to_string)
        .or_else(|| env("PARTSGUARD_DATABASE_URL"))
        .or_else(|| env("DATABASE_URL"))
        .unwrap_or_else(|| database.url.clone())
}

/// An explicit `--year` wins over `[identity] fixed_year`.
fn codec_for(year: Option<i32>, identity: &IdentityConfig) -> ChecksumCodec {
    match year {
        Some(year) => ChecksumCodec::with_year(year),
        None => ChecksumCodec::from_config(identity),
    }
}

fn handle_generate(
    config: &PartsguardConfig,
    category: &str,
    sequence: u32,
    year: Option<i32>,
) -> Result<bool> {
    let code = codec_for(year, &config.identity).generate(category, sequence)?;
    println!("{}", code.as_str().bold());
    log::info!(
        "prefix {} sequence {:06} year {:02} check {}",
        code.prefix(),
        code.sequence(),
        code.year(),
        code.check_digit()
    );
    Ok(true)
}

fn handle_validate(code: &str) -> bool {
    if ChecksumCodec::validate(code) {
        println!("{} {} is a valid catalog code", "✓".green(), code);
        true
    } else {
        println!("{} {} is not a valid catalog code", "✗".red(), code);
        false
    }
}

fn handle_tree(hierarchy: &HierarchyManager<'_>, json: bool) -> Result<bool> {
    let forest = hierarchy.tree()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&forest)?);
        return Ok(true);
    }

    println!("\n🌳 Categories\n");
    if forest.is_empty() {
        println!("  (none)");
    }
    for root in &forest {
        print_node(root, 1);
    }
    let total: usize = forest.iter().map(CategoryTreeNode::size).sum();
    println!("\n📈 {} categories under {} roots", total, forest.len());
    Ok(true)
}

fn print_node(node: &CategoryTreeNode, depth: usize) {
    println!(
        "{}{} {}",
        "  ".repeat(depth),
        node.category.name,
        format!("#{}", node.category.id).dimmed()
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn handle_audit(hierarchy: &HierarchyManager<'_>) -> Result<bool> {
    let report = hierarchy.audit()?;

    println!("\n🔍 Category audit\n");
    println!("  categories: {}", report.total);
    println!("  roots:      {}", report.roots.len());
    if report.is_consistent() {
        println!("  {}", "every category is reachable from a root".green());
        return Ok(true);
    }
    if !report.orphans.is_empty() {
        println!(
            "  {} {:?}",
            "orphaned (missing parent):".yellow(),
            report.orphans
        );
    }
    if !report.cyclic.is_empty() {
        println!("  {} {:?}", "on or under a cycle:".red(), report.cyclic);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("partsguard-admin").chain(args.iter().copied()))
            .unwrap()
    }

    fn database() -> DatabaseConfig {
        DatabaseConfig {
            url: "postgres://parts@config/parts".to_string(),
            ..DatabaseConfig::default()
        }
    }

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn database_url_precedence() {
        let all = env(&[
            ("PARTSGUARD_DATABASE_URL", "postgres://parts@scoped/parts"),
            ("DATABASE_URL", "postgres://parts@generic/parts"),
        ]);
        assert_eq!(
            resolve_database_url(Some("postgres://parts@flag/parts"), &database(), &all),
            "postgres://parts@flag/parts"
        );
        assert_eq!(
            resolve_database_url(None, &database(), &all),
            "postgres://parts@scoped/parts"
        );

        let generic = env(&[("DATABASE_URL", "postgres://parts@generic/parts")]);
        assert_eq!(
            resolve_database_url(None, &database(), generic),
            "postgres://parts@generic/parts"
        );
        assert_eq!(
            resolve_database_url(None, &database(), env(&[])),
            "postgres://parts@config/parts"
        );
    }

    #[test]
    fn year_flag_overrides_configured_year() {
        let identity = IdentityConfig {
            fixed_year: Some(2031),
        };
        assert_eq!(codec_for(Some(2024), &identity).year(), 2024);
        assert_eq!(codec_for(None, &identity).year(), 2031);

        let code = codec_for(Some(2024), &identity)
            .generate("Brakes", 42)
            .unwrap();
        assert_eq!(code.as_str(), "BR000042248");
    }

    #[test]
    fn generate_parses_its_flags() {
        let parsed = cli(&[
            "code",
            "generate",
            "--category",
            "Brakes",
            "--sequence",
            "42",
            "--year",
            "2024",
        ]);
        assert!(matches!(
            parsed.command,
            Commands::Code {
                command: CodeCommand::Generate { sequence: 42, year: Some(2024), .. }
            }
        ));
        let config = PartsguardConfig::default();
        assert_eq!(exit_code(&run(&parsed, &config)), 0);
    }

    #[test]
    fn invalid_code_exits_with_status_one() {
        let config = PartsguardConfig::default();
        let invalid = cli(&["code", "validate", "BR000042247"]);
        assert_eq!(exit_code(&run(&invalid, &config)), 1);

        let valid = cli(&["code", "validate", "BR000042248"]);
        assert_eq!(exit_code(&run(&valid, &config)), 0);
    }

    #[test]
    fn generation_errors_exit_with_status_one() {
        let config = PartsguardConfig::default();
        let parsed = cli(&["code", "generate", "--category", "B", "--sequence", "1"]);
        assert_eq!(exit_code(&run(&parsed, &config)), 1);
    }

    #[test]
    fn dry_run_needs_no_database() {
        let config = PartsguardConfig::default();
        let parsed = cli(&["--database-url", "mysql://nowhere", "schema", "init", "--dry-run"]);
        assert_eq!(exit_code(&run(&parsed, &config)), 0);
    }
}
