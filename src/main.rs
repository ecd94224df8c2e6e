use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use ucn::index::cache;
use ucn::index::{BuildOptions, Filters, ProjectIndex};
use ucn::parser::facts::SymbolKind;
use ucn::query;
use ucn::query::FileQuery;
use ucn::query::graph::GraphDirection;
use ucn::query::trace::TraceDirection;

#[derive(Parser)]
#[command(
    name = "ucn",
    about = "Code intelligence for multi-language repos — symbols, callers, impact and dead code",
    version
)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, default_value = ".", global = true)]
    path: PathBuf,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Restrict to paths containing this prefix/substring
    #[arg(long = "in")]
    in_path: Option<String>,

    /// Exclude boundary-matched path patterns (repeatable)
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Include test files
    #[arg(long)]
    include_tests: bool,
}

impl FilterArgs {
    fn to_filters(&self) -> Filters {
        Filters {
            in_path: self.in_path.clone(),
            exclude: self.exclude.clone(),
            include_tests: self.include_tests,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum GraphDirectionArg {
    Imports,
    Importers,
    Both,
}

#[derive(Clone, Copy, ValueEnum)]
enum TraceDirectionArg {
    Callees,
    Callers,
}

#[derive(Subcommand)]
enum Commands {
    /// Build (or refresh) the on-disk index cache
    Build {
        /// Discard all tables and rebuild from scratch
        #[arg(long)]
        force: bool,
    },
    /// Remove the on-disk index cache
    Clean,
    /// Find symbol definitions by name
    Find {
        name: String,
        /// Exact name match (default is substring, case-insensitive)
        #[arg(long)]
        exact: bool,
        /// Restrict to files whose path contains this
        #[arg(long)]
        file: Option<String>,
        /// Restrict by symbol type (function, class, struct, …)
        #[arg(long = "type")]
        kind: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Every usage of a name, classified
    Usages {
        name: String,
        /// Drop string/comment hits
        #[arg(long)]
        code_only: bool,
        /// Attach N context lines
        #[arg(long, default_value_t = 0)]
        context: usize,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// A symbol's definition with callers and callees
    Context {
        name: String,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        include_methods: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// A symbol's source plus the source of everything it calls
    Smart { name: String },
    /// Depth-bounded call tree
    Trace {
        name: String,
        #[arg(long, default_value_t = 3)]
        depth: i64,
        #[arg(long, value_enum, default_value = "callees")]
        direction: TraceDirectionArg,
        #[arg(long)]
        include_methods: bool,
        #[arg(long)]
        include_uncertain: bool,
        #[arg(long)]
        file: Option<String>,
    },
    /// Import graph around a file
    Graph {
        file: String,
        #[arg(long, value_enum, default_value = "imports")]
        direction: GraphDirectionArg,
        #[arg(long, default_value_t = 3)]
        depth: i64,
    },
    /// Call sites grouped by file
    Impact {
        name: String,
        #[arg(long)]
        file: Option<String>,
    },
    /// Check call-site argument counts against the definition
    Verify {
        name: String,
        #[arg(long)]
        file: Option<String>,
    },
    /// Refactor plan: definition plus annotated call sites
    Plan {
        name: String,
        #[arg(long)]
        rename_to: Option<String>,
        #[arg(long)]
        add_param: Option<String>,
        #[arg(long)]
        file: Option<String>,
    },
    /// Symbols with zero callers
    Deadcode {
        #[arg(long)]
        include_exported: bool,
        #[arg(long)]
        include_decorated: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Class-like definitions of a name, source attached
    Typedef { name: String },
    /// References to a name inside test files
    Tests {
        name: String,
        #[arg(long)]
        calls_only: bool,
    },
    /// Exported symbols
    Api {
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Consolidated report: definition, usages, callers, callees, tests
    About {
        name: String,
        #[arg(long)]
        include_methods: bool,
        #[arg(long)]
        file: Option<String>,
    },
    /// Best real-world call site of a name
    Example { name: String },
    /// What a file imports
    Imports { file: String },
    /// Who imports a file
    Exporters { file: String },
    /// What a file exports
    FileExports { file: String },
    /// Literal text search with context
    Search {
        pattern: String,
        #[arg(long)]
        case_sensitive: bool,
        #[arg(long, default_value_t = 0)]
        context: usize,
        #[arg(long)]
        code_only: bool,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Parse a stack trace and pin frames onto indexed files
    Stacktrace {
        /// Trace text; reads stdin when omitted
        text: Option<String>,
    },
    /// Map a git diff onto functions and their callers
    DiffImpact {
        #[arg(long)]
        base: Option<String>,
        #[arg(long)]
        staged: bool,
    },
    /// Per-file summary of the index
    Toc {
        #[arg(long)]
        detailed: bool,
        #[arg(long)]
        all: bool,
        #[arg(long, default_value_t = 50)]
        top: usize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

/// Load the index: restore from cache when fresh, otherwise (re)build and
/// persist.
fn load_index(path: &PathBuf) -> Result<ProjectIndex> {
    let mut index = ProjectIndex::new(path.clone())?;
    let loaded = cache::load(&mut index);
    if !loaded {
        index.build(BuildOptions::default())?;
        cache::save(&index)?;
    } else if cache::is_stale(&index) {
        index.build(BuildOptions::default())?;
        cache::save(&index)?;
    }
    Ok(index)
}

fn emit<T: Serialize>(value: &T, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(value)?);
    }
    Ok(())
}

/// A `None`/empty result is a query error: message on stderr, exit 1.
fn not_found(what: &str, json: bool) -> Result<ExitCode> {
    if json {
        println!("null");
    }
    eprintln!("not found: {what}");
    Ok(ExitCode::from(1))
}

fn emit_file_query<T: Serialize>(result: FileQuery<T>, json: bool) -> Result<ExitCode> {
    let found = result.is_found();
    emit(&result, json)?;
    Ok(if found {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn parse_depth(depth: i64) -> u32 {
    // Negative depths clamp to zero rather than erroring.
    depth.max(0) as u32
}

fn run(cli: Cli) -> Result<ExitCode> {
    let json = cli.json;

    match cli.command {
        Commands::Build { force } => {
            let mut index = ProjectIndex::new(cli.path.clone())?;
            if !force {
                cache::load(&mut index);
            }
            let stats = index.build(BuildOptions {
                force_rebuild: force,
            })?;
            cache::save(&index)?;
            emit(&stats, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clean => {
            let root = cli.path.canonicalize()?;
            cache::clean(&root)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Find {
            name,
            exact,
            file,
            kind,
            filters,
        } => {
            let index = load_index(&cli.path)?;
            let kind = match kind.as_deref() {
                Some(k) => match SymbolKind::parse(k) {
                    Some(k) => Some(k),
                    None => {
                        eprintln!("invalid --type: {k}");
                        return Ok(ExitCode::from(2));
                    }
                },
                None => None,
            };
            let results = query::find::find(
                &index,
                &name,
                &query::find::FindOptions {
                    exact,
                    file,
                    kind,
                    filters: filters.to_filters(),
                },
            );
            emit(&results, json)?;
            Ok(if results.is_empty() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Usages {
            name,
            code_only,
            context,
            filters,
        } => {
            let index = load_index(&cli.path)?;
            let results = query::usages::usages(
                &index,
                &name,
                &query::usages::UsagesOptions {
                    code_only,
                    context,
                    filters: filters.to_filters(),
                },
            );
            emit(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Context {
            name,
            file,
            include_methods,
            filters,
        } => {
            let index = load_index(&cli.path)?;
            match query::context::context(
                &index,
                &name,
                &query::context::ContextOptions {
                    file,
                    include_methods: include_methods.then_some(true),
                    filters: filters.to_filters(),
                },
            ) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Smart { name } => {
            let index = load_index(&cli.path)?;
            match query::smart::smart(&index, &name) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Trace {
            name,
            depth,
            direction,
            include_methods,
            include_uncertain,
            file,
        } => {
            let index = load_index(&cli.path)?;
            let options = query::trace::TraceOptions {
                depth: parse_depth(depth),
                direction: match direction {
                    TraceDirectionArg::Callees => TraceDirection::Callees,
                    TraceDirectionArg::Callers => TraceDirection::Callers,
                },
                include_methods: include_methods.then_some(true),
                include_uncertain,
                file,
            };
            match query::trace::trace(&index, &name, &options) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Graph {
            file,
            direction,
            depth,
        } => {
            let index = load_index(&cli.path)?;
            let result = query::graph::graph(
                &index,
                &file,
                &query::graph::GraphOptions {
                    direction: match direction {
                        GraphDirectionArg::Imports => GraphDirection::Imports,
                        GraphDirectionArg::Importers => GraphDirection::Importers,
                        GraphDirectionArg::Both => GraphDirection::Both,
                    },
                    max_depth: parse_depth(depth),
                },
            );
            emit_file_query(result, json)
        }
        Commands::Impact { name, file } => {
            let index = load_index(&cli.path)?;
            let options = query::impact::ImpactOptions {
                file,
                filters: Filters::default(),
            };
            match query::impact::impact(&index, &name, &options) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Verify { name, file } => {
            let index = load_index(&cli.path)?;
            let options = query::impact::ImpactOptions {
                file,
                filters: Filters::default(),
            };
            match query::impact::verify(&index, &name, &options) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Plan {
            name,
            rename_to,
            add_param,
            file,
        } => {
            let index = load_index(&cli.path)?;
            let options = query::impact::PlanOptions {
                rename_to,
                add_param,
                file,
                filters: Filters::default(),
            };
            match query::impact::plan(&index, &name, &options) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Deadcode {
            include_exported,
            include_decorated,
            filters,
        } => {
            let index = load_index(&cli.path)?;
            let result = query::deadcode::deadcode(
                &index,
                &query::deadcode::DeadcodeOptions {
                    include_exported,
                    include_decorated,
                    filters: filters.to_filters(),
                },
            );
            emit(&result, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Typedef { name } => {
            let index = load_index(&cli.path)?;
            let results = query::typedef::typedef(&index, &name);
            emit(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Tests { name, calls_only } => {
            let index = load_index(&cli.path)?;
            let results = query::typedef::tests(
                &index,
                &name,
                &query::typedef::TestsOptions { calls_only },
            );
            emit(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Api { filters } => {
            let index = load_index(&cli.path)?;
            let results = query::typedef::api(
                &index,
                &query::typedef::ApiOptions {
                    filters: filters.to_filters(),
                },
            );
            emit(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::About {
            name,
            include_methods,
            file,
        } => {
            let index = load_index(&cli.path)?;
            match query::about::about(
                &index,
                &name,
                &query::about::AboutOptions {
                    include_methods: include_methods.then_some(true),
                    file,
                },
            ) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Example { name } => {
            let index = load_index(&cli.path)?;
            match query::typedef::example(&index, &name) {
                Some(result) => {
                    emit(&result, json)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => not_found(&name, json),
            }
        }
        Commands::Imports { file } => {
            let index = load_index(&cli.path)?;
            emit_file_query(query::files::imports(&index, &file), json)
        }
        Commands::Exporters { file } => {
            let index = load_index(&cli.path)?;
            emit_file_query(query::files::exporters(&index, &file), json)
        }
        Commands::FileExports { file } => {
            let index = load_index(&cli.path)?;
            emit_file_query(query::files::file_exports(&index, &file), json)
        }
        Commands::Search {
            pattern,
            case_sensitive,
            context,
            code_only,
            filters,
        } => {
            let index = load_index(&cli.path)?;
            let results = query::search::search(
                &index,
                &pattern,
                &query::search::SearchOptions {
                    case_sensitive,
                    context,
                    code_only,
                    filters: filters.to_filters(),
                },
            );
            emit(&results, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Stacktrace { text } => {
            let index = load_index(&cli.path)?;
            let text = match text {
                Some(t) => t,
                None => {
                    let mut buffer = String::new();
                    std::io::stdin().read_to_string(&mut buffer)?;
                    buffer
                }
            };
            let result = query::stacktrace::parse_stack_trace(&index, &text);
            emit(&result, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::DiffImpact { base, staged } => {
            let index = load_index(&cli.path)?;
            let result = query::diff_impact::diff_impact(
                &index,
                &query::diff_impact::DiffImpactOptions { base, staged },
            )?;
            emit(&result, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Toc { detailed, all, top } => {
            let index = load_index(&cli.path)?;
            let result = query::files::toc(
                &index,
                &query::files::TocOptions { detailed, all, top },
            );
            emit(&result, json)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
