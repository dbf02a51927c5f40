//! `rstemplate` command line.
//!
//! Instantiates a template module into the current module, e.g.
//! `rstemplate templates::set 'IntSet(i32)'` writes `rstemplate_IntSet.rs`.

use std::env;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing::{info, Level};

use rstemplate::errors::{self, InstantiateError};
use rstemplate::loader::{self, ModulePath, ModuleRef};
use rstemplate::request::{parse_template_and_args, InstantiationRequest};
use rstemplate::{template, Diagnostics};

#[derive(Parser)]
#[command(name = "rstemplate")]
#[command(version = rstemplate::VERSION)]
#[command(about = "Instantiate a generic Rust template module", long_about = None)]
struct Cli {
    /// Template module: a module path (`templates::set`) or a file path
    #[arg(value_name = "MODULE")]
    module: String,

    /// Instance name and type arguments, e.g. `IntSet(i32)`
    #[arg(value_name = "INSTANTIATION")]
    instantiation: String,

    /// Log intermediate state
    #[arg(short, long)]
    verbose: bool,

    /// Module the generated code belongs to [default: module of the working directory]
    #[arg(short = 'm', long = "module", value_name = "PATH")]
    module_path: Option<String>,

    /// Where to write the generated file
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Directory to resolve MODULE from [default: working directory]
    #[arg(short = 'C', long = "dir", value_name = "DIR")]
    search_dir: Option<PathBuf>,
}

fn build_request(cli: &Cli) -> Result<InstantiationRequest, InstantiateError> {
    let cwd = env::current_dir().map_err(|error| InstantiateError::Read {
        path: PathBuf::from("."),
        error,
    })?;
    let search_dir = cli.search_dir.clone().unwrap_or_else(|| cwd.clone());

    let source_module = ModuleRef::parse(&cli.module)?;
    let (name, args) = parse_template_and_args(&cli.instantiation)?;
    let target_module = match &cli.module_path {
        Some(path) => ModulePath::parse(path)?,
        None => loader::module_path_of_dir(&cwd)?,
    };

    InstantiationRequest::new(source_module, name, args, target_module, search_dir)
}

fn run(cli: &Cli) -> Result<(), InstantiateError> {
    let diag = Diagnostics::new(cli.verbose);
    let request = build_request(cli)?;

    info!(
        "substituting {} with {} into module {}",
        request.source_module,
        request.describe(),
        request.target_module
    );

    let instance = template::instantiate(&request, &diag)?;
    let path = instance.write_to(&cli.out_dir)?;
    info!("Written '{}'", path.display());
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    if let Err(e) = run(&cli) {
        errors::report(&e);
        process::exit(1);
    }
}
