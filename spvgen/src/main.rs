use clap::{Parser, Subcommand};
use log::info;
use spvgen_core::options::{StageIoOrder, TargetEnv};
use spvgen_core::{CompiledShader, CompilerError, Context};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

mod manifest;
mod type_parser;


use manifest::{Manifest, ManifestError};

/// Times the execution of a closure and prints the elapsed time if verbose.
fn time<T, F: FnOnce() -> T>(name: &str, verbose: bool, f: F) -> T {
    let start = Instant::now();
    let result = f();
    if verbose {
        let elapsed = start.elapsed().as_millis();
        eprintln!("{}: {}ms", name, elapsed);
    }
    result
}

#[derive(Parser)]
#[command(name = "spvgen")]
#[command(about = "Emit SPIR-V for one HLSL-style shader entry point", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a shader manifest to a SPIR-V binary
    Compile {
        /// Input manifest (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (defaults to input name with .spv extension)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write the stage variable and resource binding report as JSON
        #[arg(long, value_name = "FILE")]
        reflect: Option<PathBuf>,

        #[command(flatten)]
        overrides: OptionOverrides,

        /// Print verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Map all declarations and report diagnostics without writing output
    Check {
        /// Input manifest (JSON)
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[command(flatten)]
        overrides: OptionOverrides,

        /// Print verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

/// Command-line settings that take precedence over the manifest's options.
#[derive(clap::Args, Debug, Default)]
struct OptionOverrides {
    /// Target environment: vulkan1.0, vulkan1.1 or vulkan1.2
    #[arg(long, value_parser = parse_target_env)]
    target_env: Option<TargetEnv>,

    /// Order of automatically assigned locations: decl or alpha
    #[arg(long)]
    stage_io_order: Option<StageIoOrder>,

    /// Descriptor set for declarations that name none
    #[arg(long, value_name = "SET")]
    auto_binding_space: Option<u32>,
}

fn parse_target_env(s: &str) -> Result<TargetEnv, String> {
    match s {
        "vulkan1.0" => Ok(TargetEnv::Vulkan1_0),
        "vulkan1.1" => Ok(TargetEnv::Vulkan1_1),
        "vulkan1.2" => Ok(TargetEnv::Vulkan1_2),
        other => Err(format!("unknown target environment '{}'", other)),
    }
}

#[derive(Debug, Error)]
enum DriverError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Manifest parse error: {0}")]
    ManifestSyntax(#[from] serde_json::Error),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Compilation error: {0}")]
    CompilationError(#[from] CompilerError),
}

fn main() -> Result<(), DriverError> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Compile {
            input,
            output,
            reflect,
            overrides,
            verbose,
        } => {
            compile_file(input, output, reflect, &overrides, verbose)?;
        }
        Commands::Check {
            input,
            overrides,
            verbose,
        } => {
            check_file(input, &overrides, verbose)?;
        }
    }

    Ok(())
}

/// Load a manifest and run the backend over it.
fn compile_manifest(
    input: &Path,
    overrides: &OptionOverrides,
    verbose: bool,
) -> Result<CompiledShader, DriverError> {
    let text = fs::read_to_string(input)?;
    let manifest = time("parse_manifest", verbose, || Manifest::from_json(&text))?;

    let mut ctx = Context::new();
    let mut program = time("resolve_types", verbose, || manifest.into_program(&mut ctx))?;
    if let Some(target_env) = overrides.target_env {
        program.options.target_env = target_env;
    }
    if let Some(order) = overrides.stage_io_order {
        program.options.stage_io_order = order;
    }
    if let Some(space) = overrides.auto_binding_space {
        program.options.auto_binding_space = Some(space);
    }

    let compiled = time("compile", verbose, || spvgen_core::compile(&mut ctx, &program));
    if let Err(CompilerError::Diagnostics(diagnostics)) = &compiled {
        for diagnostic in diagnostics {
            eprintln!("error: {}", diagnostic);
        }
    }
    Ok(compiled?)
}

fn compile_file(
    input: PathBuf,
    output: Option<PathBuf>,
    reflect: Option<PathBuf>,
    overrides: &OptionOverrides,
    verbose: bool,
) -> Result<(), DriverError> {
    if verbose {
        info!("Compiling {}...", input.display());
    }

    let compiled = compile_manifest(&input, overrides, verbose)?;

    // Determine output path
    let output_path = output.unwrap_or_else(|| {
        let mut path = input.clone();
        path.set_extension("spv");
        path
    });

    // Write SPIR-V binary
    let mut file = fs::File::create(&output_path)?;
    for word in &compiled.words {
        file.write_all(&word.to_le_bytes())?;
    }

    if let Some(ref reflect_path) = reflect {
        fs::write(reflect_path, compiled.interface.to_json()?)?;
        if verbose {
            info!("Wrote interface report to {}", reflect_path.display());
        }
    }

    if verbose {
        info!("Successfully compiled to {}", output_path.display());
        info!("Generated {} words of SPIR-V", compiled.words.len());
    }

    Ok(())
}

fn check_file(input: PathBuf, overrides: &OptionOverrides, verbose: bool) -> Result<(), DriverError> {
    if verbose {
        info!("Checking {}...", input.display());
    }

    let compiled = compile_manifest(&input, overrides, verbose)?;

    if verbose {
        let interface = &compiled.interface;
        info!(
            "{} is valid: {} input(s), {} output(s), {} resource(s)",
            input.display(),
            interface.inputs.len(),
            interface.outputs.len(),
            interface.resources.len()
        );
    }

    Ok(())
}
