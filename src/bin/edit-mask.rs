use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use auto_edit_mask::{MaskEngine, MaskOptions, ProcessResult, DEFAULT_MAX_WORKING_DIM};

#[derive(Parser)]
#[command(
    name = "edit-mask",
    about = "Generate an inpainting mask and guide image from an original/proposed image pair",
    version,
    after_help = "Simple usage: edit-mask <original> <proposed>\n\n\
                  Writes {name}_mask.png (feathered mask) and {name}_guide.png (composited\n\
                  guide) next to the original, or into --output-dir."
)]
struct Cli {
    /// Original (unedited) image
    original: PathBuf,

    /// Proposed image containing the edit
    proposed: PathBuf,

    /// Output directory (default: next to the original)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Long-edge cap for the working resolution
    #[arg(long, default_value_t = DEFAULT_MAX_WORKING_DIM)]
    max_dim: u32,

    /// Resize a differently sized proposed image to the original's size
    #[arg(long)]
    fill_proposed: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,

    #[cfg(feature = "remote")]
    #[command(flatten)]
    remote: remote::RemoteArgs,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if cli.max_dim == 0 {
        eprintln!("Error: --max-dim must be positive");
        process::exit(1);
    }

    for path in [&cli.original, &cli.proposed] {
        if !path.exists() {
            eprintln!("Error: Input path does not exist: {}", path.display());
            process::exit(1);
        }
    }

    let engine = MaskEngine::new(MaskOptions {
        max_working_dim: cli.max_dim,
        fill_proposed: cli.fill_proposed,
        ..MaskOptions::default()
    });

    let result = engine.process_files(&cli.original, &cli.proposed, cli.output_dir.as_deref());
    print_result(&result, &cli);

    if !result.success {
        process::exit(1);
    }

    #[cfg(feature = "remote")]
    if let Err(e) = remote::run(&cli, &result) {
        eprintln!("[FAIL] edit: {e}");
        process::exit(1);
    }
}

fn print_result(result: &ProcessResult, cli: &Cli) {
    if cli.quiet && result.success {
        return;
    }

    let filename = display_name(&result.path);

    if !result.success {
        eprintln!("[FAIL] {filename}: {}", result.message);
    } else if result.empty {
        eprintln!("[EMPTY] {filename}: {}", result.message);
    } else {
        eprintln!("[OK] {filename}");
    }

    if cli.verbose {
        if let Some(stats) = &result.stats {
            eprintln!(
                "  -> working {}x{}, threshold {:.3}, changed {} px, cleaned {} px, region {} px",
                stats.working.0,
                stats.working.1,
                stats.threshold,
                stats.changed_pixels,
                stats.cleaned_pixels,
                stats.region_area
            );
        }
        if result.success && !result.message.is_empty() {
            eprintln!("  -> {}", result.message);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    )
}

#[cfg(feature = "remote")]
mod remote {
    use std::time::Duration;

    use auto_edit_mask::{
        default_output_paths, EditInvoker, EditOutcome, EditParams, EditRequest, HttpEditInvoker,
        ProcessResult, Result,
    };

    use super::Cli;

    #[derive(clap::Args)]
    pub struct RemoteArgs {
        /// Inpainting endpoint to send the mask and guide to
        #[arg(long)]
        pub invoke: Option<String>,

        /// Bearer token for the inpainting endpoint
        #[arg(long, requires = "invoke")]
        pub token: Option<String>,

        /// Edit instruction for the inpainting model
        #[arg(long, default_value = "")]
        pub instruction: String,

        /// Inference steps (10-50)
        #[arg(long, default_value_t = auto_edit_mask::invoker::DEFAULT_STEPS)]
        pub steps: u32,

        /// Sampling seed
        #[arg(long)]
        pub seed: Option<u64>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 120)]
        pub timeout: u64,
    }

    pub fn run(cli: &Cli, result: &ProcessResult) -> Result<()> {
        let Some(endpoint) = &cli.remote.invoke else {
            return Ok(());
        };
        if result.empty {
            if !cli.quiet {
                eprintln!("[SKIP] edit: mask is empty, guide equals the original");
            }
            return Ok(());
        }

        let mut params = EditParams::new(cli.remote.instruction.clone()).with_steps(cli.remote.steps)?;
        if let Some(seed) = cli.remote.seed {
            params = params.with_seed(seed);
        }

        let (mask_path, guide_path) =
            default_output_paths(&result.path, cli.output_dir.as_deref());
        let request = EditRequest {
            guide_image: std::fs::read(&guide_path)?,
            soft_mask: std::fs::read(&mask_path)?,
            params,
        };

        let mut invoker =
            HttpEditInvoker::new(endpoint.clone(), Duration::from_secs(cli.remote.timeout))?;
        if let Some(token) = &cli.remote.token {
            invoker = invoker.with_token(token.clone());
        }

        match invoker.invoke(&request)? {
            EditOutcome::Url(url) => println!("{url}"),
            EditOutcome::Bytes(bytes) => {
                let stem = result.path.file_stem().unwrap_or_default().to_string_lossy();
                let out = mask_path.with_file_name(format!("{stem}_edited.png"));
                std::fs::write(&out, bytes)?;
                println!("{}", out.display());
            }
        }
        Ok(())
    }
}
