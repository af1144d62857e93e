use clap::{Parser, Subcommand};
use pwa_manifest::config::{self, Configuration, Meta};
use pwa_manifest::events::Subscription;
use pwa_manifest::imaging::RustBackend;
use pwa_manifest::pipeline::Generator;
use pwa_manifest::{output, resolve};
use serde_json::Map;
use std::path::PathBuf;

/// Inputs shared by every command that resolves options.
#[derive(clap::Args, Clone)]
struct ResolveArgs {
    /// Options file: .json, .toml, or a package.json with a "pwaManifest" key
    #[arg(long, short)]
    options: PathBuf,

    /// package.json whose name and description fill in missing options
    #[arg(long)]
    fallback: Option<PathBuf>,

    /// Public URL prefix the generated files are served under
    #[arg(long, default_value = "/")]
    base_url: String,

    /// Directory the base icon path is resolved against
    #[arg(long, default_value = ".")]
    resolve_dir: PathBuf,

    /// Environment whose override object applies (matched case-insensitively)
    #[arg(long, env = "BUILD_ENV")]
    env: Option<String>,
}

impl ResolveArgs {
    fn resolve(&self) -> Result<Configuration, config::ConfigError> {
        let raw = config::load_options(&self.options)?;
        let fallback = match &self.fallback {
            Some(path) => config::package_fallback(path)?,
            None => Map::new(),
        };
        let meta = Meta {
            base_url: self.base_url.clone(),
            resolve_dir: self.resolve_dir.clone(),
            environment: self.env.clone(),
        };
        resolve::resolve(&raw, &meta, &fallback)
    }
}

#[derive(Parser)]
#[command(name = "pwa-manifest")]
#[command(about = "Generate PWA icons, a web app manifest, and browser config from one icon")]
#[command(long_about = "\
Generate PWA icons, a web app manifest, and browser config from one icon

From a single square source image this produces:

  icon-<S>x<S>.<fmt>      manifest icons, one per size and format
  favicon-32x32.png       favicons (icons.genFavicons = true)
  apple-touch-icon.png    180x180, padded and flattened onto a background
  mstile-*.png            Microsoft tiles, referenced from browserconfig.xml
  manifest.webmanifest    the web app manifest
  browserconfig.xml       legacy Microsoft tile configuration
  pwa-head.html           <link>/<meta> tags to paste into the page head

Generated file names carry a short hash for cache busting (hashMethod).

Run 'pwa-manifest gen-config' to generate a documented options file.")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate every asset into the output directory
    Generate {
        #[command(flatten)]
        args: ResolveArgs,

        /// Output directory
        #[arg(long, default_value = "dist")]
        out: PathBuf,
    },
    /// Validate the options without generating anything
    Check(ResolveArgs),
    /// Print a stock options file with all keys documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    pwa_manifest::init_tracing(cli.verbose);

    match cli.command {
        Command::Generate { args, out } => {
            let config = args.resolve()?;
            let mut generator = Generator::new(config);
            generator.on(Subscription::All, |_, payload| {
                if let Some(line) = output::format_event(payload) {
                    println!("{line}");
                }
            });
            let generation = generator.generate(&RustBackend::new())?;
            generation.write_to(&out)?;
            output::print_generation_summary(&generation, &out);
        }
        Command::Check(args) => {
            let config = args.resolve()?;
            output::print_check_output(&config);
            println!("==> Options are valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_options_toml());
        }
    }

    Ok(())
}
