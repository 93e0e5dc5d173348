use clap::{Parser, Subcommand};
use simple_site::{config, output, site};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simple-site")]
#[command(about = "Static site generator for markdown documentation")]
#[command(long_about = "\
Static site generator for markdown documentation

Every content file becomes one clean URL. Markdown pages are wrapped by a
layout from the template directory; *.html.peb files are templates on their
own; plain *.html files are copied.

Content structure:

  content/
  ├── navigation.yml          # Root menu (optional)
  ├── index.md                # → output/index.html           /
  ├── about.md                # → output/about/index.html     /about
  ├── landing.html.peb        # → output/landing/index.html   /landing
  └── docs/                   # Section (listed in site.toml)
      ├── navigation.yml      # Section menu (optional)
      └── intro.md            # → output/docs/intro/index.html /docs/intro

  templates/
  └── default.html.peb        # Layout used when front matter names none

Markdown pages start with YAML front matter:

  ---
  title: About
  template: page
  ---

Run 'simple-site gen-config' to generate a documented site.toml.")]
#[command(version)]
struct Cli {
    /// Config file (optional; defaults apply when missing)
    #[arg(long, default_value = config::CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Content directory
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Output directory
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Layout template directory
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// Layout used when front matter names none
    #[arg(long, global = true)]
    default_template: Option<String>,

    /// Section directory to build after the root (repeatable; replaces site.toml's list)
    #[arg(long = "section", global = true)]
    sections: Vec<String>,

    /// Pass each page's last git commit date to templates as lastCommit
    #[arg(long, global = true)]
    git_timestamps: bool,

    /// Maximum number of parallel render workers
    #[arg(long, short = 'j', global = true)]
    jobs: Option<usize>,

    /// Log progress (same as RUST_LOG=info)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the whole site into the output directory
    Build,
    /// Validate config, menus and front matter without writing output
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

impl Cli {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            sources_path: self.source.clone(),
            output_path: self.output.clone(),
            template_path: self.templates.clone(),
            default_template: self.default_template.clone(),
            sections: self.sections.clone(),
            git_timestamps: self.git_timestamps,
            max_processes: self.jobs,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let site_config = config::load_config(&cli.config, &cli.overrides())?;
    site_config.validate()?;

    match cli.command {
        Command::Build => {
            init_thread_pool(&site_config.processing);
            println!("==> Building {}", site_config.sources_path.display());
            let report = site::build_all(&site_config)?;
            output::print_build_report(&report);
        }
        Command::Check => {
            println!("==> Checking {}", site_config.sources_path.display());
            let report = site::check(&site_config)?;
            output::print_check_report(&report);
        }
        Command::GenConfig => {}
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
