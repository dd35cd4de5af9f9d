use clap::{Parser, Subcommand};
use notegarden::{build, config, output, scan};
use std::path::PathBuf;

fn version_string() -> &'static str {
    let on_tag = env!("NOTEGARDEN_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("NOTEGARDEN_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // called once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "notegarden")]
#[command(about = "Static site generator for linked markdown notes and canvases")]
#[command(long_about = "\
Static site generator for linked markdown notes and canvases

Your notes folder is the data source. Folders become the navigation tree,
markdown files and .canvas boards become pages, everything else is an asset.

Content structure:

  notes/
  ├── config.toml                  # Site config (optional)
  ├── index.md                     # Page → index.html
  ├── Projects/
  │   ├── Alpha.md                 # Page → Projects/Alpha.html
  │   └── Roadmap.canvas           # Canvas board → Projects/Roadmap.html
  ├── attachments/
  │   └── diagram.png              # Asset → images/diagram.png
  └── .obsidian/                   # Hidden entries are skipped

Inside notes:
  [[Alpha]]  [[Alpha#Goals|the goals]]   Wiki links by title or file name
  ![[diagram.png|300]]                   Embedded image, optional width
  #project/alpha                         Tag, listed under tags/
  <!-- recent-pages -->                  Replaced by the newest pages

Run 'notegarden gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Notes directory
    #[arg(long, default_value = "notes", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "site", global = true)]
    output: PathBuf,

    /// Directory for intermediate files (scratch buffer)
    #[arg(long, default_value = ".notegarden-temp", global = true)]
    temp_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the site: discover → process → end pass
    Build,
    /// Validate the notes directory and config without building
    Check,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            println!("==> Building {} → {}", cli.source.display(), cli.output.display());
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_build_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let result = build::build(&cli.source, &cli.output, &cli.temp_dir, Some(tx));
            // the sender is dropped by now, so the printer drains and exits
            printer.join().ok();
            let summary = result?;
            output::print_build_summary(&summary, &cli.output);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let discovery = scan::scan(&cli.source, &[cli.output.clone(), cli.temp_dir.clone()])?;
            output::print_scan_output(&discovery);
            println!("==> Content is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
