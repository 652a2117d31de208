use clap::{Parser, Subcommand};
use postpress::pipeline::Site;
use postpress::{codec, config, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "postpress")]
#[command(about = "Build HTML pages from content modules")]
#[command(long_about = "\
Build HTML pages from content modules

Every file under a content directory is a module exporting one post.
Posts with content are rendered through a template into index.html.

Project structure:

  my-site/
  ├── config.toml                      # Optional, overrides stock defaults
  ├── src/                             # content_root
  │   ├── components/                  # Templates
  │   │   └── post-template.html       # Default template ({{ key }} fields)
  │   └── pages/                       # content_dirs
  │       ├── about.md                 # +++ TOML front matter +++, markdown body
  │       ├── feed.json                # Top-level object is the post
  │       ├── authors.toml             # No content = data only, no page
  │       └── blog/first/index.md
  └── dist/                            # Output
      └── pages/
          ├── about/index.html
          └── blog/first/index.html

Template selection (the `template` field):
  absent or \"\"     default_template
  \"name.html\"      components/name.html
  null or false    no template, content written as-is

Run 'postpress gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Project root (holds config.toml and the content root)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Output directory, overriding `output_dir` from config.toml
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load every content module and write all pages
    Build,
    /// Load content modules without writing anything
    Check {
        /// Print the loaded posts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build => {
            let site = open_site(&cli.root, cli.output.as_deref())?;
            println!("==> Loading {}", site.root().display());
            let posts = site.load()?;
            output::print_load_output(&posts);

            println!("==> Writing → {}", site.output_dir().display());
            let pages = site.write(&posts)?;
            output::print_write_output(&pages, posts.len());

            println!("==> Build complete: {}", site.output_dir().display());
        }
        Command::Check { json } => {
            let site = open_site(&cli.root, cli.output.as_deref())?;
            let posts = site.load()?;
            if json {
                println!("{}", codec::encode_pretty(&posts)?);
            } else {
                println!("==> Checking {}", site.root().display());
                output::print_load_output(&posts);
                println!("==> Content is valid");
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn open_site(root: &Path, output: Option<&Path>) -> Result<Site, config::ConfigError> {
    let site_config = config::load_config(root)?;
    init_thread_pool(&site_config.processing);
    let site = Site::new(root, site_config);
    Ok(match output {
        Some(dir) => site.with_output_dir(dir),
        None => site,
    })
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
