use clap::{Parser, Subcommand};
use env_logger::Env;
use pagewright::config::{self, SiteConfig};
use pagewright::output;
use pagewright::preview::{FileSurface, PreviewState, PreviewSynchronizer, Viewport};
use pagewright::render::{self, RenderError, RenderPlan};
use pagewright::shortcode::WidgetRegistry;
use pagewright::store::{JsonDirStore, PageStore};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pagewright")]
#[command(about = "Render editor-built pages from fragments, blocks, or whole documents")]
#[command(long_about = "\
Render editor-built pages from fragments, blocks, or whole documents

Pages live as JSON records in the site directory, one file per slug:

  site/
  ├── config.toml          # Site config (optional)
  ├── about.json           # Slug \"about\"
  └── blog/
      └── hello.json       # Slug \"blog/hello\"

A page's content is either a markup string or an array of blocks
({\"type\": \"heading\", \"content\": \"Hi\", \"settings\": {\"level\": \"h1\"}}).
Strings that start with <!DOCTYPE or <html are whole documents and render
in a sandboxed frame; everything else is placed in the page template with
[shortcode] widgets expanded.

Only published pages render. Set RUST_LOG=debug to see each decision.

Run 'pagewright gen-config' to generate a documented config.toml.")]
#[command(version)]
struct Cli {
    /// Site directory holding page records and config.toml
    #[arg(long, default_value = "site", global = true)]
    site: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the detected content format and effective template of a page
    Classify { slug: String },
    /// Render one page to <output>/<slug>.html
    Render { slug: String },
    /// Render every page in the site directory
    Build,
    /// Write the editor preview of a page to <output>/preview.html
    Preview {
        slug: String,
        /// Simulated device: desktop, tablet or mobile
        #[arg(long, default_value = "desktop")]
        viewport: Viewport,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match cli.command {
        Command::Classify { slug } => {
            let store = JsonDirStore::new(&cli.site);
            let page = store
                .get_page(&slug)
                .ok_or_else(|| format!("no page {slug:?} in {}", cli.site.display()))?;
            output::print_classify(&page);
        }
        Command::Render { slug } => {
            let site_config = config::load_config(&cli.site)?;
            let store = JsonDirStore::new(&cli.site);
            let registry = WidgetRegistry::standard();
            let result = render::render_slug(&store, &slug, &registry, &site_config);
            write_page(&cli.output, &slug, &result, &site_config)?;
            output::print_render(&slug, &result);
        }
        Command::Build => {
            let site_config = config::load_config(&cli.site)?;
            let store = JsonDirStore::new(&cli.site);
            let registry = WidgetRegistry::standard();

            println!("==> Building {} → {}", cli.site.display(), cli.output.display());
            let mut results = Vec::new();
            for slug in store.list_slugs() {
                let result = render::render_slug(&store, &slug, &registry, &site_config);
                // Unpublished pages are left out of the site entirely
                if result.is_ok() {
                    write_page(&cli.output, &slug, &result, &site_config)?;
                }
                results.push((slug, result));
            }
            output::print_build_output(&results);
        }
        Command::Preview { slug, viewport } => {
            let site_config = config::load_config(&cli.site)?;
            let store = JsonDirStore::new(&cli.site);
            let page = store
                .get_page(&slug)
                .ok_or_else(|| format!("no page {slug:?} in {}", cli.site.display()))?;

            let path = cli.output.join("preview.html");
            let surface = FileSurface::new(&path, &site_config);
            let mut sync = PreviewSynchronizer::new(surface, site_config.clone());
            let state = PreviewState {
                content: page.content,
                title: page.title,
                template: page.template,
                viewport,
            };
            let frame = sync.on_change(state)?;
            sync.close();
            output::print_preview(&frame, &path);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Write a rendered page, or the not-available page, under `output_dir`.
fn write_page(
    output_dir: &Path,
    slug: &str,
    result: &Result<RenderPlan, RenderError>,
    site_config: &SiteConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let path = render::output_path(output_dir, slug)?;
    let html = match result {
        Ok(plan) => plan.to_document(site_config),
        Err(_) => render::not_available_document(site_config),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, html.into_string())?;
    log::debug!("wrote {}", path.display());
    Ok(())
}
