//! mdtex - Markdown to LaTeX compiler

use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{LevelFilter, info};

use mdtex::assets::{AssetConfig, AssetPipeline, ImageCache, NoAssets, OfflineFetcher};
use mdtex::{Compiler, MarkdownParser, Node, RenderOptions, util};

#[derive(Parser)]
#[command(name = "mdtex")]
#[command(version, about = "Compile Markdown to LaTeX", long_about = None)]
#[command(after_help = "EXAMPLES:
    mdtex basic/sort.md sort.tex          Compile a Markdown file
    mdtex sort.json --path basic/sort.md  Compile remark's mdast JSON
    mdtex notes.md --no-images --nested   Embeddable fragment, no images")]
struct Cli {
    /// Input file (.json for mdast JSON, anything else is Markdown)
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Document path used for links, images and labels, relative to the
    /// working directory (defaults to INPUT)
    #[arg(long, value_name = "PATH")]
    path: Option<String>,

    /// Anchor label prefix (defaults to the label of --path)
    #[arg(long, value_name = "LABEL")]
    prefix: Option<String>,

    /// Heading level offset
    #[arg(long, value_name = "N", default_value_t = 0)]
    depth: usize,

    /// Render as an embedded sub-document without a top-level anchor
    #[arg(long)]
    nested: bool,

    /// Directory for fetched and converted images
    #[arg(long, value_name = "DIR", default_value = "images")]
    images_dir: PathBuf,

    /// Drop all images instead of resolving them
    #[arg(long)]
    no_images: bool,

    /// Do not download remote images
    #[arg(long)]
    offline: bool,

    /// Network timeout for image downloads, in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Only report errors
    #[arg(short, long)]
    quiet: bool,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Warn,
        (false, 1) => LevelFilter::Info,
        (false, _) => LevelFilter::Debug,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(level.to_string()),
    )
    .format_timestamp(None)
    .init();
}

fn run(cli: &Cli) -> Result<(), String> {
    let tree = load(&cli.input)?;

    let (path, base_dir) = match &cli.path {
        Some(path) => (path.clone(), PathBuf::from(".")),
        None => document_location(&cli.input),
    };
    let mut options = RenderOptions::for_document(path)
        .with_heading_offset(cli.depth)
        .with_nested(cli.nested);
    if let Some(prefix) = &cli.prefix {
        options.label_prefix = prefix.clone();
    }

    let assets: Box<dyn AssetPipeline> = if cli.no_images {
        Box::new(NoAssets)
    } else {
        let cache = ImageCache::new(AssetConfig {
            base_dir,
            cache_dir: cli.images_dir.clone(),
            timeout: cli.timeout.map(Duration::from_secs),
        });
        if cli.offline {
            Box::new(cache.with_fetcher(OfflineFetcher))
        } else {
            Box::new(cache)
        }
    };

    let compiler = Compiler::new(options, assets.as_ref(), &MarkdownParser);
    let (latex, stats) = compiler.compile_with_stats(&tree);

    match &cli.output {
        Some(output) => fs::write(output, &latex).map_err(|e| format!("{}: {e}", output.display()))?,
        None => io::stdout()
            .write_all(latex.as_bytes())
            .map_err(|e| e.to_string())?,
    }

    info!(
        "{} footnote(s), {} failed image(s), {} unsupported node(s), {} undefined footnote reference(s)",
        stats.footnotes, stats.failed_images, stats.unsupported_nodes, stats.dangling_footnotes
    );
    Ok(())
}

/// Document path and image base directory for INPUT when `--path` is not
/// given.
///
/// A relative path that stays below the working directory is used as is.
/// Anything else (absolute, or climbing out with `..`) is reduced to its file
/// name, with images resolved against its parent directory.
fn document_location(input: &Path) -> (String, PathBuf) {
    let contained = input
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if contained {
        return (input.to_string_lossy().into_owned(), PathBuf::from("."));
    }

    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let parent = input
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    (name, parent)
}

/// Read INPUT as mdast JSON or Markdown, depending on its extension.
fn load(input: &Path) -> Result<Node, String> {
    let source = util::read_text(input).map_err(|e| format!("{}: {e}", input.display()))?;

    let is_json = input
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Node::from_json(&source).map_err(|e| format!("{}: {e}", input.display()))
    } else {
        Ok(MarkdownParser.parse(&source))
    }
}
