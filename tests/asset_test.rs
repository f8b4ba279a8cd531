//! Image pipeline tests.
//!
//! Tests for resolving local, remote and inline images into the cache
//! directory, and for how image failures surface in compiled documents.

use std::cell::Cell;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use image::{ImageFormat, Rgba, RgbaImage};
use mdtex::assets::{AssetConfig, AssetPipeline, Convert, Fetch, ImageCache, RasterConverter};
use mdtex::ast::Node;
use mdtex::latex::{Compiler, RenderOptions};
use mdtex::parse::MarkdownParser;
use mdtex::{Error, Result};
use tempfile::TempDir;

/// Fetcher serving a fixed PNG and counting calls.
struct CountingFetcher {
    calls: Rc<Cell<usize>>,
    body: Vec<u8>,
}

impl Fetch for CountingFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        if url.contains("missing") {
            return Err(Error::Fetch {
                url: url.to_string(),
                message: "404 Not Found".to_string(),
            });
        }
        Ok(self.body.clone())
    }
}

/// Converter delegating to [`RasterConverter`] and counting calls.
struct CountingConverter {
    calls: Rc<Cell<usize>>,
}

impl Convert for CountingConverter {
    fn convert(&self, source: &Path, dest: &Path) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        RasterConverter.convert(source, dest)
    }
}

struct Fixture {
    dir: TempDir,
    fetches: Rc<Cell<usize>>,
    conversions: Rc<Cell<usize>>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            fetches: Rc::new(Cell::new(0)),
            conversions: Rc::new(Cell::new(0)),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn cache_dir(&self) -> std::path::PathBuf {
        self.root().join("images")
    }

    fn cache(&self) -> ImageCache {
        ImageCache::new(AssetConfig {
            base_dir: self.root().to_path_buf(),
            cache_dir: self.cache_dir(),
            timeout: None,
        })
        .with_fetcher(CountingFetcher {
            calls: Rc::clone(&self.fetches),
            body: png_bytes(),
        })
        .with_converter(CountingConverter {
            calls: Rc::clone(&self.conversions),
        })
    }

    fn write_png(&self, relative: &str) {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, png_bytes()).unwrap();
    }
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(3, 2, Rgba([0, 128, 255, 128]))
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// ============================================================================
// Local Images
// ============================================================================

#[test]
fn test_local_png_is_converted() {
    let fixture = Fixture::new();
    fixture.write_png("basic/img/plot.png");

    let stem = fixture
        .cache()
        .resolve_image("img/plot.png", "basic/sort.md")
        .unwrap();

    assert_eq!(stem, "basic-img-plot");
    let dest = fixture.cache_dir().join("basic-img-plot.jpg");
    let written = image::open(&dest).unwrap();
    assert_eq!((written.width(), written.height()), (3, 2));
    assert_eq!(fixture.conversions.get(), 1);
}

#[test]
fn test_local_jpeg_is_copied() {
    let fixture = Fixture::new();
    let source = fixture.root().join("photo.JPEG");
    fs::write(&source, b"not decoded, only copied").unwrap();

    let stem = fixture.cache().resolve_image("photo.JPEG", "intro.md").unwrap();

    assert_eq!(stem, "photo");
    assert_eq!(
        fs::read(fixture.cache_dir().join("photo.jpg")).unwrap(),
        b"not decoded, only copied"
    );
    assert_eq!(fixture.conversions.get(), 0);
}

#[test]
fn test_resolution_is_idempotent() {
    let fixture = Fixture::new();
    fixture.write_png("img/a.png");
    let cache = fixture.cache();

    let first = cache.resolve_image("img/a.png", "doc.md").unwrap();
    let second = cache.resolve_image("img/a.png", "doc.md").unwrap();

    assert_eq!(first, second);
    assert_eq!(fixture.conversions.get(), 1);
}

#[test]
fn test_prepopulated_cache_skips_source() {
    let fixture = Fixture::new();
    fs::create_dir_all(fixture.cache_dir()).unwrap();
    fs::write(fixture.cache_dir().join("img-gone.jpg"), b"cached").unwrap();

    // The source no longer exists, but the converted file does
    let stem = fixture.cache().resolve_image("img/gone.png", "doc.md").unwrap();
    assert_eq!(stem, "img-gone");
    assert_eq!(fixture.conversions.get(), 0);
}

#[test]
fn test_missing_local_file_fails() {
    let fixture = Fixture::new();
    assert!(fixture.cache().resolve_image("img/none.png", "doc.md").is_err());
    assert!(!fixture.cache_dir().join("img-none.jpg").exists());
}

// ============================================================================
// Remote and Inline Images
// ============================================================================

#[test]
fn test_remote_image_fetched_once() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let url = "https://cdn.example.com/figures/tree.png?size=large";

    let first = cache.resolve_image(url, "basic/sort.md").unwrap();
    let second = cache.resolve_image(url, "basic/sort.md").unwrap();

    assert_eq!(first, "basic-cdn.example.com-tree");
    assert_eq!(first, second);
    assert_eq!(fixture.fetches.get(), 1);
    assert_eq!(fixture.conversions.get(), 1);
    assert!(fixture.cache_dir().join(format!("{first}.jpg")).exists());
}

#[test]
fn test_remote_fetch_failure() {
    let fixture = Fixture::new();
    let err = fixture
        .cache()
        .resolve_image("https://example.com/missing.png", "doc.md")
        .unwrap_err();
    assert!(matches!(err, Error::Fetch { .. }));
}

#[test]
fn test_data_url_is_content_addressed() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let url = format!(
        "data:image/png;base64,{}",
        base64_encode(&png_bytes())
    );

    let stem = cache.resolve_image(&url, "doc.md").unwrap();
    assert!(stem.starts_with("data-"));
    assert_eq!(stem.len(), "data-".len() + 16);
    assert_eq!(cache.resolve_image(&url, "other.md").unwrap(), stem);
    assert_eq!(fixture.fetches.get(), 0);
    assert_eq!(fixture.conversions.get(), 1);
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

// ============================================================================
// Compiled Output
// ============================================================================

#[test]
fn test_compiled_figure() {
    let fixture = Fixture::new();
    fixture.write_png("basic/img/plot.png");
    let cache = fixture.cache();
    let tree = MarkdownParser.parse("![Run time](img/plot.png)");

    let compiler = Compiler::new(
        RenderOptions::for_document("basic/sort.md"),
        &cache,
        &MarkdownParser,
    );
    let latex = compiler.compile(&tree);

    assert!(latex.contains(
        "\\par \\begin{figure}[htbp]\n\\centering\n\
         \\includegraphics[max width=0.7\\textwidth, max height=0.4\\textheight]{basic-img-plot}\n\
         \\caption{Run time}\\end{figure}"
    ));
}

#[test]
fn test_image_failure_does_not_abort() {
    let fixture = Fixture::new();
    let cache = fixture.cache();
    let tree = Node::root(vec![
        Node::paragraph(vec![Node::Image {
            url: "img/none.png".to_string(),
            alt: Some("lost".to_string()),
        }]),
        Node::paragraph(vec![Node::text("still here")]),
    ]);

    let compiler = Compiler::new(RenderOptions::new("doc:"), &cache, &MarkdownParser);
    let (latex, stats) = compiler.compile_with_stats(&tree);

    assert!(!latex.contains("figure"));
    assert!(latex.contains("\\par still here"));
    assert_eq!(stats.failed_images, 1);
}

#[test]
fn test_image_reference_uses_definition() {
    let fixture = Fixture::new();
    fixture.write_png("img/a.png");
    let cache = fixture.cache();
    let tree = Node::root(vec![
        Node::paragraph(vec![Node::ImageReference {
            identifier: "fig".to_string(),
            alt: None,
        }]),
        Node::Definition {
            identifier: "fig".to_string(),
            url: "img/a.png".to_string(),
        },
    ]);

    let compiler = Compiler::new(RenderOptions::for_document("doc.md"), &cache, &MarkdownParser);
    let latex = compiler.compile(&tree);
    assert!(latex.contains("]{img-a}\n\\caption{}\\end{figure}"));
}
