//! Headless label viewer
//!
//! Builds a label pool from a config file, lays out the given texts and reports what a
//! renderer would upload: instance counts, label sizes, material scale and atlas usage.
//!
//! ```text
//! label_viewer [--config pool.toml] [--backend uniform|node] [--font font.ttf]
//!              [--atlas-out atlas.png] [TEXT]...
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use sdf_labels::foundation::logging;
use sdf_labels::prelude::*;

/// Viewer errors that carry context beyond the library error
#[derive(Debug, thiserror::Error)]
enum ViewerError {
    #[error("Failed to load configuration from {path}")]
    Config {
        path: String,
        #[source]
        source: ConfigError,
    },

    #[error("Font files require the 'fontdue' feature")]
    #[cfg_attr(feature = "fontdue", allow(dead_code))]
    FontSupportDisabled,
}

/// Material backend used for the labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// One uniform block per material
    Uniform,
    /// Named, individually versioned uniform nodes
    Node,
}

/// Lay out SDF labels headlessly and report atlas usage
#[derive(Debug, Parser)]
#[command(name = "label_viewer", version)]
struct Args {
    /// Pool configuration file (.toml or .ron)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Material backend
    #[arg(long, value_enum, default_value_t = Backend::Uniform)]
    backend: Backend,

    /// TrueType or OpenType font file
    #[arg(long)]
    font: Option<PathBuf>,

    /// Write the atlas bitmap as a grayscale PNG
    #[arg(long)]
    atlas_out: Option<String>,

    /// Texts to lay out, `\n` starts a new line
    #[arg(value_parser = unescape_newlines)]
    texts: Vec<String>,
}

impl Args {
    fn texts(&self) -> Vec<String> {
        if !self.texts.is_empty() {
            return self.texts.clone();
        }
        vec![
            "Hello, world!".to_string(),
            "SDF labels\nscale cleanly".to_string(),
            "\u{3b1}\u{3b2}\u{3b3} \u{2192} \u{2603}".to_string(),
        ]
    }
}

fn unescape_newlines(text: &str) -> Result<String, std::convert::Infallible> {
    Ok(text.replace("\\n", "\n"))
}

fn load_config(path: Option<&Path>) -> Result<PoolConfig, ViewerError> {
    let Some(path) = path else {
        return Ok(PoolConfig::default());
    };

    log::info!("Loading configuration from {}", path.display());
    let context = |source| ViewerError::Config {
        path: path.display().to_string(),
        source,
    };
    let config = PoolConfig::load_from_file(path).map_err(context)?;
    config.validate().map_err(context)?;
    Ok(config)
}

fn create_rasterizer(
    args: &Args,
    config: &PoolConfig,
) -> Result<Box<dyn GlyphRasterizer>, Box<dyn std::error::Error>> {
    if let Some(path) = &args.font {
        #[cfg(feature = "fontdue")]
        {
            let bytes = std::fs::read(path)?;
            let rasterizer = sdf_labels::text::FontdueRasterizer::from_bytes(&bytes, &config.atlas)?;
            log::info!("Rasterizing glyphs from {}", path.display());
            return Ok(Box::new(rasterizer));
        }
        #[cfg(not(feature = "fontdue"))]
        {
            log::error!("Cannot load {}", path.display());
            return Err(ViewerError::FontSupportDisabled.into());
        }
    }

    log::info!("No font given, using box glyphs");
    Ok(Box::new(
        FixedGlyphRasterizer::for_font_size(config.atlas.font_size)
            .with_font_family(config.atlas.font_family.clone()),
    ))
}

fn run<F: MaterialFactory>(mut pool: LabelPool<F>, args: &Args) -> Result<(), Box<dyn std::error::Error>>
where
    F::Material: 'static,
{
    pool.add_event_listener(EventKind::Error, |event| {
        if let LabelEvent::Error(error) = event {
            log::error!("Atlas error for {:?}: {error}", error.character());
        }
    });

    let texts = args.texts();
    let mut labels = Vec::with_capacity(texts.len());
    for text in &texts {
        let mut label = pool.acquire();
        label.set_text(text);
        labels.push(label);
    }

    for label in &labels {
        let size = label.label_size();
        let params = label.material().params();
        log::info!(
            "{}: {:?} -> {} instances, {}x{} px, scale {:.5}, {} bytes",
            label.id(),
            label.text(),
            label.instance_count(),
            size.x,
            size.y,
            params.scale,
            label.instance_buffer().as_bytes().len()
        );
    }

    {
        let atlas = pool.atlas();
        let metrics = atlas.line_metrics();
        log::info!(
            "Atlas {}x{}: {} glyphs ({} seen), line height {}, max ascent {}",
            atlas.width(),
            atlas.height(),
            atlas.glyph_count(),
            atlas.seen_count(),
            metrics.line_height,
            metrics.max_ascent
        );

        if let Some(path) = &args.atlas_out {
            atlas.save_debug_image(path)?;
        }
    }

    for label in labels {
        pool.release(label);
    }
    log::info!("Pool stats: {:?}", pool.stats());

    pool.dispose();
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_with_level("info");
    let args = Args::parse();
    log::info!("Starting label viewer");

    let config = load_config(args.config.as_deref())?;
    let rasterizer = create_rasterizer(&args, &config)?;
    match args.backend {
        Backend::Uniform => run(LabelPool::new(config, UniformMaterialFactory, rasterizer), &args)?,
        Backend::Node => run(LabelPool::new(config, NodeMaterialFactory, rasterizer), &args)?,
    }

    log::info!("Label viewer finished");
    Ok(())
}
