use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use watermark::position::Placement;
use watermark::{stamp, OutputFormat, Watermark, WatermarkConfig};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Png,
    Jpeg,
    Bmp,
    Webp,
}

/// Stamp one or more marks onto a target image
#[derive(Parser, Debug)]
#[command(name = "watermark", version, about)]
struct Args {
    /// Target image followed by the marks to stamp onto it (URLs or paths)
    #[arg(required = true)]
    resources: Vec<String>,

    /// Where each mark goes: upper-left, upper-right, lower-left, lower-right, center
    #[arg(long, default_value = "lower-right")]
    position: Placement,

    /// Mark opacity in 0.0..=1.0
    #[arg(long, default_value_t = 1.0)]
    alpha: f32,

    /// Repeat a single mark over the whole target instead of placing it once
    #[arg(long, conflicts_with = "position")]
    tile: bool,

    /// Gap between tiles in pixels
    #[arg(long, default_value_t = 0, requires = "tile")]
    gap: u32,

    /// Output encoding (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<Format>,

    /// JPEG quality 1..=100
    #[arg(long, default_value_t = 92)]
    quality: u8,

    /// JSON file holding a WatermarkConfig
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the encoded image here
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the data URL to stdout
    #[arg(long)]
    data_url: bool,
}

fn load_config(args: &Args) -> anyhow::Result<WatermarkConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?
        }
        None => WatermarkConfig::default(),
    };
    if let Some(format) = args.format {
        config.format = match format {
            Format::Png => OutputFormat::Png,
            Format::Jpeg => OutputFormat::Jpeg {
                quality: args.quality,
            },
            Format::Bmp => OutputFormat::Bmp,
            Format::Webp => OutputFormat::Webp,
        };
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if args.output.is_none() && !args.data_url {
        bail!("nothing to do: pass --output and/or --data-url");
    }
    if args.tile && args.resources.len() != 2 {
        bail!("--tile takes exactly one target and one mark");
    }

    let config = load_config(&args)?;
    let wm = Watermark::new(args.resources.iter(), None, config);
    info!("stamping {} mark(s)", args.resources.len().saturating_sub(1));

    let url = if args.tile {
        wm.data_url(stamp::tiled(args.alpha, args.gap)).await?
    } else {
        wm.data_url(stamp::each(args.position, args.alpha)).await?
    };

    if let Some(path) = &args.output {
        let blob = watermark::convert::blob(url.clone()).await?;
        std::fs::write(path, blob.as_bytes())
            .with_context(|| format!("writing {}", path.display()))?;
        info!("wrote {} bytes to {}", blob.len(), path.display());
    }
    if args.data_url {
        println!("{}", url);
    }
    Ok(())
}
