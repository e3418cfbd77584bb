use anyhow::{Context, Result};
use clap::Parser;
use dominant_palette::{
    DeltaFormula, Exclusions, PaletteConfig, Quality, SortOrder, extract_palette,
};
use serde_json::json;
use std::path::PathBuf;

/// Print the dominant colors of one or more images.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// One or more input image paths
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Maximum number of palette entries
    #[arg(short = 'k', long, default_value_t = 8)]
    max_colors: usize,

    /// fast, fair, high or best
    #[arg(short, long, default_value_t = Quality::Fair)]
    quality: Quality,

    /// cie76, cie94 or ciede2000
    #[arg(short, long, default_value_t = DeltaFormula::Ciede2000)]
    formula: DeltaFormula,

    /// Comma-separated categories to drop: black, white, gray
    #[arg(short = 'x', long, default_value = "none")]
    exclude: Exclusions,

    /// Merge entries closer than this distance
    #[arg(short, long, default_value_t = 10.0)]
    threshold: f32,

    /// frequency, dark-to-light, light-to-dark, hue or visual
    #[arg(short, long, default_value_t = SortOrder::Frequency)]
    sort: SortOrder,

    /// Print JSON instead of one line per color
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = PaletteConfig::new()
        .max_colors(args.max_colors)
        .quality(args.quality)
        .formula(args.formula)
        .exclusions(args.exclude)
        .merge_threshold(args.threshold)
        .sort(args.sort);

    let mut reports = Vec::new();
    for input in &args.inputs {
        let img = image::open(input)
            .with_context(|| format!("unable to decode {}", input.display()))?;
        let palette = extract_palette(&img, &config)
            .with_context(|| format!("palette extraction failed for {}", input.display()))?;

        if args.json {
            let colors: Vec<_> = palette
                .iter()
                .map(|e| json!({ "hex": e.hex(), "weight": e.weight, "fraction": e.fraction }))
                .collect();
            reports.push(json!({
                "input": input.display().to_string(),
                "palette": colors,
                "sampled": palette.sampled,
                "excluded": palette.excluded,
            }));
        } else {
            println!("{}", input.display());
            if palette.is_empty() {
                println!("  (no colors)");
            }
            for entry in &palette {
                println!(
                    "  {}  {:>8}  {:5.1}%",
                    entry.hex(),
                    entry.weight,
                    entry.fraction * 100.0
                );
            }
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }

    Ok(())
}
