//! # coverkit CLI
//!
//! Usage:
//!   coverkit render cover.json -o cover.png
//!   echo '{ ... }' | coverkit render - -o cover.png --scale 2
//!   coverkit normalize body.html
//!   coverkit flatten body.html
//!   coverkit example > cover.json

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use coverkit::{CoverError, CoverState, FontContext, FontEntry, RenderOptions};

#[derive(Parser)]
#[command(name = "coverkit")]
#[command(version, about = "Normalize rich text and render text covers to PNG", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a cover state JSON document to PNG
    Render {
        /// Cover state JSON file, or `-` for stdin
        #[arg(value_name = "INPUT", default_value = "-")]
        input: String,

        /// Output PNG path
        #[arg(short, long, default_value = "cover.png")]
        output: PathBuf,

        /// JSON list of font entries ({ family, src, weight, italic })
        #[arg(long, value_name = "FONTS")]
        fonts: Option<PathBuf>,

        /// Physical pixels per logical pixel
        #[arg(long, default_value_t = 4.0)]
        scale: f32,

        /// Skip the grain layer
        #[arg(long)]
        no_noise: bool,

        /// Do not look for fonts in the system font directories
        #[arg(long)]
        no_system_fonts: bool,
    },
    /// Print the normalized form of a rich-text HTML fragment
    Normalize {
        /// HTML file, or `-` for stdin
        #[arg(value_name = "INPUT", default_value = "-")]
        input: String,
    },
    /// Print a rich-text HTML fragment as plain text
    Flatten {
        /// HTML file, or `-` for stdin
        #[arg(value_name = "INPUT", default_value = "-")]
        input: String,
    },
    /// Print an example cover state
    Example,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Render {
            input,
            output,
            fonts,
            scale,
            no_noise,
            no_system_fonts,
        } => {
            let options = RenderOptions {
                scale,
                noise: !no_noise,
                system_fonts: !no_system_fonts,
                ..RenderOptions::default()
            };
            render(&input, &output, fonts.as_deref(), options)
        }
        Command::Normalize { input } => read_input(&input).map(|html| {
            println!("{}", coverkit::normalize(&html));
        }),
        Command::Flatten { input } => read_input(&input).map(|html| {
            println!("{}", coverkit::flatten(&html));
        }),
        Command::Example => {
            print!("{}", example_cover_json());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn render(
    input: &str,
    output: &Path,
    fonts: Option<&Path>,
    mut options: RenderOptions,
) -> Result<(), CoverError> {
    let state: CoverState = serde_json::from_str(&read_input(input)?)?;
    if let Some(path) = fonts {
        let entries: Vec<FontEntry> = serde_json::from_str(&fs::read_to_string(path)?)?;
        options.fonts = entries;
    }
    let font_context = FontContext::from_options(&options);
    let png = coverkit::render_with(&state, &options, &font_context)?;
    fs::write(output, &png)?;
    eprintln!("✓ Written {} bytes to {}", png.len(), output.display());
    Ok(())
}

fn read_input(input: &str) -> Result<String, CoverError> {
    if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn example_cover_json() -> &'static str {
    r##"{
  "title": "加急投递",
  "subtitle": "好像不说清楚我是谁、你是什么，第二天太阳就不会升起来",
  "bodyText": "<div>凌晨三点，邮局的灯还亮着。</div><div><br></div><div>她把信封压平，写下一个不存在的地址。</div>",
  "secondaryBodyText": "",
  "dualityBodyText": "",
  "dualitySecondaryBodyText": "",
  "category": "文稿、常稿",
  "author": "琉璃",
  "backgroundColor": "#F9DEE2",
  "accentColor": "#F0A9A9",
  "textColor": "#45597B",
  "layoutStyle": "minimal",
  "mode": "long-text",
  "bodyTextSize": "text-[13px]",
  "bodyTextAlign": "text-justify",
  "isBodyBold": false,
  "isBodyItalic": false,
  "titleFont": "serif",
  "bodyFont": "serif"
}
"##
}
