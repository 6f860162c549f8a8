//! imgpdf CLI - Command line tool for combining images into one PDF.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use imgpdf_core::util::has_image_extension;
use imgpdf_core::{AppConfig, DocumentAssembler, ImageRecord, ImageSequence, SheetFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SheetOption {
    A3,
    A4,
    A5,
    Letter,
    Legal,
}

impl From<SheetOption> for SheetFormat {
    fn from(opt: SheetOption) -> Self {
        match opt {
            SheetOption::A3 => Self::A3,
            SheetOption::A4 => Self::A4,
            SheetOption::A5 => Self::A5,
            SheetOption::Letter => Self::Letter,
            SheetOption::Legal => Self::Legal,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "imgpdf")]
#[command(author, version, about = "Combine images into a multi-page PDF", long_about = None)]
struct Args {
    /// Input images or directories of images, in page order
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output PDF file (default: images.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Sheet format for every page
    #[arg(long, value_enum)]
    sheet: Option<SheetOption>,

    /// Document title stored in the PDF metadata
    #[arg(long)]
    title: Option<String>,

    /// Config file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Expand directories into their image files, sorted by file name.
///
/// Files without a JPEG or PNG extension are skipped with a warning.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(input)
                .context(format!("Failed to read directory: {}", input.display()))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| path.is_file())
                .collect();
            entries.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

            files.extend(entries.into_iter().filter(|path| keep_image(path)));
        } else if keep_image(input) {
            files.push(input.clone());
        }
    }

    Ok(files)
}

fn keep_image(path: &Path) -> bool {
    let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    if has_image_extension(&name) {
        true
    } else {
        warn!("Skipping {}: not a JPEG or PNG file", path.display());
        false
    }
}

/// Load every file into a sequence, keeping input order.
///
/// Files whose content is neither JPEG nor PNG are skipped with a warning,
/// whatever their extension says. Read failures abort.
fn load_sequence(files: &[PathBuf]) -> Result<ImageSequence> {
    let mut sequence = ImageSequence::new();
    for path in files {
        match ImageRecord::from_file(path) {
            Ok(record) => {
                sequence.push(record);
            }
            Err(e @ imgpdf_core::Error::UnsupportedFormat(_)) => {
                warn!("Skipping {}: {}", path.display(), e);
            }
            Err(e) => {
                return Err(e).context(format!("Failed to load image: {}", path.display()));
            }
        }
    }
    Ok(sequence)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let log_level = match args.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };

    // Override config with CLI arguments
    if let Some(sheet) = args.sheet {
        config.sheet = sheet.into();
    }
    if args.title.is_some() {
        config.title = args.title.clone();
    }

    let files = collect_inputs(&args.inputs)?;
    if files.is_empty() {
        anyhow::bail!("No JPEG or PNG images found");
    }

    let sequence = load_sequence(&files)?;
    if sequence.is_empty() {
        anyhow::bail!("No JPEG or PNG images found");
    }
    info!("Loaded {} images", sequence.len());

    // Setup progress bar
    #[allow(clippy::cast_possible_truncation)]
    let pb = ProgressBar::new(sequence.len() as u64);
    // Template is hardcoded and valid, unwrap is safe
    #[allow(clippy::unwrap_used)]
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );

    let progress = pb.clone();
    let assembler = DocumentAssembler::from_config(&config);
    let generated = assembler
        .generate_async(
            sequence.snapshot(),
            Some(Box::new(move |done: usize, _total: usize| {
                progress.set_position(done as u64);
            })),
        )
        .await;

    let generated = match generated {
        Ok(doc) => {
            pb.finish_with_message("Done");
            doc
        }
        Err(e) => {
            pb.abandon();
            return Err(e).context("Failed to generate PDF");
        }
    };

    let Some(generated) = generated else {
        anyhow::bail!("No images to convert");
    };

    // Determine output path
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(&generated.filename));

    // Save output
    generated
        .write_to(&output_path)
        .context(format!("Failed to write output: {}", output_path.display()))?;

    // CLI output is intentional
    #[allow(clippy::print_stdout)]
    {
        println!(
            "Wrote {} pages to: {}",
            generated.page_count(),
            output_path.display()
        );
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_entries_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.JPG", "notes.txt", "c.jpeg"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let files = collect_inputs(&[dir.path().to_path_buf()]).unwrap();
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.JPG", "b.png", "c.jpeg"]);
    }

    #[test]
    fn test_explicit_files_keep_argument_order() {
        let inputs = vec![
            PathBuf::from("z.png"),
            PathBuf::from("readme.md"),
            PathBuf::from("a.jpg"),
        ];
        let files = collect_inputs(&inputs).unwrap();
        assert_eq!(files, [PathBuf::from("z.png"), PathBuf::from("a.jpg")]);
    }

    #[test]
    fn test_mislabelled_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("a.png");
        let fake = dir.path().join("b.png");
        let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
        png.extend_from_slice(&[0; 16]);
        std::fs::write(&real, png).unwrap();
        std::fs::write(&fake, b"GIF89a\x01\x00\x01\x00\x00\x00\x00").unwrap();

        let sequence = load_sequence(&[fake, real]).unwrap();
        assert_eq!(sequence.len(), 1);
        assert_eq!(sequence.iter().next().unwrap().name(), "a.png");
    }

    #[test]
    fn test_missing_file_aborts_loading() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_sequence(&[dir.path().join("gone.png")]).unwrap_err();
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn test_sheet_option_maps_to_format() {
        assert_eq!(SheetFormat::from(SheetOption::Letter), SheetFormat::Letter);
        assert_eq!(SheetFormat::from(SheetOption::A4), SheetFormat::A4);
    }
}
