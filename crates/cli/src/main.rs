//! CLI for turning scanned reports, text files and emails into STAR slides.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use star_core::{DomainDict, Error, ParseStrategy, StarClassifier, StarSection, TextNormalizer};
use star_loader::{decode_text, DocumentLoader};
use star_ocr::{
    Binarization, CoordinatorOptions, DirectorySink, OcrCoordinator, PdftoppmRenderer,
    PreprocessConfig, Preprocessor, TesseractEngine,
};
use std::path::{Path, PathBuf};

/// Turn scanned reports, text files and emails into STAR slides.
#[derive(Parser, Debug)]
#[command(name = "star-report")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract and merge text from images, PDFs, text files and .msg emails
    Extract(ExtractArgs),

    /// Pick key sentences from a text file and sort them into a STAR draft
    Draft(DraftArgs),

    /// Append slides for each report block to a .pptx file
    Slides(SlidesArgs),
}

#[derive(clap::Args, Debug)]
struct ExtractArgs {
    /// Input files, processed in order
    #[arg(required = true)]
    input: Vec<PathBuf>,

    /// Skip the layout-aware primary OCR engine
    #[arg(long)]
    no_primary: bool,

    /// Use the line-based OCR engine when the primary finds nothing
    #[arg(long)]
    fallback: bool,

    /// Binarization method for OCR preprocessing
    #[arg(long, value_enum, default_value = "adaptive")]
    binarize: BinarizeArg,

    /// Do not upscale images before OCR
    #[arg(long)]
    no_enlarge: bool,

    /// Write every preprocessing stage as a PNG into this directory
    #[arg(long)]
    debug_dir: Option<PathBuf>,

    /// Path to the tesseract executable
    #[arg(long, default_value = "tesseract")]
    tesseract: PathBuf,

    /// Path to the pdftoppm executable
    #[arg(long, default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// OCR language set
    #[arg(long, default_value = star_ocr::engine::DEFAULT_LANGUAGES)]
    lang: String,

    /// Write the merged text to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct DraftArgs {
    /// Normalized text file to draft from
    input: PathBuf,

    /// Domain dictionary JSON ({"keywords": [...], "product_codes": [...]})
    #[arg(short, long)]
    dict: PathBuf,

    /// Number of key sentences to keep
    #[arg(short, long, default_value = "10")]
    top: usize,

    /// Print the draft as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args, Debug)]
struct SlidesArgs {
    /// Report text containing `--- 報告 N：title ---` blocks
    input: PathBuf,

    /// Presentation to append to (created if missing)
    #[arg(short, long)]
    output: PathBuf,

    /// Project name prefixed to every slide title
    #[arg(short, long)]
    project: Option<String>,

    /// How body lines are split into headings and bullets
    #[arg(short, long, value_enum, default_value = "heading")]
    strategy: StrategyArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BinarizeArg {
    Adaptive,
    Otsu,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    /// Lines starting with a STAR label are headings
    Heading,
    /// Indented lines are bullets
    Indent,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &args.command {
        Command::Extract(extract) => run_extract(extract, args.verbose),
        Command::Draft(draft) => run_draft(draft),
        Command::Slides(slides) => run_slides(slides),
    }
}

fn run_extract(args: &ExtractArgs, verbose: bool) -> Result<()> {
    let primary = TesseractEngine::layout()
        .with_program(&args.tesseract)
        .with_languages(&args.lang);
    let fallback = TesseractEngine::lines()
        .with_program(&args.tesseract)
        .with_languages(&args.lang);
    let renderer = PdftoppmRenderer::new().with_program(&args.pdftoppm);

    let binarization = match args.binarize {
        BinarizeArg::Adaptive => Binarization::default(),
        BinarizeArg::Otsu => Binarization::Otsu,
    };
    let config = PreprocessConfig::default()
        .with_binarization(binarization)
        .with_enlarge(!args.no_enlarge);
    let mut preprocessor = Preprocessor::new(config);
    if let Some(dir) = &args.debug_dir {
        preprocessor = preprocessor.with_sink(Box::new(DirectorySink::new(dir)));
    }

    let coordinator = OcrCoordinator::new(&primary, &fallback)
        .with_renderer(&renderer)
        .with_preprocessor(preprocessor)
        .with_options(CoordinatorOptions {
            use_primary: !args.no_primary,
            use_fallback: args.fallback,
            ..Default::default()
        });
    let loader = DocumentLoader::new(coordinator);

    let batch = match loader.load_paths(&args.input) {
        Ok(batch) => batch,
        Err(Error::EmptyBatch) => bail!("No text could be extracted from the given files"),
        Err(e) => return Err(e.into()),
    };

    for (name, reason) in batch.skipped() {
        eprintln!("Skipped {}: {}", name, reason);
    }
    if verbose {
        eprintln!(
            "Loaded {} of {} files, {} characters",
            batch.loaded_count(),
            batch.items.len(),
            batch.text.chars().count()
        );
    }

    match &args.output {
        Some(path) => write_output(path, &batch.text)?,
        None => println!("{}", batch.text),
    }

    Ok(())
}

fn run_draft(args: &DraftArgs) -> Result<()> {
    let dict = DomainDict::from_path(&args.dict)
        .with_context(|| format!("Failed to read dictionary {}", args.dict.display()))?;
    let text = read_text(&args.input)?;
    let text = TextNormalizer::new().normalize(&text);

    let classifier = StarClassifier::new(dict);
    let (key_sentences, bucket) = classifier.draft(&text, args.top);

    if args.json {
        let draft = serde_json::json!({
            "key_sentences": key_sentences,
            "star": bucket,
        });
        println!("{}", serde_json::to_string_pretty(&draft)?);
        return Ok(());
    }

    println!("Key sentences:");
    for (idx, sentence) in key_sentences.iter().enumerate() {
        println!("{}. {}", idx + 1, sentence);
    }
    println!();
    if bucket.is_empty() {
        println!("(no sentences)");
    } else {
        println!("{}", bucket.to_outline());
    }
    log::debug!(
        "Draft: {} situation, {} task, {} action, {} result",
        bucket.section(StarSection::Situation).len(),
        bucket.section(StarSection::Task).len(),
        bucket.section(StarSection::Action).len(),
        bucket.section(StarSection::Result).len()
    );

    Ok(())
}

fn run_slides(args: &SlidesArgs) -> Result<()> {
    let text = read_text(&args.input)?;
    let strategy = match args.strategy {
        StrategyArg::Heading => ParseStrategy::HeadingKeyword,
        StrategyArg::Indent => ParseStrategy::IndentWhitespace,
    };

    match star_pptx::append_report_text(&args.output, &text, args.project.as_deref(), strategy) {
        Ok(added) => {
            println!("Added {} slides to {}", added, args.output.display());
            Ok(())
        }
        Err(Error::OutputLocked(path)) => bail!(
            "{} is open in another program. Close it and try again.",
            path.display()
        ),
        Err(Error::NoValidReports) => bail!(
            "No report blocks found. Each report must start with a line like '--- 報告 1：Title ---' and have content below it."
        ),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to write slides to {}", args.output.display()))
        }
    }
}

/// Read a text file, decoding legacy Chinese encodings when needed.
fn read_text(path: &Path) -> Result<String> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(decode_text(&bytes))
}

/// Write output to a file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extract_flags() {
        let args = Args::parse_from([
            "star-report",
            "extract",
            "a.png",
            "b.txt",
            "--no-primary",
            "--fallback",
            "--binarize",
            "otsu",
            "-o",
            "out.txt",
        ]);
        match args.command {
            Command::Extract(extract) => {
                assert_eq!(extract.input.len(), 2);
                assert!(extract.no_primary);
                assert!(extract.fallback);
                assert!(matches!(extract.binarize, BinarizeArg::Otsu));
                assert_eq!(extract.lang, "chi_tra+chi_sim+eng");
                assert_eq!(extract.output, Some(PathBuf::from("out.txt")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_slides_defaults() {
        let args = Args::parse_from(["star-report", "-v", "slides", "r.txt", "-o", "deck.pptx"]);
        assert!(args.verbose);
        match args.command {
            Command::Slides(slides) => {
                assert!(matches!(slides.strategy, StrategyArg::Heading));
                assert!(slides.project.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_slides_without_reports() {
        let dir = std::env::temp_dir().join(format!("star-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("empty.txt");
        std::fs::write(&input, "no markers here").unwrap();
        let output = dir.join("deck.pptx");

        let err = run_slides(&SlidesArgs {
            input,
            output: output.clone(),
            project: None,
            strategy: StrategyArg::Heading,
        })
        .unwrap_err();
        assert!(err.to_string().contains("No report blocks found"));
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
