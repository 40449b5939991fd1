use std::{fs, path::PathBuf, sync::Arc};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use utahframe::{
    DirectorySink, ExtractOptions, FfmpegBackend, FfmpegLogLevel, Frame, FrameExtractor,
    OutputFormat, PixelLayout, ProgressCallback, ProgressInfo, UtahDecoder, UtahEncoder,
    UtahHeader, format::PIXEL_LAYOUT,
};

const CLI_AFTER_HELP: &str = "Examples:\n  utahframe extract input.mp4 --out frames\n  utahframe extract input.mp4 --out frames --limit 50 --format ppm --progress\n  utahframe inspect frames/frame1.utah --json\n  utahframe decode frames/frame1.utah --out frame1.png\n  utahframe completions zsh > _utahframe";

#[derive(Debug, Parser)]
#[command(
    name = "utahframe",
    version,
    about = "Extract video frames into UTAH raw-tagged images",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the first video stream's frames to an output directory.
    #[command(
        about = "Extract video frames",
        after_help = "Examples:\n  utahframe extract input.mp4\n  utahframe extract input.mkv --out frames --limit 25 --prefix shot --progress"
    )]
    Extract {
        /// Input media path or URL.
        input: String,
        /// Output directory for the frame files.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Maximum number of frames to write.
        #[arg(long, default_value_t = utahframe::DEFAULT_FRAME_LIMIT)]
        limit: u64,
        /// Output format: utah | ppm.
        #[arg(long, default_value = "utah")]
        format: String,
        /// File name prefix; the frame number and extension are appended.
        #[arg(long, default_value = utahframe::DEFAULT_FILE_PREFIX)]
        prefix: String,
        /// Print FFmpeg's description of the input before extracting.
        #[arg(long)]
        dump: bool,
        /// Show a progress bar.
        #[arg(long)]
        progress: bool,
    },

    /// Validate a UTAH file and print its header.
    #[command(
        about = "Inspect a UTAH file",
        after_help = "Examples:\n  utahframe inspect frame1.utah\n  utahframe inspect frame1.utah --json"
    )]
    Inspect {
        /// UTAH file to read.
        file: PathBuf,
        /// Output the header as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode a UTAH file into a regular image.
    #[command(about = "Convert a UTAH file to PNG, BMP, PPM, ...")]
    Decode {
        /// UTAH file to read.
        file: PathBuf,
        /// Output image path; the format follows its extension.
        #[arg(long)]
        out: PathBuf,
    },

    /// Quantize an image to RGB8 and write it as a UTAH file.
    #[command(about = "Convert an image to a UTAH file")]
    Encode {
        /// Image to read.
        image: PathBuf,
        /// Output UTAH path.
        #[arg(long)]
        out: PathBuf,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();
}

fn apply_global_options(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    init_logging(global.verbose);

    if let Some(level) = &global.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        utahframe::set_ffmpeg_log_level(parsed);
    }
    Ok(())
}

/// Drives an indicatif bar from progress reports.
struct BarProgress {
    bar: ProgressBar,
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_position(info.frames_persisted);
        self.bar.set_message(format!("{} decoded", info.frames_decoded));
        if info.finished {
            self.bar.finish_with_message("done");
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global)?;

    match cli.command {
        Commands::Extract {
            input,
            out,
            limit,
            format,
            prefix,
            dump,
            progress,
        } => {
            let output_format: OutputFormat = format.parse()?;
            let mut options = ExtractOptions::new()
                .with_frame_limit(limit)
                .with_output_format(output_format)
                .with_file_prefix(prefix);

            if progress {
                let bar = ProgressBar::new(limit);
                let style = ProgressStyle::with_template(
                    "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                )?;
                bar.set_style(style.progress_chars("##-"));
                options = options.with_progress(Arc::new(BarProgress { bar }));
            }

            let mut sink = DirectorySink::new(&out, &options)?;
            let backend = FfmpegBackend::new().with_dump_format(dump);
            let mut extractor = FrameExtractor::new(backend, options);
            let report = extractor.run(&input, &mut sink)?;

            if cli.global.verbose {
                for path in sink.written() {
                    eprintln!("saved {}", path.display());
                }
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Extracted {} frame(s) of {} decoded to {}",
                    report.frames_persisted,
                    report.frames_decoded,
                    out.display()
                )
                .green()
            );
        }
        Commands::Inspect { file, json } => {
            let bytes = fs::read(&file)?;
            let header = UtahHeader::parse(&bytes)?;
            let encoded_len = header.encoded_len().unwrap_or(bytes.len());
            let trailing = bytes.len().saturating_sub(encoded_len);

            if json {
                let payload = json!({
                    "path": file.display().to_string(),
                    "width": header.width(),
                    "height": header.height(),
                    "pixel_format": PIXEL_LAYOUT.to_string(),
                    "file_size": bytes.len(),
                    "trailing_bytes": trailing,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{}", file.display().to_string().bold());
                println!("  dimensions:   {}x{}", header.width(), header.height());
                println!("  pixel format: {}", PIXEL_LAYOUT);
                println!("  file size:    {} bytes", bytes.len());
                if trailing > 0 {
                    println!(
                        "  {}",
                        format!("{trailing} trailing byte(s) after payload").yellow()
                    );
                }
            }
        }
        Commands::Decode { file, out } => {
            let bytes = fs::read(&file)?;
            let mut decoder = UtahDecoder::new();
            let frame = decoder.decode(&bytes)?;
            frame.to_rgb_image().save(&out)?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Decoded {}x{} image to {}",
                    frame.width(),
                    frame.height(),
                    out.display()
                )
                .green()
            );
        }
        Commands::Encode { image, out } => {
            let rgb = image::open(&image)?.to_rgb8();
            let frame = Frame::from_rgb_image(&rgb, PixelLayout::Rgb8)?;
            let mut encoder = UtahEncoder::new(frame.layout(), frame.width(), frame.height())?;
            fs::write(&out, encoder.encode(&frame)?.data())?;

            println!(
                "{} {}",
                "success:".green().bold(),
                format!("Encoded {} to {}", image.display(), out.display()).green()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "utahframe", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
