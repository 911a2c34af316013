use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use ffmpeg_next::util::log::Level;
use frameseq::{
    DEFAULT_EXPORT_FILE_TEMPLATE, DEFAULT_EXPORT_TIMESTAMPS_FILE, DEFAULT_INPUT_IMAGE_TEMPLATE,
    DEFAULT_INPUT_TIMESTAMPS_FILE, DEFAULT_MAX_WORKERS, FolderExportOptions, FolderLayout,
    FrameSequence, ProgressCallback, ProgressInfo, VideoCodec, VideoEncoder, VideoEncoderOptions,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  frameseq info capture --json\n  frameseq extract input.mp4 --out frames --fps 25 --progress\n  frameseq encode capture --out capture.avi\n  frameseq resample capture --out resampled --skip 2 --repeat 1\n  frameseq completions zsh > _frameseq";

#[derive(Debug, Parser)]
#[command(
    name = "frameseq",
    version,
    about = "Convert between timestamped frame folders and video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone)]
struct GlobalOptions {
    /// Show debug logging, including FFmpeg's own output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar while writing.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow writing into existing outputs.
    #[arg(long, global = true)]
    overwrite: bool,

    /// Number of concurrent image writers for folder output.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_WORKERS)]
    workers: usize,
}

/// How an input frame folder names its files.
#[derive(Debug, Args, Clone)]
struct InputLayout {
    /// Image name template with one integer field.
    #[arg(long, default_value = DEFAULT_INPUT_IMAGE_TEMPLATE)]
    template: String,

    /// Timestamp log name inside the folder.
    #[arg(long, default_value = DEFAULT_INPUT_TIMESTAMPS_FILE)]
    timestamps: String,
}

impl InputLayout {
    fn to_layout(&self) -> FolderLayout {
        FolderLayout::new()
            .with_image_template(&self.template)
            .with_timestamps_file(&self.timestamps)
    }
}

/// How an output frame folder names its files.
#[derive(Debug, Args, Clone)]
struct OutputLayout {
    /// Output image name template; the extension picks the image format.
    #[arg(long, default_value = DEFAULT_EXPORT_FILE_TEMPLATE)]
    file_template: String,

    /// Output timestamp log name.
    #[arg(long, default_value = DEFAULT_EXPORT_TIMESTAMPS_FILE)]
    timestamps_file: String,
}

/// Optional skip-and-repeat resampling.
#[derive(Debug, Args, Clone)]
struct Resampling {
    /// Keep the first frame of every N.
    #[arg(long, default_value_t = 1)]
    skip: usize,

    /// Extra copies to emit of every kept frame.
    #[arg(long, default_value_t = 0)]
    repeat: usize,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print frame count, size, and timing of a frame folder.
    #[command(
        visible_alias = "probe",
        after_help = "Examples:\n  frameseq info capture\n  frameseq info capture --template img_{:05d}.jpg --json"
    )]
    Info {
        /// Input frame folder.
        input: PathBuf,
        #[command(flatten)]
        layout: InputLayout,
        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode a video into a frame folder.
    #[command(
        after_help = "Examples:\n  frameseq extract input.mp4 --out frames --fps 30\n  frameseq extract input.mp4 --out frames --fps 240 --skip 8 --repeat 7"
    )]
    Extract {
        /// Input video file.
        input: PathBuf,
        /// Output frame folder.
        #[arg(long)]
        out: PathBuf,
        /// Frame rate used to stamp the decoded frames.
        #[arg(long)]
        fps: f64,
        #[command(flatten)]
        layout: OutputLayout,
        #[command(flatten)]
        resampling: Resampling,
    },

    /// Encode a frame folder into a video file.
    #[command(
        after_help = "Examples:\n  frameseq encode capture --out capture.avi\n  frameseq encode capture --out capture.mp4 --codec h264 --fps 25"
    )]
    Encode {
        /// Input frame folder.
        input: PathBuf,
        /// Output video file; the extension picks the container.
        #[arg(long)]
        out: PathBuf,
        /// Container frame rate.
        #[arg(long, default_value_t = frameseq::DEFAULT_VIDEO_FPS)]
        fps: u32,
        /// Codec: mpeg4 | h264 | mjpeg.
        #[arg(long, default_value = "mpeg4")]
        codec: String,
        #[command(flatten)]
        layout: InputLayout,
        #[command(flatten)]
        resampling: Resampling,
    },

    /// Apply skip-and-repeat to a frame folder and write a new folder.
    #[command(
        after_help = "Examples:\n  frameseq resample capture --out resampled --skip 2 --repeat 1"
    )]
    Resample {
        /// Input frame folder.
        input: PathBuf,
        /// Output frame folder.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        layout: InputLayout,
        #[command(flatten)]
        output_layout: OutputLayout,
        #[command(flatten)]
        resampling: Resampling,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_codec(value: &str) -> Option<VideoCodec> {
    match value.to_ascii_lowercase().as_str() {
        "mpeg4" | "xvid" | "divx" => Some(VideoCodec::Mpeg4),
        "h264" | "avc" => Some(VideoCodec::H264),
        "mjpeg" | "mjpg" => Some(VideoCodec::Mjpeg),
        _ => None,
    }
}

fn init_logging(global: &GlobalOptions) {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if !global.verbose {
        ffmpeg_next::util::log::set_level(Level::Error);
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    let occupied = if path.is_dir() {
        fs::read_dir(path)?.next().is_some()
    } else {
        path.exists()
    };

    if occupied {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("writing into existing {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn resample(
    sequence: FrameSequence,
    resampling: &Resampling,
) -> Result<FrameSequence, Box<dyn std::error::Error>> {
    if resampling.skip == 1 && resampling.repeat == 0 {
        return Ok(sequence);
    }
    Ok(sequence.skip_and_repeat(resampling.skip, resampling.repeat)?)
}

struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    fn new(message: &'static str) -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?;
        bar.set_style(style.progress_chars("##-"));
        bar.set_message(message);
        Ok(Self { bar })
    }
}

impl ProgressCallback for BarProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        // Workers finish out of order; never move the bar backwards.
        if info.current > self.bar.position() {
            self.bar.set_position(info.current);
        }
    }
}

fn export_folder(
    sequence: &FrameSequence,
    out: &Path,
    layout: &OutputLayout,
    global: &GlobalOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = FolderExportOptions::new()
        .with_file_template(&layout.file_template)
        .with_timestamps_file(&layout.timestamps_file)
        .with_max_workers(global.workers);

    let bar = if global.progress {
        let progress = Arc::new(BarProgress::new("writing")?);
        options = options.with_progress(progress.clone());
        Some(progress)
    } else {
        None
    };

    let written = sequence.to_folder(out, &options)?;
    if let Some(progress) = bar {
        progress.bar.finish_with_message("done");
    }

    println!(
        "{} {}",
        "success:".green().bold(),
        format!("Wrote {} frame(s) to {}", written.len(), out.display()).green()
    );
    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Info {
            input,
            layout,
            json,
        } => {
            let sequence = FrameSequence::from_folder_with_layout(&input, &layout.to_layout())?;
            let timestamps = sequence.timestamps();
            let first = timestamps.first().copied();
            let last = timestamps.last().copied();
            let mean_spacing = match (first, last) {
                (Some(first), Some(last)) if timestamps.len() > 1 => {
                    Some((last - first) / (timestamps.len() - 1) as f64)
                }
                _ => None,
            };

            if json {
                let payload = json!({
                    "frames": sequence.len(),
                    "width": sequence.dimensions().map(|(width, _)| width),
                    "height": sequence.dimensions().map(|(_, height)| height),
                    "first_timestamp": first,
                    "last_timestamp": last,
                    "mean_spacing": mean_spacing,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Frames: {}", sequence.len());
                if let Some((width, height)) = sequence.dimensions() {
                    println!("Size: {width}x{height}");
                }
                if let (Some(first), Some(last)) = (first, last) {
                    println!("Time: {first:.6}s .. {last:.6}s");
                }
                if let Some(spacing) = mean_spacing.filter(|spacing| *spacing > 0.0) {
                    println!("Mean spacing: {spacing:.6}s ({:.3} fps)", 1.0 / spacing);
                }
            }
        }
        Commands::Extract {
            input,
            out,
            fps,
            layout,
            resampling,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let sequence = FrameSequence::from_video(&input, fps)?;
            let sequence = resample(sequence, &resampling)?;
            export_folder(&sequence, &out, &layout, &cli.global)?;
        }
        Commands::Encode {
            input,
            out,
            fps,
            codec,
            layout,
            resampling,
        } => {
            let codec = parse_codec(&codec).ok_or(format!("unsupported --codec: {codec}"))?;
            ensure_writable_path(&out, cli.global.overwrite)?;

            let sequence = FrameSequence::from_folder_with_layout(&input, &layout.to_layout())?;
            let sequence = resample(sequence, &resampling)?;

            let options = VideoEncoderOptions::default().codec(codec).fps(fps);
            let mut encoder = VideoEncoder::new(options);
            let bar = if cli.global.progress {
                let progress = Arc::new(BarProgress::new("encoding")?);
                encoder = encoder.with_progress(progress.clone());
                Some(progress)
            } else {
                None
            };

            sequence.to_video_with_encoder(&out, encoder)?;
            if let Some(progress) = bar {
                progress.bar.finish_with_message("done");
            }
            println!("{} {}", "saved".green().bold(), out.display());
        }
        Commands::Resample {
            input,
            out,
            layout,
            output_layout,
            resampling,
        } => {
            ensure_writable_path(&out, cli.global.overwrite)?;
            let sequence = FrameSequence::from_folder_with_layout(&input, &layout.to_layout())?;
            let sequence = sequence.skip_and_repeat(resampling.skip, resampling.repeat)?;
            export_folder(&sequence, &out, &output_layout, &cli.global)?;
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "frameseq", &mut std::io::stdout());
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

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, parse_codec};

    #[test]
    fn parse_codec_aliases() {
        assert!(parse_codec("mpeg4").is_some());
        assert!(parse_codec("XVID").is_some());
        assert!(parse_codec("h264").is_some());
        assert!(parse_codec("mjpg").is_some());
        assert!(parse_codec("vp9").is_none());
    }

    #[test]
    fn resample_defaults_and_flags() {
        let cli = Cli::try_parse_from([
            "frameseq", "resample", "in", "--out", "out", "--skip", "3", "--repeat", "2",
        ])
        .unwrap();
        match cli.command {
            Commands::Resample {
                resampling, layout, ..
            } => {
                assert_eq!(resampling.skip, 3);
                assert_eq!(resampling.repeat, 2);
                assert_eq!(layout.template, "frame_{:010d}.png");
                assert_eq!(layout.timestamps, "timestamps.txt");
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert_eq!(cli.global.workers, 8);
    }

    #[test]
    fn extract_requires_fps() {
        assert!(Cli::try_parse_from(["frameseq", "extract", "in.mp4", "--out", "out"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "frameseq", "encode", "in", "--out", "out.avi", "--workers", "2", "--verbose",
        ])
        .unwrap();
        assert_eq!(cli.global.workers, 2);
        assert!(cli.global.verbose);
    }
}
