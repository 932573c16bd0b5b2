use clap::Parser;
use mediagal::config::{self, Overrides};
use mediagal::encoder::CommandEncoder;
use mediagal::shutdown::{self, CancellationToken};
use mediagal::{output, pipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    if env!("MEDIAGAL_RELEASE_TAG") == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("MEDIAGAL_GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "mediagal")]
#[command(about = "Mirror a directory of photos and videos into a static HTML gallery")]
#[command(long_about = "\
Mirror a directory of photos and videos into a static HTML gallery

Every image gets a scaled copy (s_<name>) and a thumbnail (t_<name>); every
video is transcoded to <name>.mp4 with a <name>.mp4.jpg thumbnail. Each
directory gets an index.html. Outputs that already exist are not redone.

Requires ImageMagick (convert) and ffmpeg on PATH.

Ctrl-C stops starting new conversions, waits for running ones, and exits
with a partial gallery.")]
#[command(version = version_string())]
struct Cli {
    /// Input root directory
    #[arg(short = 'i', long = "input", required_unless_present = "print_config")]
    input: Option<PathBuf>,

    /// Output root directory
    #[arg(short = 'o', long = "output", required_unless_present = "print_config")]
    output: Option<PathBuf>,

    /// Comma-separated image extensions [default: jpg,jpeg,gif,png,heic]
    #[arg(long, value_name = "EXTS")]
    image: Option<String>,

    /// Comma-separated video extensions [default: mp4,avi,mov]
    #[arg(long, value_name = "EXTS")]
    video: Option<String>,

    /// Image extensions converted to JPEG [default: heic]
    #[arg(long, value_name = "EXTS")]
    convert: Option<String>,

    /// Thumbnail max width [default: 400]
    #[arg(short = 'x', long = "thumb-width")]
    thumb_width: Option<u32>,

    /// Thumbnail max height [default: 225]
    #[arg(short = 'y', long = "thumb-height")]
    thumb_height: Option<u32>,

    /// Scaled max width [default: 1920]
    #[arg(short = 'X', long = "scale-width")]
    scale_width: Option<u32>,

    /// Scaled max height [default: 1080]
    #[arg(short = 'Y', long = "scale-height")]
    scale_height: Option<u32>,

    /// Max concurrent conversions [default: number of CPU cores]
    #[arg(short = 'p', long = "parallel")]
    parallel: Option<usize>,

    /// Log every encoder command and its diagnostics
    #[arg(short, long)]
    verbose: bool,

    /// TOML config file; command-line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,

    /// Print the root directory summary as JSON after the run
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            image: self.image.clone(),
            video: self.video.clone(),
            convert: self.convert.clone(),
            thumbnail_width: self.thumb_width,
            thumbnail_height: self.thumb_height,
            scale_width: self.scale_width,
            scale_height: self.scale_height,
            parallelism: self.parallel,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = config::load_config(cli.config.as_deref(), &cli.overrides())?;
    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let (Some(input), Some(output_root)) = (cli.input.as_ref(), cli.output.as_ref()) else {
        return Err("both --input and --output are required".into());
    };

    let token = CancellationToken::new();
    shutdown::install(token.clone())?;

    let encoder = Arc::new(CommandEncoder::new(config.tools.clone()));
    let outcome = pipeline::run(input, output_root, &config, encoder, token)?;

    output::print_run_output(&outcome, output_root);
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
    }
    Ok(())
}

/// `-v` enables debug output; otherwise `RUST_LOG`, defaulting to `info`.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
