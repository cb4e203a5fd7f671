mod cli;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use rp_av::{discover_runtime, probe_media, ToolRegistry};
use rp_core::config::Config;
use rp_core::{QualityTier, SourceVideo};
use rp_media::FormatNegotiator;
use rp_pipeline::{CompressionOptions, CompressionResult, ProgressSender, TieredStrategy};
use tokio_util::sync::CancellationToken;

const MIB: f64 = 1024.0 * 1024.0;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "reelpress=trace,rp_core=trace,rp_media=trace,rp_av=trace,rp_pipeline=trace".to_string()
        } else {
            "reelpress=debug,rp_core=debug,rp_media=debug,rp_av=debug,rp_pipeline=debug".to_string()
        }
    });

    // Logs go to stderr so `--json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load_or_default(cli.config.as_deref());

    match cli.command {
        Commands::Compress {
            input,
            output_dir,
            target_mb,
            quality,
            json,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(compress_file(
                &config,
                &input,
                output_dir,
                target_mb,
                quality,
                json,
            ))
        }
        Commands::Probe { file, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(probe_file(&config, &file, json))
        }
        Commands::CheckTools => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_tools(&config))
        }
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
    }
}

async fn compress_file(
    config: &Config,
    input: &Path,
    output_dir: Option<PathBuf>,
    target_mb: Option<f64>,
    quality: Option<QualityTier>,
    json: bool,
) -> Result<()> {
    if !input.exists() {
        anyhow::bail!("Input file does not exist: {:?}", input);
    }

    let mut options = CompressionOptions::from_config(&config.compression);
    if let Some(mb) = target_mb {
        if !mb.is_finite() || mb < 0.0 {
            anyhow::bail!("--target-mb must be a non-negative number, got {mb}");
        }
        options.target_size_bytes = (mb * MIB) as u64;
    }
    if let Some(quality) = quality {
        options.quality_tier = quality;
    }

    let token = CancellationToken::new();
    let options = options
        .with_cancellation(token.clone())
        .with_progress(ProgressSender::new(move |pct, step| {
            if !json {
                eprint!("\r[{step:>11}] {pct:5.1}%");
            }
        }));

    let data = tokio::fs::read(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let source = SourceVideo::new(name, data);
    let stem = source.stem().to_string();

    tracing::info!(
        "Compressing {} ({} bytes, target {} bytes, quality {})",
        input.display(),
        source.byte_size(),
        options.target_size_bytes,
        options.quality_tier
    );

    let runtime = discover_runtime(&config.tools).await;
    let strategy = TieredStrategy::new(runtime);

    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; cancelling compression");
            token.cancel();
        }
    });
    let outcome = strategy.compress(source, &options).await;
    interrupt.abort();
    if !json {
        eprintln!();
    }
    let result = outcome?;

    let out_dir = match output_dir {
        Some(dir) => dir,
        None => input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    };
    tokio::fs::create_dir_all(&out_dir)
        .await
        .with_context(|| format!("failed to create {}", out_dir.display()))?;

    let output_path = out_dir.join(&result.file_name);
    if same_file(&output_path, input) {
        tracing::info!("Input already within target; left in place");
    } else {
        tokio::fs::write(&output_path, &result.data)
            .await
            .with_context(|| format!("failed to write {}", output_path.display()))?;
    }

    let thumbnail_path = match &result.thumbnail {
        Some(jpeg) => {
            let path = out_dir.join(format!("{stem}_thumbnail.jpg"));
            tokio::fs::write(&path, jpeg)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            Some(path)
        }
        None => None,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result.report())?);
    } else {
        print_summary(&result, &output_path, thumbnail_path.as_deref());
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn print_summary(result: &CompressionResult, output: &Path, thumbnail: Option<&Path>) {
    println!("Tier: {} (quality score {})", result.tier, result.quality_score);
    println!("Output: {}", output.display());
    println!("Type: {}", result.mime_type);
    println!(
        "Size: {} -> {} bytes ({:.2}x)",
        result.original_size, result.compressed_size, result.compression_ratio
    );
    if let Some(stats) = &result.encoding {
        println!(
            "Video: {}x{} @ {} fps, {} frames",
            stats.width, stats.height, stats.frame_rate, stats.frames
        );
    }
    println!(
        "Audio preserved: {}",
        if result.audio_preserved { "yes" } else { "no" }
    );
    match thumbnail {
        Some(path) => println!("Thumbnail: {}", path.display()),
        None => println!("Thumbnail: none"),
    }
    println!("Time: {:.2}s", result.processing_time.as_secs_f64());
}

async fn probe_file(config: &Config, file: &Path, json: bool) -> Result<()> {
    if !file.exists() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let registry = ToolRegistry::discover(&config.tools);
    let ffprobe = registry.require("ffprobe")?;
    let probed = probe_media(&ffprobe.path, file, registry.timeout()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&probed)?);
        return Ok(());
    }

    println!("File: {}", file.display());
    println!("Container: {}", probed.format_name);
    if let Some(size) = probed.size_bytes {
        println!("Size: {} bytes", size);
    }
    if let Some(secs) = probed.duration_secs {
        let whole = secs as u64;
        println!(
            "Duration: {:02}:{:02}:{:02}",
            whole / 3600,
            (whole / 60) % 60,
            whole % 60
        );
    }
    match &probed.video {
        Some(video) => {
            print!("Video: {} {}x{}", video.codec, video.width, video.height);
            if let Some(fps) = video.frame_rate {
                print!(" @ {:.3} fps", fps);
            }
            println!();
        }
        None => println!("Video: none"),
    }
    println!("Audio streams: {}", probed.audio_streams);

    Ok(())
}

async fn check_tools(config: &Config) -> Result<()> {
    println!("Checking external tools...\n");

    let registry = ToolRegistry::discover(&config.tools);
    let mut all_ok = true;

    for tool in registry.check_all() {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);
        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }
        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }
        println!();
    }

    let runtime = discover_runtime(&config.tools).await;
    let recorder = runtime.capabilities.recorder_available();
    let mime = FormatNegotiator::default().select(runtime.capabilities.as_ref());
    println!();
    println!("Recorder available: {}", if recorder { "yes" } else { "no" });
    println!("Negotiated output type: {}", mime);

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable compression.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let contents = std::fs::read_to_string(p)
                .with_context(|| format!("failed to read {}", p.display()))?;
            let config = Config::from_json(&contents)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            Config::default()
        }
    };

    let c = &config.compression;
    println!(
        "  Target size: {} bytes ({:.1} MiB)",
        c.target_size_bytes,
        c.target_size_bytes as f64 / MIB
    );
    println!("  Quality tier: {}", c.quality_tier);
    println!("  Preserve audio: {}", c.preserve_audio);
    println!(
        "  Thumbnail: {}x{} at {}s (JPEG quality {})",
        c.thumbnail_width, c.thumbnail_height, c.thumbnail_at_secs, c.thumbnail_jpeg_quality
    );
    println!("  Tool timeout: {}s", config.tools.timeout_secs);

    let warnings = config.validate();
    if !warnings.is_empty() {
        println!("\nWarnings:");
        for w in &warnings {
            println!("  - {w}");
        }
    }

    Ok(())
}
