//! `plens` - CLI for privacylens
//!
//! This binary drives the temporal redaction engine over decoded video
//! frames and produces the track-review manifest that feeds curation.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use privacylens::cli::{Cli, Command, ConfigCommand, RedactCommand, TracksCommand};
use privacylens::redact::{RedactionEngine, RedactionPolicy, Renderer};
use privacylens::review::TrackReview;
use privacylens::source::{ImageDirSink, ManifestSource};
use privacylens::{init_logging, Config, Error, OverlayConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command
    match cli.command {
        Command::Redact(redact_cmd) => handle_redact(&config, redact_cmd),
        Command::Tracks(tracks_cmd) => handle_tracks(&config, tracks_cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

/// Resolve the activation policy: CLI overrides beat the configured one.
fn resolve_policy(config: &Config, cmd: &RedactCommand) -> Result<RedactionPolicy, Error> {
    if let Some(threshold) = cmd.threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config_validation(format!(
                "threshold ({threshold}) must be within [0, 1]"
            )));
        }
        return Ok(RedactionPolicy::confidence(threshold));
    }
    if !cmd.track_id.is_empty() {
        return Ok(RedactionPolicy::curated(cmd.track_id.iter().copied()));
    }
    Ok(config.redaction.policy())
}

fn handle_redact(config: &Config, cmd: RedactCommand) -> Result<(), Box<dyn std::error::Error>> {
    let policy = resolve_policy(config, &cmd)?;

    let overlay = if cmd.overlay {
        OverlayConfig {
            enabled: true,
            font_path: config.overlay.font_path.clone(),
        }
    } else {
        config.overlay.clone()
    };

    let renderer = Renderer::new(&config.blur, &overlay)?;
    let mut source = ManifestSource::open(&cmd.detections, &cmd.frames)?;
    let mut sink = ImageDirSink::create(&cmd.output)?;

    println!("Redacting with {} policy...", policy.name());
    let engine = RedactionEngine::new(policy, config.redaction.buffer_frames, renderer);
    let stats = engine.run(&mut source, &mut sink)?;

    println!();
    println!("Redaction complete");
    println!("------------------");
    println!("Frames processed:   {}", stats.frames_processed);
    println!("Frames written:     {}", stats.frames_emitted);
    println!("Tracks activated:   {}", stats.tracks_activated);
    println!("Regions blurred:    {}", stats.regions_blurred);
    if source.dropped_detections() > 0 {
        println!(
            "Detections dropped: {} (no track ID)",
            source.dropped_detections()
        );
    }
    println!("Output:             {}", cmd.output.display());
    Ok(())
}

fn handle_tracks(config: &Config, cmd: TracksCommand) -> Result<(), Box<dyn std::error::Error>> {
    let fps = cmd.fps.unwrap_or(config.review.fps);
    if fps <= 0.0 {
        return Err(Error::config_validation(format!("fps ({fps}) must be greater than 0")).into());
    }

    let mut review = TrackReview::new(fps);
    if let Some(crops) = &cmd.crops {
        review = review.with_crops_dir(crops)?;
    }

    let mut source = ManifestSource::open(&cmd.detections, &cmd.frames)?;
    review.consume(&mut source)?;
    let manifest = review.build();

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    } else {
        println!("Distinct tracks");
        println!("---------------");
        println!(
            "{:>8}  {:<16} {:>12}  {:>12}  {:>10}",
            "ID", "Class", "First frame", "First seen", "Best conf"
        );
        for track in &manifest.tracks {
            println!(
                "{:>8}  {:<16} {:>12}  {:>11.2}s  {:>10.3}",
                track.track_id,
                track.class_label,
                track.first_seen_frame,
                track.first_seen_timestamp,
                track.best_confidence
            );
        }
        println!();
        println!("{} track(s)", manifest.tracks.len());
        if let Some(crops) = &cmd.crops {
            println!("Thumbnails: {}", crops.display());
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Redaction]");
                println!("  Mode:               {}", config.redaction.mode);
                println!(
                    "  Threshold:          {}",
                    config.redaction.confidence_threshold
                );
                println!(
                    "  Curated IDs:        {}",
                    config.redaction.curated_ids.len()
                );
                println!("  Buffer frames:      {}", config.redaction.buffer_frames);
                println!();
                println!("[Blur]");
                println!("  Kernel size:        {}", config.blur.kernel_size);
                println!("  Sigma:              {}", config.blur.sigma);
                println!();
                println!("[Overlay]");
                println!("  Enabled:            {}", config.overlay.enabled);
                match &config.overlay.font_path {
                    Some(path) => println!("  Font:               {}", path.display()),
                    None => println!("  Font:               (none)"),
                }
                println!();
                println!("[Review]");
                println!("  FPS:                {}", config.review.fps);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
