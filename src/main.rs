// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;

use anyhow::{anyhow, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tapcompose::config::{validate_config, ComposerConfig};
use tapcompose::score::Voices;
use tapcompose::sequencer::Scheduler;
use tapcompose::timing::TokioClock;

fn print_usage() {
    println!("TapCompose - suggest and play melodies over chord progressions");
    println!();
    println!("Usage: tapcompose [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <FILE>     Load settings from a YAML or TOML file");
    println!("  --validate <FILE>   Check a config file and exit");
    println!("  --bars <N>          Accept suggestions until N bars are accepted (default 4)");
    println!("  --seed <N>          Seed the suggesters");
    println!("  --play              Perform the score after composing (Ctrl+C stops)");
    println!("  --help              Show this help message");
}

struct Options {
    config: Option<String>,
    bars: usize,
    seed: Option<u64>,
    play: bool,
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("{} requires a value", flag))
}

/// Parse the command line. `None` means the program should exit.
fn parse_args(args: &[String]) -> Result<Option<Options>> {
    let mut options = Options {
        config: None,
        bars: 4,
        seed: None,
        play: false,
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                options.config = Some(value(args, i, "--config")?.to_string());
                i += 1;
            }
            "--validate" => {
                let path = value(args, i, "--validate")?;
                validate_config(path)?;
                println!("{} is valid", path);
                return Ok(None);
            }
            "--bars" => {
                let raw = value(args, i, "--bars")?;
                options.bars = raw
                    .parse()
                    .map_err(|_| anyhow!("Invalid bar count: {}", raw))?;
                i += 1;
            }
            "--seed" => {
                let raw = value(args, i, "--seed")?;
                options.seed = Some(raw.parse().map_err(|_| anyhow!("Invalid seed: {}", raw))?);
                i += 1;
            }
            "--play" => options.play = true,
            "--help" | "-h" => {
                print_usage();
                return Ok(None);
            }
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }
    Ok(Some(options))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    let Some(options) = parse_args(&args)? else {
        return Ok(());
    };

    let mut config = match &options.config {
        Some(path) => ComposerConfig::load(path)?,
        None => ComposerConfig::default(),
    };
    if options.seed.is_some() {
        config.seed = options.seed;
    }

    let scheduler = Scheduler::with_clock(config.timing(), TokioClock::new());
    let mut composer = config.build_composer(scheduler, config.voice_manager())?;
    composer.pause();

    while composer.accepted_bars() < options.bars {
        composer.accept();
        composer.pause();
    }
    info!(
        bars = composer.accepted_bars(),
        tempo = config.tempo,
        "Composed score"
    );

    let score = composer.score();
    let chords: Vec<&str> = score.chords.iter().map(|c| c.name.as_str()).collect();
    println!("Chords: {}", chords.join(" "));
    let voices = Voices::from_note_group(&score.notes);
    for (measure, bar) in voices
        .to_proper_strings(config.beats_per_bar)
        .iter()
        .enumerate()
    {
        println!("  {:>3}: {}", measure + 1, bar.join("  "));
    }
    println!("{}", composer.serialize()?);

    if options.play {
        info!("Playing, press Ctrl+C to stop");
        composer.restart();
        let fired = composer
            .run_until(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await;
        info!(fired, "Playback finished");
    }

    Ok(())
}
