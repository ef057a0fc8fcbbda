// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use seqgen::corpus::CorpusLoader;
use seqgen::{Pipeline, PipelineConfig};
use tracing::Level;

fn print_usage() {
    println!("SEQGEN - MIDI corpus sequence generator");
    println!();
    println!("Usage:");
    println!("  seqgen generate [OPTIONS] <FILES>...   Learn from MIDI files and write a new one");
    println!("  seqgen resume [OPTIONS]                Same, using the cached corpus");
    println!("  seqgen tokens <FILES>...               Print the tokens of each file");
    println!();
    println!("Options:");
    println!("  --config <FILE>    YAML or TOML configuration");
    println!("  --output <FILE>    Output MIDI file (default output.mid)");
    println!("  --length <N>       Tokens to generate");
    println!("  --seed <N>         Seed for reproducible output");
    println!("  --verbose          Debug logging");
    println!("  --help             Show this help message");
}

/// Parsed command line
#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    output: Option<PathBuf>,
    length: Option<usize>,
    seed: Option<u64>,
    verbose: bool,
    help: bool,
    files: Vec<PathBuf>,
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args> {
    let mut args = Args::default();
    while let Some(arg) = raw.next() {
        let mut value = |name: &str| {
            raw.next()
                .ok_or_else(|| anyhow!("{} requires a value", name))
        };
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value("--config")?)),
            "--output" => args.output = Some(PathBuf::from(value("--output")?)),
            "--length" => {
                let v = value("--length")?;
                args.length = Some(v.parse().map_err(|_| anyhow!("Invalid length: {}", v))?);
            }
            "--seed" => {
                let v = value("--seed")?;
                args.seed = Some(v.parse().map_err(|_| anyhow!("Invalid seed: {}", v))?);
            }
            "--verbose" | "-v" => args.verbose = true,
            "--help" | "-h" => args.help = true,
            flag if flag.starts_with("--") => bail!("Unknown option: {}", flag),
            other => args.files.push(PathBuf::from(other)),
        }
    }
    Ok(args)
}

fn load_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(length) = args.length {
        config.generation.length = length;
    }
    if args.seed.is_some() {
        config.generation.seed = args.seed;
    }
    config.validate()?;
    Ok(config)
}

fn run_pipeline(args: &Args, resume: bool) -> Result<()> {
    let config = load_config(args)?;
    let length = config.generation.length;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from("output.mid"));

    let mut pipeline = Pipeline::with_markov(config);

    if resume {
        let added = pipeline.resume().context("Failed to restore cached corpus")?;
        println!("Restored {} tokens from cache", added);
    } else {
        if args.files.is_empty() {
            bail!("generate requires at least one MIDI file");
        }
        let report = pipeline.load_files(&args.files)?;
        for failure in report.failures() {
            eprintln!("Skipped {}", failure);
        }
        println!(
            "Loaded {} tokens from {} of {} files",
            report.tokens_added(),
            report.loaded_count(),
            report.files.len()
        );
    }

    let windows = pipeline.prepare().context("Sequence preparation failed")?.len();
    println!("Prepared {} sequences", windows);

    pipeline.train().context("Model training failed")?;
    println!("Model trained");

    let generated = pipeline.generate(length)?.len();
    println!("Generated {} tokens", generated);

    pipeline.save_midi(&output)?;
    println!("Saved {}", output.display());
    Ok(())
}

fn print_tokens(args: &Args) -> Result<()> {
    if args.files.is_empty() {
        bail!("tokens requires at least one MIDI file");
    }
    let config = load_config(args)?;
    let loader = CorpusLoader::new(config.corpus.loader_options());

    let mut failed = 0;
    for path in &args.files {
        match loader.tokenize_file(path) {
            Ok(tokens) => {
                let keys: Vec<String> = tokens.iter().map(|t| t.key()).collect();
                println!("{} ({} tokens)", path.display(), keys.len());
                println!("  {}", keys.join(" "));
            }
            Err(err) => {
                failed += 1;
                eprintln!("Skipped {}", err);
            }
        }
    }
    println!(
        "{} of {} files parsed",
        args.files.len() - failed,
        args.files.len()
    );
    Ok(())
}

fn main() -> Result<()> {
    let mut raw = env::args().skip(1);
    let command = match raw.next() {
        Some(command) => command,
        None => {
            println!("SEQGEN - MIDI corpus sequence generator");
            println!("Run with --help for usage information");
            return Ok(());
        }
    };

    if command == "--help" || command == "-h" {
        print_usage();
        return Ok(());
    }

    let args = parse_args(raw)?;
    if args.help {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match command.as_str() {
        "generate" => run_pipeline(&args, false),
        "resume" => run_pipeline(&args, true),
        "tokens" => print_tokens(&args),
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            std::process::exit(1);
        }
    }
}
