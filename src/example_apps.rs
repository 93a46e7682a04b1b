use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, error::ErrorKind};
use serde_json::{Value, json};

use crate::config::ProviderConfig;
use crate::metrics::selection_skew;
use crate::source::InMemoryDataset;
use crate::superset::DataSuperset;
use crate::types::{Record, SourceId, Spec, SpecKey};
use crate::{DataProvider, ProviderError};

/// Record field naming the leaf dataset a demo record came from.
const ORIGIN_KEY: &str = "origin";
/// Record field carrying the demo payload.
const INPUT_KEY: &str = "input";

#[derive(Debug, Parser)]
#[command(
    name = "mixture_demo",
    disable_help_subcommand = true,
    about = "Draw samples from a nested weighted mixture",
    long_about = "Build a two-level mixture of in-memory datasets, draw samples, and report how draws spread across leaves.",
    after_help = "Set RUST_LOG=dataprovider=debug to watch out-of-range redraws."
)]
/// CLI for `mixture_demo`.
struct MixtureDemoCli {
    #[arg(
        long,
        default_value_t = 10_000,
        value_parser = parse_positive_usize,
        help = "Number of samples to draw"
    )]
    draws: usize,
    #[arg(long, help = "Optional deterministic seed")]
    seed: Option<u64>,
    #[arg(
        long,
        value_name = "A,B",
        value_delimiter = ',',
        default_value = "0.8,0.2",
        help = "Top-level weights for domain_a and domain_b"
    )]
    weights: Vec<f64>,
    #[arg(long = "max-attempts", help = "Fail a draw after this many out-of-range retries")]
    max_attempts: Option<usize>,
    #[arg(
        long,
        value_name = "PATH",
        conflicts_with_all = ["seed", "max_attempts"],
        help = "Load provider config from a JSON file instead of flags"
    )]
    config: Option<PathBuf>,
}

/// Run the nested mixture demo with CLI-style `args_iter`.
pub fn run_mixture_demo<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();

    let Some(cli) = parse_cli::<MixtureDemoCli, _>(
        std::iter::once("mixture_demo".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = match &cli.config {
        Some(path) => ProviderConfig::from_json_path(path)?,
        None => ProviderConfig {
            seed: cli.seed,
            max_attempts: cli.max_attempts,
        },
    };
    let provider = build_mixture(&config, &cli.weights)?;
    println!("{provider}");

    let mut counts: HashMap<SourceId, usize> = HashMap::new();
    let mut redraws = 0usize;
    for _ in 0..cli.draws {
        let provided = provider.sample_detailed()?;
        redraws += provided.attempts - 1;
        let origin = provided
            .sample
            .get(ORIGIN_KEY)
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        *counts.entry(origin).or_default() += 1;
    }

    let Some(skew) = selection_skew(&counts) else {
        println!("No samples drawn.");
        return Ok(());
    };
    println!(
        "Drew {} samples from {} leaves ({} out-of-range redraws)",
        skew.draws, skew.sources, redraws
    );
    for entry in &skew.per_source {
        println!(
            "  {:<12} {:>7} draws  {:>6.2}%",
            entry.source,
            entry.count,
            entry.share * 100.0
        );
    }
    println!("  max/min ratio: {:.2}", skew.ratio);
    Ok(())
}

/// Build the demo mixture: `domain_a` (three leaves, one empty) and `domain_b`.
pub fn build_mixture(
    config: &ProviderConfig,
    weights: &[f64],
) -> Result<DataProvider<Record<Value>>, ProviderError> {
    let mut domain_a: DataSuperset<Record<Value>> = DataSuperset::with_config("domain_a", config);
    domain_a.add_source(leaf("a_street", 600, config))?;
    domain_a.add_source(leaf("a_indoor", 300, config))?;
    // Registered with a size but no records, so every draw is out of range.
    domain_a.add_source(
        InMemoryDataset::<Value>::with_config("a_pending", Vec::new(), config)
            .with_keys([INPUT_KEY, ORIGIN_KEY]),
    )?;
    domain_a.set_weights(Some(&[0.45, 0.45, 0.1][..]))?;

    let mut domain_b: DataSuperset<Record<Value>> = DataSuperset::with_config("domain_b", config);
    domain_b.add_source(leaf("b_synthetic", 100, config))?;

    let mut provider = DataProvider::with_config(config.clone())?;
    provider.add_source(domain_a)?;
    provider.add_source(domain_b)?;
    provider.set_weights(Some(weights))?;

    let spec: Spec = [
        (INPUT_KEY.to_string(), json!([3, 64, 64])),
        (ORIGIN_KEY.to_string(), Value::Null),
    ]
    .into_iter()
    .collect();
    provider.set_spec(&spec)?;
    provider.set_keys_of_interest([INPUT_KEY])?;
    provider.set_augment(Some(Box::new(half_resolution)));
    Ok(provider)
}

fn leaf(id: &str, count: usize, config: &ProviderConfig) -> InMemoryDataset<Value> {
    let records = (0..count)
        .map(|idx| {
            let mut record = Record::new();
            record.insert(INPUT_KEY.to_string(), json!(idx));
            record.insert(ORIGIN_KEY.to_string(), json!(id));
            record
        })
        .collect();
    InMemoryDataset::with_config(id, records, config)
}

/// Halve the spatial dims of every key of interest.
fn half_resolution(mut spec: Spec, keys: &[SpecKey]) -> Result<Spec, ProviderError> {
    for key in keys {
        let Some(Value::Array(dims)) = spec.get_mut(key) else {
            continue;
        };
        for dim in dims.iter_mut().skip(1) {
            let size = dim
                .as_u64()
                .ok_or_else(|| ProviderError::Augment(format!("'{key}' has a non-integer dim")))?;
            *dim = json!((size / 2).max(1));
        }
    }
    Ok(spec)
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}
