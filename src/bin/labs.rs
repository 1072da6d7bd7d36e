//! Command-line front end for the `crypto_labs` primitives.
//!
//! Reports are printed as pretty JSON on stdout.  Diagnostics go to stderr and
//! honour `RUST_LOG` (default `warn`).

use crypto_labs::{
    cipher, estimate_pi, estimate_pi_system, hash_files, hash_str, randomness_report, statistics,
    verify_file, write_sequence_report, LabConfig, Lcg, MAX_SEQUENCE_LEN,
};
use serde::Serialize;
use serde_json::json;
use std::{env, fs, path::PathBuf};
use tracing_subscriber::EnvFilter;

const DEFAULT_COUNT: usize = 200;
const DEFAULT_MAX_ITERATIONS: u64 = 100_000;
const MAX_ITERATIONS_CAP: u64 = 1_000_000_000;
const DEFAULT_PAIRS: usize = 10_000;
const MAX_PAIRS: usize = 50_000;
const DEFAULT_BITS: u32 = 32;
/// Sequence values echoed back by `prng generate`.
const DISPLAY_LIMIT: usize = 1_000;
/// Cesàro checkpoints echoed back per generator.
const HISTORY_SHOWN: usize = 20;

fn fatal(message: &str) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => fatal(&format!("failed to encode report: {err}")),
    }
}

fn print_help() {
    println!("Usage: labs <prng|hash|cipher> ...");
    println!("  prng generate [--count N] [--config FILE] [--export FILE]");
    println!("  prng period [--max N] [--config FILE]");
    println!("  prng cesaro [--pairs N] [--config FILE]");
    println!("  prng randomness [--count N] [--bits W] [--config FILE]");
    println!("  hash text <STRING>");
    println!("  hash file <PATH>...");
    println!("  hash verify <PATH> <DIGEST>");
    println!("  cipher encrypt <IN> <OUT> --password P [--config FILE] [--hex]");
    println!("  cipher decrypt <IN> <OUT> --password P [--config FILE] [--hex]");
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let command = args.next();
    match command.as_deref() {
        Some("prng") => {
            let sub = args.next().unwrap_or_else(|| {
                eprintln!("Usage: labs prng <generate|period|cesaro|randomness> ...");
                std::process::exit(1);
            });
            handle_prng(&sub, args.collect());
        }
        Some("hash") => {
            let sub = args.next().unwrap_or_else(|| {
                eprintln!("Usage: labs hash <text|file|verify> ...");
                std::process::exit(1);
            });
            handle_hash(&sub, args.collect());
        }
        Some("cipher") => {
            let sub = args.next().unwrap_or_else(|| {
                eprintln!("Usage: labs cipher <encrypt|decrypt> ...");
                std::process::exit(1);
            });
            handle_cipher(&sub, args.collect());
        }
        Some("-h") | Some("--help") => print_help(),
        _ => {
            print_help();
            std::process::exit(1);
        }
    }
}

/// Flags shared by the subcommands; each command reads the ones it needs.
#[derive(Default)]
struct Flags {
    config: Option<PathBuf>,
    count: Option<usize>,
    max: Option<u64>,
    pairs: Option<usize>,
    bits: Option<u32>,
    export: Option<PathBuf>,
    password: Option<String>,
    hex: bool,
    positional: Vec<String>,
}

fn parse_flags(tail: Vec<String>) -> Flags {
    let mut flags = Flags::default();
    let mut iter = tail.into_iter();
    while let Some(arg) = iter.next() {
        let mut value = |name: &str| {
            iter.next()
                .unwrap_or_else(|| fatal(&format!("{name} expects a value")))
        };
        match arg.as_str() {
            "--config" => flags.config = Some(PathBuf::from(value("--config"))),
            "--export" => flags.export = Some(PathBuf::from(value("--export"))),
            "--password" => flags.password = Some(value("--password")),
            "--count" => {
                flags.count = Some(
                    value("--count")
                        .parse()
                        .unwrap_or_else(|_| fatal("invalid --count")),
                )
            }
            "--max" => {
                flags.max = Some(
                    value("--max")
                        .parse()
                        .unwrap_or_else(|_| fatal("invalid --max")),
                )
            }
            "--pairs" => {
                flags.pairs = Some(
                    value("--pairs")
                        .parse()
                        .unwrap_or_else(|_| fatal("invalid --pairs")),
                )
            }
            "--bits" => {
                flags.bits = Some(
                    value("--bits")
                        .parse()
                        .unwrap_or_else(|_| fatal("invalid --bits")),
                )
            }
            "--hex" => flags.hex = true,
            other if other.starts_with("--") => fatal(&format!("unknown flag {other}")),
            _ => flags.positional.push(arg),
        }
    }
    flags
}

fn load_config(flags: &Flags) -> LabConfig {
    match &flags.config {
        Some(path) => LabConfig::load(path)
            .unwrap_or_else(|err| fatal(&format!("{}: {err}", path.display()))),
        None => LabConfig::default(),
    }
}

fn new_generator(config: &LabConfig) -> Lcg {
    Lcg::new(config.prng).unwrap_or_else(|err| fatal(&format!("invalid generator: {err}")))
}

fn handle_prng(sub: &str, tail: Vec<String>) {
    let flags = parse_flags(tail);
    let config = load_config(&flags);
    match sub {
        "generate" => cmd_prng_generate(&flags, &config),
        "period" => cmd_prng_period(&flags, &config),
        "cesaro" => cmd_prng_cesaro(&flags, &config),
        "randomness" => cmd_prng_randomness(&flags, &config),
        _ => fatal(&format!("Unknown prng subcommand: {sub}")),
    }
}

fn bounded_count(flags: &Flags, default: usize) -> usize {
    let count = flags.count.unwrap_or(default);
    if count == 0 || count > MAX_SEQUENCE_LEN {
        fatal(&format!("--count must be between 1 and {MAX_SEQUENCE_LEN}"));
    }
    count
}

fn cmd_prng_generate(flags: &Flags, config: &LabConfig) {
    let count = bounded_count(flags, DEFAULT_COUNT);
    let mut lcg = new_generator(config);
    let sequence = lcg
        .generate_sequence(count)
        .unwrap_or_else(|err| fatal(&err.to_string()));
    if let Some(path) = &flags.export {
        write_sequence_report(path, &config.prng, &sequence)
            .unwrap_or_else(|err| fatal(&format!("{}: {err}", path.display())));
    }
    print_json(&json!({
        "parameters": config.prng,
        "count": sequence.len(),
        "sequence": &sequence[..sequence.len().min(DISPLAY_LIMIT)],
        "statistics": statistics(&sequence),
    }));
}

fn cmd_prng_period(flags: &Flags, config: &LabConfig) {
    let max = flags
        .max
        .unwrap_or(DEFAULT_MAX_ITERATIONS)
        .min(MAX_ITERATIONS_CAP);
    let report = new_generator(config)
        .period_report(max)
        .unwrap_or_else(|err| fatal(&err.to_string()));
    print_json(&report);
}

fn cmd_prng_cesaro(flags: &Flags, config: &LabConfig) {
    let pairs = flags.pairs.unwrap_or(DEFAULT_PAIRS).min(MAX_PAIRS);
    let mut lcg = new_generator(config);
    let mut ours = estimate_pi(&mut lcg, pairs).unwrap_or_else(|err| fatal(&err.to_string()));
    let mut system = estimate_pi_system(pairs).unwrap_or_else(|err| fatal(&err.to_string()));
    keep_recent(&mut ours.history, HISTORY_SHOWN);
    keep_recent(&mut system.history, HISTORY_SHOWN);
    print_json(&json!({
        "our_generator": ours,
        "system_generator": system,
        "actual_pi": std::f64::consts::PI,
        "num_pairs": pairs,
    }));
}

/// Drops all but the last `n` entries.
fn keep_recent<T>(history: &mut Vec<T>, n: usize) {
    let start = history.len().saturating_sub(n);
    history.drain(..start);
}

fn cmd_prng_randomness(flags: &Flags, config: &LabConfig) {
    let count = bounded_count(flags, 1_000);
    let bits = flags.bits.unwrap_or(DEFAULT_BITS);
    let sequence = new_generator(config)
        .generate_sequence(count)
        .unwrap_or_else(|err| fatal(&err.to_string()));
    print_json(&json!({
        "parameters": config.prng,
        "count": count,
        "tests": randomness_report(&sequence, bits),
    }));
}

fn handle_hash(sub: &str, tail: Vec<String>) {
    let flags = parse_flags(tail);
    match sub {
        "text" => {
            let text = flags
                .positional
                .first()
                .unwrap_or_else(|| fatal("Usage: labs hash text <STRING>"));
            println!("{}", hash_str(text));
        }
        "file" => {
            if flags.positional.is_empty() {
                fatal("Usage: labs hash file <PATH>...");
            }
            let mut failed = false;
            for (path, result) in flags.positional.iter().zip(hash_files(&flags.positional)) {
                match result {
                    Ok(digest) => println!("{digest}  {path}"),
                    Err(err) => {
                        eprintln!("{path}: {err}");
                        failed = true;
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }
        "verify" => {
            let [path, expected] = flags.positional.as_slice() else {
                fatal("Usage: labs hash verify <PATH> <DIGEST>");
            };
            let outcome =
                verify_file(path, expected).unwrap_or_else(|err| fatal(&format!("{path}: {err}")));
            print_json(&outcome);
            if !outcome.matches {
                std::process::exit(2);
            }
        }
        _ => fatal(&format!("Unknown hash subcommand: {sub}")),
    }
}

fn handle_cipher(sub: &str, tail: Vec<String>) {
    let flags = parse_flags(tail);
    let config = load_config(&flags);
    let [input, output] = flags.positional.as_slice() else {
        fatal("Usage: labs cipher <encrypt|decrypt> <IN> <OUT> --password P");
    };
    let password = flags
        .password
        .as_deref()
        .unwrap_or_else(|| fatal("--password is required"));
    if password.is_empty() {
        fatal("--password must not be empty");
    }
    let data = fs::read(input).unwrap_or_else(|err| fatal(&format!("{input}: {err}")));
    let result = match sub {
        "encrypt" => cipher::encrypt(&data, password, &config.cipher, &config.prng).map(|payload| {
            if flags.hex {
                hex::encode_upper(payload).into_bytes()
            } else {
                payload
            }
        }),
        "decrypt" => {
            let payload = if flags.hex {
                let text = String::from_utf8_lossy(&data);
                hex::decode(text.trim()).unwrap_or_else(|err| fatal(&format!("{input}: {err}")))
            } else {
                data
            };
            cipher::decrypt(&payload, password, &config.cipher)
        }
        _ => fatal(&format!("Unknown cipher subcommand: {sub}")),
    };
    let bytes = result.unwrap_or_else(|err| fatal(&err.to_string()));
    fs::write(output, &bytes).unwrap_or_else(|err| fatal(&format!("{output}: {err}")));
    print_json(&json!({
        "operation": sub,
        "input": input,
        "output": output,
        "bytes_written": bytes.len(),
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keep_recent_trims_front() {
        let mut history: Vec<u32> = (0..30).collect();
        keep_recent(&mut history, HISTORY_SHOWN);
        assert_eq!(history, (10..30).collect::<Vec<_>>());

        let mut short = vec![1.0, 2.0];
        keep_recent(&mut short, HISTORY_SHOWN);
        assert_eq!(short, vec![1.0, 2.0]);
    }

    #[test]
    fn test_cesaro_histories_trimmed_alike() {
        let config = LabConfig::default();
        let mut ours = estimate_pi(&mut new_generator(&config), MAX_PAIRS).unwrap();
        let mut system = estimate_pi_system(MAX_PAIRS).unwrap();
        keep_recent(&mut ours.history, HISTORY_SHOWN);
        keep_recent(&mut system.history, HISTORY_SHOWN);
        assert_eq!(ours.history.len(), HISTORY_SHOWN);
        assert_eq!(system.history.len(), HISTORY_SHOWN);
    }
}
