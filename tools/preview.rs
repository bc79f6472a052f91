/// Preview — interactive generation shell for testing name and table generators.
///
/// Usage: preview --data <dir> [--manifest <file.ron>] [--seed <n>]
///
/// Commands:
///   list                     — list loaded generators
///   name <generator> [1|2]   — generate a name (first or second order)
///   gen <generator>          — generate text from a table generator
///   regen <generator> <key>  — re-roll one placeholder of the last result
///   seed <n>                 — set RNG seed
///   bulk <generator> <n>     — generate n results with variety stats
///   help                     — list commands
///   quit                     — exit

use flavor_generator::core::markov::MarkovOrder;
use flavor_generator::core::pipeline::FlavorEngine;
use std::collections::{HashMap, HashSet};
use std::io::{self, BufRead, Write};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let mut data_dir = None;
    let mut manifest = None;
    let mut seed: u64 = 42;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--data" if i + 1 < args.len() => {
                i += 1;
                data_dir = Some(args[i].clone());
            }
            "--manifest" if i + 1 < args.len() => {
                i += 1;
                manifest = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = args[i].parse().unwrap_or(42);
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let mut builder = FlavorEngine::builder().seed(seed);
    if let Some(ref dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    if let Some(ref path) = manifest {
        builder = builder.manifest(path);
    }
    let mut engine = match builder.build() {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    println!(
        "Loaded {} name generators, {} table generators",
        engine.name_generators().len(),
        engine.template_generators().len()
    );
    println!("Seed: {}", seed);
    println!("Type 'help' for commands.\n");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("preview> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts[0].to_lowercase();

        match cmd.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                break;
            }
            "help" | "h" | "?" => {
                print_help();
            }
            "list" | "ls" => {
                println!("Name generators:");
                for name in engine.name_generators() {
                    println!("  {}", name);
                }
                println!("Table generators:");
                for name in engine.template_generators() {
                    let keys = engine
                        .template_generator(name)
                        .map(|g| g.placeholder_names().join(", "))
                        .unwrap_or_default();
                    println!("  {} [{}]", name, keys);
                }
            }
            "name" => {
                if parts.len() < 2 {
                    println!("Usage: name <generator> [1|2]");
                    continue;
                }
                let order = match parts.get(2).copied() {
                    None | Some("2") => MarkovOrder::Second,
                    Some("1") => MarkovOrder::First,
                    Some(other) => {
                        println!("Unknown order: {} (use 1 or 2)", other);
                        continue;
                    }
                };
                match engine.generate_name(parts[1], order) {
                    Ok(name) if name.is_empty() => println!("(no name produced, try again)"),
                    Ok(name) => println!("{}", name),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "gen" => {
                if parts.len() < 2 {
                    println!("Usage: gen <generator>");
                    continue;
                }
                match engine.generate(parts[1]) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "regen" => {
                if parts.len() < 3 {
                    println!("Usage: regen <generator> <key>");
                    continue;
                }
                match engine.regenerate(parts[1], parts[2]) {
                    Ok(text) => println!("{}", text),
                    Err(e) => println!("ERROR: {}", e),
                }
            }
            "seed" => {
                if parts.len() < 2 {
                    println!("Current seed: {}", engine.seed());
                    continue;
                }
                match parts[1].parse::<u64>() {
                    Ok(s) => {
                        engine.reseed(s);
                        println!("Seed set to {}", s);
                    }
                    Err(_) => {
                        println!("Invalid seed: {}", parts[1]);
                    }
                }
            }
            "bulk" => {
                if parts.len() < 3 {
                    println!("Usage: bulk <generator> <n>");
                    continue;
                }
                let count: usize = match parts[2].parse() {
                    Ok(n) if n > 0 => n,
                    _ => {
                        println!("Invalid count: {}", parts[2]);
                        continue;
                    }
                };
                bulk(&mut engine, parts[1], count);
            }
            _ => {
                println!("Unknown command: '{}'. Type 'help' for available commands.", cmd);
            }
        }
    }
}

/// Generate `count` results from a name or table generator and print variety statistics.
fn bulk(engine: &mut FlavorEngine, generator: &str, count: usize) {
    let is_names = engine.markov_model(generator).is_some();
    let mut results = Vec::with_capacity(count);
    let mut empty = 0;

    for _ in 0..count {
        let result = if is_names {
            engine.generate_name(generator, MarkovOrder::Second)
        } else {
            engine.generate(generator)
        };
        match result {
            Ok(text) if text.is_empty() => empty += 1,
            Ok(text) => results.push(text),
            Err(e) => {
                println!("ERROR: {}", e);
                return;
            }
        }
    }

    println!(
        "\n=== Bulk Generation: {} results ({} empty) ===\n",
        results.len(),
        empty
    );

    let unique: HashSet<&String> = results.iter().collect();
    println!("Unique: {} / {}", unique.len(), results.len());

    let avg_len: f64 = if results.is_empty() {
        0.0
    } else {
        results.iter().map(|r| r.chars().count() as f64).sum::<f64>() / results.len() as f64
    };
    println!("Average length: {:.1} chars", avg_len);

    let mut counts: HashMap<&String, u32> = HashMap::new();
    for r in &results {
        *counts.entry(r).or_insert(0) += 1;
    }
    let mut freq: Vec<(&String, u32)> = counts.into_iter().collect();
    freq.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    println!("\nMost frequent:");
    for (text, n) in freq.iter().take(10) {
        println!("  {}: {}", text, n);
    }
    println!();
}

fn print_usage() {
    println!("Preview — interactive generation shell for name and table generators.");
    println!();
    println!("Usage: preview --data <dir> [--manifest <file.ron>] [--seed <n>]");
    println!();
    println!("  --data <dir>          Data directory (names/ and tables/ sub-directories)");
    println!("  --manifest <file>     Manifest listing the generators to load (optional)");
    println!("  --seed <n>            Initial RNG seed (default: 42)");
}

fn print_help() {
    println!("Commands:");
    println!("  list                     List loaded generators and their placeholders");
    println!("  name <generator> [1|2]   Generate a name (Markov order, default 2)");
    println!("  gen <generator>          Generate text from a table generator");
    println!("  regen <generator> <key>  Re-roll one placeholder of the last result");
    println!("  seed <n>                 Set RNG seed");
    println!("  bulk <generator> <n>     Generate n results with variety statistics");
    println!("  help                     Show this help");
    println!("  quit                     Exit");
}
