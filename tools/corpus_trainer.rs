/// Corpus Trainer — trains a Markov name model from a word list.
///
/// Usage: corpus_trainer --input <words.txt> --output <model.ron> [--name <display name>]
use std::env;
use std::path::Path;
use std::process;

use flavor_generator::core::markov::{self, MarkovTrainer};

const USAGE: &str =
    "Usage: corpus_trainer --input <words.txt> --output <model.ron> [--name <display name>]";

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();

    let mut input = None;
    let mut output = None;
    let mut name = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--input" if i + 1 < args.len() => {
                i += 1;
                input = Some(args[i].clone());
            }
            "--output" if i + 1 < args.len() => {
                i += 1;
                output = Some(args[i].clone());
            }
            "--name" if i + 1 < args.len() => {
                i += 1;
                name = Some(args[i].clone());
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                eprintln!("{}", USAGE);
                process::exit(1);
            }
        }
        i += 1;
    }

    let input_path = input.unwrap_or_else(|| {
        eprintln!("Error: --input is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    let output_path = output.unwrap_or_else(|| {
        eprintln!("Error: --output is required");
        eprintln!("{}", USAGE);
        process::exit(1);
    });

    // Default display name is the input file stem.
    let name = name.unwrap_or_else(|| {
        Path::new(&input_path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unnamed")
            .to_string()
    });

    let text = std::fs::read_to_string(&input_path).unwrap_or_else(|e| {
        eprintln!("Error reading input file '{}': {}", input_path, e);
        process::exit(1);
    });

    log::info!("training '{}' from '{}'", name, input_path);
    let model = MarkovTrainer::train_from_text(&name, &text).unwrap_or_else(|e| {
        eprintln!("Error training model: {}", e);
        process::exit(1);
    });

    let transition_count: usize = model.first_order().values().map(|t| t.len()).sum();
    println!(
        "Model trained: {} words, lengths {}..={}, {} first-order states ({} transitions), {} second-order states",
        model.word_lengths().total_weight(),
        model.min_length(),
        model.max_length(),
        model.first_order().len(),
        transition_count,
        model.second_order().len()
    );

    markov::save_model(&model, Path::new(&output_path)).unwrap_or_else(|e| {
        eprintln!("Error saving model to '{}': {}", output_path, e);
        process::exit(1);
    });

    println!("Model saved to '{}'", output_path);
}
