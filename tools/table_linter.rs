/// Table Linter — validates table generator definitions.
///
/// Usage: table_linter <definition.ron | dir> [--min-rows <n>]

use flavor_generator::core::table::TableIssue;
use flavor_generator::core::template::TemplateGenerator;
use std::path::Path;
use std::process;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: table_linter <definition.ron | dir> [--min-rows <n>]");
        process::exit(0);
    }

    let target = Path::new(&args[1]);
    let mut min_rows = 2usize;

    let mut i = 2;
    while i < args.len() {
        if args[i] == "--min-rows" && i + 1 < args.len() {
            i += 1;
            min_rows = args[i].parse().unwrap_or_else(|_| {
                eprintln!("Error: --min-rows must be a number");
                process::exit(1);
            });
        }
        i += 1;
    }

    let mut generators = Vec::new();
    if target.is_file() {
        load_generator(target, &mut generators);
    } else if target.is_dir() {
        load_generators_recursive(target, &mut generators);
    } else {
        eprintln!("ERROR: Path '{}' does not exist", target.display());
        process::exit(1);
    }

    println!("Loaded {} table generators", generators.len());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for generator in &generators {
        let (e, w) = lint_generator(generator, min_rows);
        errors.extend(e);
        warnings.extend(w);
    }

    println!("\n=== Table Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn load_generator(path: &Path, generators: &mut Vec<TemplateGenerator>) {
    match TemplateGenerator::load_from_ron(path) {
        Ok(generator) => {
            println!("  Loaded: {}", path.display());
            generators.push(generator);
        }
        Err(e) => {
            eprintln!("  ERROR loading {}: {}", path.display(), e);
        }
    }
}

fn load_generators_recursive(dir: &Path, generators: &mut Vec<TemplateGenerator>) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                load_generators_recursive(&path, generators);
            } else if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                load_generator(&path, generators);
            }
        }
    }
}

fn lint_generator(generator: &TemplateGenerator, min_rows: usize) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let name = generator.name();
    let tables = generator.tables();

    // Template placeholders must point at real tables.
    for placeholder in generator.missing_tables() {
        errors.push(format!(
            "Generator '{}' template references non-existent table '{}'",
            name, placeholder
        ));
    }

    for issue in tables.validate() {
        match issue {
            TableIssue::MissingTable { .. } => {
                errors.push(format!("Generator '{}': {}", name, issue))
            }
            TableIssue::Cycle { .. } => {
                errors.push(format!("Generator '{}': {} (infinite recursion)", name, issue))
            }
        }
    }

    for table_name in tables.names() {
        let Some(table) = tables.get(table_name) else {
            continue;
        };
        if table.is_empty() {
            errors.push(format!(
                "Generator '{}' table '{}' has no rows",
                name, table_name
            ));
        } else if table.rows().len() < min_rows {
            warnings.push(format!(
                "Generator '{}' table '{}' has only {} rows (minimum {} recommended)",
                name,
                table_name,
                table.rows().len(),
                min_rows
            ));
        }

        let referenced = generator.placeholder_names().contains(&table_name)
            || tables
                .names()
                .iter()
                .filter_map(|other| tables.get(other))
                .flat_map(|t| t.rows())
                .any(|row| row.references().any(|r| r == table_name));
        if !referenced {
            warnings.push(format!(
                "Generator '{}' table '{}' is never referenced",
                name, table_name
            ));
        }
    }

    (errors, warnings)
}
