//! WASM bindings for flavor-generator — the front-end's entry point.

use wasm_bindgen::prelude::*;

use flavor_generator::core::markov::{MarkovOrder, MarkovTrainer};
use flavor_generator::core::pipeline::FlavorEngine;
use flavor_generator::core::template::TemplateGenerator;
use flavor_generator::schema::definition::TableGeneratorDefinition;

// ---------------------------------------------------------------------------
// Embedded demo data — compiled into the WASM binary
// ---------------------------------------------------------------------------
mod data {
    pub const ELVES: (&str, &str) = ("Elves", include_str!("../../demo_data/names/elves.txt"));
    pub const DWARVES: (&str, &str) =
        ("Dwarves", include_str!("../../demo_data/names/dwarves.txt"));

    pub const TAVERN: &str = include_str!("../../demo_data/tables/tavern.ron");
    pub const TRINKET: &str = include_str!("../../demo_data/tables/trinket.ron");
}

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
struct WordListInput {
    name: String,
    words: Vec<String>,
}

#[derive(serde::Serialize)]
struct GeneratorInfo {
    name: String,
    placeholders: Vec<String>,
}

#[derive(serde::Serialize)]
struct CatalogInfo {
    names: Vec<String>,
    tables: Vec<GeneratorInfo>,
}

fn parse_order(order: u8) -> Result<MarkovOrder, JsError> {
    match order {
        1 => Ok(MarkovOrder::First),
        2 => Ok(MarkovOrder::Second),
        other => Err(JsError::new(&format!("Markov order must be 1 or 2, got {other}"))),
    }
}

#[wasm_bindgen]
pub struct FlavorDemo {
    engine: FlavorEngine,
}

#[wasm_bindgen]
impl FlavorDemo {
    /// Create a demo instance with the embedded generators.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: u64) -> Result<FlavorDemo, JsError> {
        let mut builder = FlavorEngine::builder().seed(seed);
        for (name, words) in [data::ELVES, data::DWARVES] {
            let model = MarkovTrainer::train_from_text(name, words)
                .map_err(|e| JsError::new(&format!("Training error: {e}")))?;
            builder = builder.with_markov_model(model);
        }
        for src in [data::TAVERN, data::TRINKET] {
            let definition = TableGeneratorDefinition::parse_ron(src)
                .map_err(|e| JsError::new(&format!("Table parse error: {e}")))?;
            builder = builder.with_template_generator(TemplateGenerator::from_definition(&definition));
        }

        let engine = builder
            .build()
            .map_err(|e| JsError::new(&format!("Engine build error: {e}")))?;
        Ok(FlavorDemo { engine })
    }

    /// Generate a name. `order` is 1 or 2. An empty string means the
    /// generator could not produce a word this time.
    pub fn generate_name(&mut self, generator: &str, order: u8) -> Result<String, JsError> {
        let order = parse_order(order)?;
        self.engine
            .generate_name(generator, order)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))
    }

    /// Generate a fresh result from a table generator.
    pub fn generate(&mut self, generator: &str) -> Result<String, JsError> {
        self.engine
            .generate(generator)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))
    }

    /// Re-roll one placeholder of the last result.
    pub fn regenerate(&mut self, generator: &str, placeholder: &str) -> Result<String, JsError> {
        self.engine
            .regenerate(generator, placeholder)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))
    }

    /// Add a name generator from JSON: `{"name": "Orcs", "words": ["grom", ...]}`.
    pub fn add_word_list(&mut self, json: &str) -> Result<(), JsError> {
        let input: WordListInput = serde_json::from_str(json)
            .map_err(|e| JsError::new(&format!("Invalid word list JSON: {e}")))?;
        let model = MarkovTrainer::train(&input.name, &input.words)
            .map_err(|e| JsError::new(&format!("Training error: {e}")))?;
        self.engine.add_markov_model(model);
        Ok(())
    }

    /// Add a table generator from JSON with the same shape as the RON definition files.
    /// Definitions whose tables loop back on themselves are rejected.
    pub fn add_table_generator(&mut self, json: &str) -> Result<(), JsError> {
        let definition: TableGeneratorDefinition = serde_json::from_str(json)
            .map_err(|e| JsError::new(&format!("Invalid table generator JSON: {e}")))?;
        self.engine
            .add_template_generator(TemplateGenerator::from_definition(&definition))
            .map_err(|e| JsError::new(&format!("Table generator rejected: {e}")))
    }

    /// JSON description of the loaded generators.
    pub fn catalog(&self) -> Result<String, JsError> {
        let info = CatalogInfo {
            names: self
                .engine
                .name_generators()
                .into_iter()
                .map(String::from)
                .collect(),
            tables: self
                .engine
                .template_generators()
                .into_iter()
                .filter_map(|name| self.engine.template_generator(name))
                .map(|g| GeneratorInfo {
                    name: g.name().to_string(),
                    placeholders: g.placeholder_names().into_iter().map(String::from).collect(),
                })
                .collect(),
        };
        serde_json::to_string(&info)
            .map_err(|e| JsError::new(&format!("Serialization error: {e}")))
    }

    /// Restart the random sequence with a new seed.
    pub fn reset(&mut self, seed: u64) {
        self.engine.reseed(seed);
    }
}
