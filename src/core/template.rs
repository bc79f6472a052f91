/// Template generator — expands a `[[placeholder]]` template against a table set
/// and re-rolls individual placeholders on request.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::core::placeholder::{self, PlaceholderItem};
use crate::core::table::{TableError, TableSet};
use crate::schema::definition::TableGeneratorDefinition;

/// One loaded template plus the state of its last generation.
///
/// The table set is shared; the per-position cache is owned, so a single
/// generator must not be driven from two places at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateGenerator {
    name: String,
    template: String,
    parsed_template: Vec<PlaceholderItem>,
    /// Placeholder name → index in `parsed_template`. A name used more than
    /// once maps to its last occurrence.
    placeholder_positions: HashMap<String, usize>,
    resolved_values: Vec<String>,
    last_output: String,
    tables: Arc<TableSet>,
}

impl TemplateGenerator {
    pub fn new(name: &str, template: &str, tables: Arc<TableSet>) -> Self {
        let parsed_template = placeholder::parse(template);
        let mut placeholder_positions = HashMap::new();
        for (idx, item) in parsed_template.iter().enumerate() {
            if let Some(table) = item.table_name() {
                placeholder_positions.insert(table.to_string(), idx);
            }
        }

        TemplateGenerator {
            name: name.to_string(),
            template: template.to_string(),
            parsed_template,
            placeholder_positions,
            resolved_values: Vec::new(),
            last_output: String::new(),
            tables,
        }
    }

    /// Build a generator and its own table set from a definition.
    pub fn from_definition(definition: &TableGeneratorDefinition) -> Self {
        let tables = Arc::new(TableSet::from_definitions(&definition.tables));
        Self::new(&definition.name, &definition.template, tables)
    }

    /// Load a table-generator definition file.
    pub fn load_from_ron(path: &Path) -> Result<TemplateGenerator, TableError> {
        let definition = TableGeneratorDefinition::load_from_ron(path)?;
        Ok(Self::from_definition(&definition))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn parsed_template(&self) -> &[PlaceholderItem] {
        &self.parsed_template
    }

    pub fn tables(&self) -> &Arc<TableSet> {
        &self.tables
    }

    /// Output of the most recent `generate` or `regenerate`.
    pub fn last_output(&self) -> &str {
        &self.last_output
    }

    /// Per-position text of the most recent generation.
    pub fn resolved_values(&self) -> &[String] {
        &self.resolved_values
    }

    /// Placeholder names that can be passed to `regenerate`, sorted.
    pub fn placeholder_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.placeholder_positions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Placeholders of the template that name no table, sorted. They always
    /// resolve to empty text.
    pub fn missing_tables(&self) -> Vec<&str> {
        self.placeholder_names()
            .into_iter()
            .filter(|name| !self.tables.contains(name))
            .collect()
    }

    /// Resolve every position afresh and return the sentence-cased result.
    pub fn generate(&mut self, rng: &mut StdRng) -> &str {
        self.resolved_values = self.tables.resolve_items(&self.parsed_template, rng);
        self.rebuild_output();
        &self.last_output
    }

    /// Re-roll only the placeholder called `name`, keeping every other
    /// position as it was. Unknown names leave the output untouched.
    pub fn regenerate(&mut self, name: &str, rng: &mut StdRng) -> &str {
        let Some(&idx) = self.placeholder_positions.get(name) else {
            return &self.last_output;
        };
        if self.resolved_values.len() != self.parsed_template.len() {
            // Nothing generated yet, so there is no previous result to patch.
            return self.generate(rng);
        }

        self.resolved_values[idx] = self.tables.resolve_item(&self.parsed_template[idx], rng);
        self.rebuild_output();
        &self.last_output
    }

    fn rebuild_output(&mut self) {
        self.last_output = sentence_case(&self.resolved_values.concat());
    }
}

/// Lowercase everything, then uppercase the first character.
pub fn sentence_case(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut chars = lowered.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn tables(defs: &[(&str, &[&str])]) -> Arc<TableSet> {
        let map: HashMap<String, Vec<&str>> = defs
            .iter()
            .map(|(name, rows)| (name.to_string(), rows.to_vec()))
            .collect();
        Arc::new(TableSet::from_definitions(&map))
    }

    #[test]
    fn sentence_case_lowercases_rest() {
        assert_eq!(sentence_case("the RED Box"), "The red box");
        assert_eq!(sentence_case(""), "");
        assert_eq!(sentence_case("émile"), "Émile");
    }

    #[test]
    fn generate_fills_placeholder() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red", "blue"])]),
        );
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let out = generator.generate(&mut rng).to_string();
            assert!(out == "The red box" || out == "The blue box", "got {}", out);
            assert_eq!(generator.last_output(), out);
        }
    }

    #[test]
    fn generate_without_placeholders_is_stable() {
        let mut generator = TemplateGenerator::new("plain", "Just text.", tables(&[]));
        let mut rng = StdRng::seed_from_u64(1);
        let first = generator.generate(&mut rng).to_string();
        let second = generator.generate(&mut rng).to_string();
        assert_eq!(first, "Just text.");
        assert_eq!(first, second);
    }

    #[test]
    fn generate_applies_sentence_case_to_nested_rows() {
        let mut generator = TemplateGenerator::new(
            "tavern",
            "[[name]] serves [[drink]].",
            tables(&[
                ("name", &["The [[adj]] GOAT"]),
                ("adj", &["Drunken"]),
                ("drink", &["Ale"]),
            ]),
        );
        let mut rng = StdRng::seed_from_u64(2);
        assert_eq!(generator.generate(&mut rng), "The drunken goat serves ale.");
    }

    #[test]
    fn missing_tables_lists_dangling_placeholders() {
        let generator = TemplateGenerator::new(
            "gap",
            "[[zeta]] [[color]] [[alpha]] [[zeta]]",
            tables(&[("color", &["red"])]),
        );
        assert_eq!(generator.missing_tables(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn missing_table_leaves_gap() {
        let mut generator = TemplateGenerator::new("gap", "a [[missing]] b", tables(&[]));
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(generator.generate(&mut rng), "A  b");
        assert_eq!(generator.resolved_values().len(), 3);
    }

    #[test]
    fn regenerate_only_touches_named_placeholder() {
        let mut generator = TemplateGenerator::new(
            "pair",
            "[[first]] and [[second]]",
            tables(&[
                ("first", &["alpha", "beta", "gamma", "delta"]),
                ("second", &["one", "two", "three", "four"]),
            ]),
        );
        let mut rng = StdRng::seed_from_u64(4);
        generator.generate(&mut rng);
        let before = generator.resolved_values().to_vec();

        for _ in 0..20 {
            generator.regenerate("second", &mut rng);
            assert_eq!(generator.resolved_values()[0], before[0]);
            assert_eq!(generator.resolved_values()[1], before[1]);
        }
    }

    #[test]
    fn regenerate_eventually_changes_value() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red", "blue"])]),
        );
        let mut rng = StdRng::seed_from_u64(5);
        let original = generator.generate(&mut rng).to_string();
        let changed = (0..50).any(|_| generator.regenerate("color", &mut rng) != original);
        assert!(changed);
    }

    #[test]
    fn regenerate_unknown_key_is_noop() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red", "blue"])]),
        );
        let mut rng = StdRng::seed_from_u64(6);
        let before = generator.generate(&mut rng).to_string();
        assert_eq!(generator.regenerate("nonexistent", &mut rng), before);
        assert_eq!(generator.last_output(), before);
    }

    #[test]
    fn regenerate_before_generate_generates() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red"])]),
        );
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generator.regenerate("color", &mut rng), "The red box");
        assert_eq!(generator.resolved_values().len(), 3);
    }

    #[test]
    fn unknown_key_before_generate_stays_empty() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red"])]),
        );
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(generator.regenerate("nonexistent", &mut rng), "");
        assert!(generator.resolved_values().is_empty());
        assert_eq!(generator.last_output(), "");
    }

    #[test]
    fn duplicate_placeholder_regenerates_last_occurrence() {
        let mut generator = TemplateGenerator::new(
            "dup",
            "[[n]]-[[n]]",
            tables(&[("n", &["1", "2", "3", "4", "5", "6", "7", "8"])]),
        );
        assert_eq!(generator.placeholder_names(), vec!["n"]);

        let mut rng = StdRng::seed_from_u64(8);
        generator.generate(&mut rng);
        let first_slot = generator.resolved_values()[0].clone();
        for _ in 0..20 {
            generator.regenerate("n", &mut rng);
            assert_eq!(generator.resolved_values()[0], first_slot);
        }
    }

    #[test]
    fn generators_share_tables() {
        let shared = tables(&[("color", &["red"])]);
        let mut a = TemplateGenerator::new("a", "[[color]] sky", Arc::clone(&shared));
        let mut b = TemplateGenerator::new("b", "A [[color]] sea", Arc::clone(&shared));
        let mut rng = StdRng::seed_from_u64(9);
        assert_eq!(a.generate(&mut rng), "Red sky");
        assert_eq!(b.generate(&mut rng), "A red sea");
        assert!(Arc::ptr_eq(a.tables(), b.tables()));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let t = tables(&[
            ("adj", &["old", "young", "grim", "merry", "silent"]),
            ("noun", &["smith", "witch", "bard", "monk"]),
        ]);
        let mut g1 = TemplateGenerator::new("npc", "A [[adj]] [[noun]]", Arc::clone(&t));
        let mut g2 = TemplateGenerator::new("npc", "A [[adj]] [[noun]]", t);
        let mut rng1 = StdRng::seed_from_u64(77);
        let mut rng2 = StdRng::seed_from_u64(77);
        for _ in 0..10 {
            assert_eq!(g1.generate(&mut rng1), g2.generate(&mut rng2));
        }
    }

    #[test]
    fn ron_round_trip_keeps_state() {
        let mut generator = TemplateGenerator::new(
            "box",
            "The [[color]] box",
            tables(&[("color", &["red", "blue"])]),
        );
        let mut rng = StdRng::seed_from_u64(10);
        generator.generate(&mut rng);

        let serialized = ron::to_string(&generator).unwrap();
        let restored: TemplateGenerator = ron::from_str(&serialized).unwrap();
        assert_eq!(restored, generator);
        assert_eq!(restored.last_output(), generator.last_output());
    }
}
