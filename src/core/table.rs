/// Named random tables — rows, weighting, resolution, and validation.

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::core::placeholder::{self, PlaceholderItem};
use crate::core::weighted::sample_weighted;
use crate::schema::definition::TableGeneratorDefinition;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// What a row expands to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowContent {
    /// Plain text with optional `|` alternatives.
    Static(PlaceholderItem),
    /// Text containing placeholders that are resolved against other tables.
    Recursive(Vec<PlaceholderItem>),
}

/// A single weighted row of a table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default = "default_weight")]
    pub weight: u32,
    pub content: RowContent,
}

fn default_weight() -> u32 {
    1
}

impl TableRow {
    /// Classify and parse a raw row string. Rows without placeholders are static.
    pub fn parse(raw: &str) -> Self {
        Self::with_weight(raw, 1)
    }

    pub fn with_weight(raw: &str, weight: u32) -> Self {
        let content = if placeholder::contains_placeholder(raw) {
            RowContent::Recursive(placeholder::parse(raw))
        } else {
            RowContent::Static(PlaceholderItem::literal(raw))
        };
        TableRow { weight, content }
    }

    /// Names of the tables this row refers to.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        let items: &[PlaceholderItem] = match &self.content {
            RowContent::Static(_) => &[],
            RowContent::Recursive(items) => items,
        };
        items.iter().filter_map(PlaceholderItem::table_name)
    }
}

/// An ordered list of rows with their summed weight. The sum is recomputed
/// from the rows when a table is deserialized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "TableData")]
pub struct Table {
    rows: Vec<TableRow>,
    total_weight: u32,
}

#[derive(Deserialize)]
struct TableData {
    rows: Vec<TableRow>,
}

impl From<TableData> for Table {
    fn from(data: TableData) -> Self {
        let mut table = Table::new();
        for row in data.rows {
            table.push(row);
        }
        table
    }
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table where every row has weight 1.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Self {
        let mut table = Table::new();
        for row in rows {
            table.push(TableRow::parse(row.as_ref()));
        }
        table
    }

    /// Build a table from `(row, weight)` pairs, for ranged or die-roll style tables.
    pub fn from_weighted_rows<S: AsRef<str>>(rows: &[(S, u32)]) -> Self {
        let mut table = Table::new();
        for (row, weight) in rows {
            table.push(TableRow::with_weight(row.as_ref(), *weight));
        }
        table
    }

    /// Append a row. Rows with zero weight are kept but never selected.
    pub fn push(&mut self, row: TableRow) {
        self.total_weight += row.weight;
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn total_weight(&self) -> u32 {
        self.total_weight
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sample(&self, rng: &mut StdRng) -> Option<&TableRow> {
        sample_weighted(&self.rows, self.total_weight, |row| row.weight, rng)
    }
}

/// A problem found by [`TableSet::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableIssue {
    /// `table` has a row referring to a table that does not exist.
    MissingTable { table: String, reference: String },
    /// Tables that can reach themselves through references, in walk order.
    Cycle { path: Vec<String> },
}

impl std::fmt::Display for TableIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableIssue::MissingTable { table, reference } => {
                write!(f, "table '{}' references missing table '{}'", table, reference)
            }
            TableIssue::Cycle { path } => {
                write!(f, "reference cycle: {}", path.join(" -> "))
            }
        }
    }
}

/// A set of named tables that templates resolve against.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TableSet {
    tables: HashMap<String, Table>,
}

impl TableSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from table name → raw row strings.
    pub fn from_definitions<S: AsRef<str>>(definitions: &HashMap<String, Vec<S>>) -> Self {
        let mut set = TableSet::new();
        for (name, rows) in definitions {
            set.insert(name.clone(), Table::from_rows(rows));
        }
        set
    }

    /// Add or replace a table.
    pub fn insert(&mut self, name: String, table: Table) {
        self.tables.insert(name, table);
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Table names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Roll on `name` and expand the chosen row completely.
    ///
    /// A missing or empty table yields an empty string. Recursive rows are
    /// expanded depth-first with no depth limit, so the set must be free of
    /// reference cycles (see [`TableSet::validate`]).
    pub fn resolve(&self, name: &str, rng: &mut StdRng) -> String {
        let Some(table) = self.tables.get(name) else {
            log::debug!("no table named '{}'", name);
            return String::new();
        };
        match table.sample(rng).map(|row| &row.content) {
            Some(RowContent::Static(literal)) => {
                literal.literal_text(rng).unwrap_or_default().to_string()
            }
            Some(RowContent::Recursive(items)) => self.resolve_items(items, rng).concat(),
            None => String::new(),
        }
    }

    /// Resolve one item: references roll on their table, literals pick an alternative.
    pub fn resolve_item(&self, item: &PlaceholderItem, rng: &mut StdRng) -> String {
        match item {
            PlaceholderItem::TableReference(name) => self.resolve(name, rng),
            PlaceholderItem::Literal(_) => item.literal_text(rng).unwrap_or_default().to_string(),
        }
    }

    /// Resolve each item in order.
    pub fn resolve_items(&self, items: &[PlaceholderItem], rng: &mut StdRng) -> Vec<String> {
        items.iter().map(|item| self.resolve_item(item, rng)).collect()
    }

    /// Check every reference for a target table and look for reference cycles.
    pub fn validate(&self) -> Vec<TableIssue> {
        let mut issues = Vec::new();

        for name in self.names() {
            let mut missing = BTreeSet::new();
            for row in self.tables[name].rows() {
                for reference in row.references() {
                    if !self.tables.contains_key(reference) {
                        missing.insert(reference);
                    }
                }
            }
            for reference in missing {
                issues.push(TableIssue::MissingTable {
                    table: name.to_string(),
                    reference: reference.to_string(),
                });
            }
        }

        let mut finished: BTreeSet<&str> = BTreeSet::new();
        let mut reported: BTreeSet<Vec<String>> = BTreeSet::new();
        for name in self.names() {
            let mut path = Vec::new();
            self.find_cycles(name, &mut path, &mut finished, &mut reported, &mut issues);
        }

        issues
    }

    fn find_cycles<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        finished: &mut BTreeSet<&'a str>,
        reported: &mut BTreeSet<Vec<String>>,
        issues: &mut Vec<TableIssue>,
    ) {
        if let Some(pos) = path.iter().position(|n| *n == name) {
            let mut cycle: Vec<String> = path[pos..].iter().map(|s| s.to_string()).collect();
            cycle.push(name.to_string());
            // Same cycle entered from a different table.
            let mut key = cycle[..cycle.len() - 1].to_vec();
            key.sort();
            if reported.insert(key) {
                issues.push(TableIssue::Cycle { path: cycle });
            }
            return;
        }
        if finished.contains(name) {
            return;
        }
        let Some(table) = self.tables.get(name) else {
            return;
        };

        path.push(name);
        let mut targets: BTreeSet<&str> = BTreeSet::new();
        for row in table.rows() {
            targets.extend(row.references());
        }
        for target in targets {
            self.find_cycles(target, path, finished, reported, issues);
        }
        path.pop();
        finished.insert(name);
    }

    /// Existing tables reachable from `roots` by following row references.
    pub fn reachable_from<'a, I>(&'a self, roots: I) -> BTreeSet<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&str> = roots.into_iter().collect();
        while let Some(name) = stack.pop() {
            let Some((key, table)) = self.tables.get_key_value(name) else {
                continue;
            };
            if !seen.insert(key.as_str()) {
                continue;
            }
            for row in table.rows() {
                stack.extend(row.references());
            }
        }
        seen
    }

    /// Load the tables of a table-generator definition file, ignoring its template.
    pub fn load_from_ron(path: &Path) -> Result<TableSet, TableError> {
        let definition = TableGeneratorDefinition::load_from_ron(path)?;
        Ok(TableSet::from_definitions(&definition.tables))
    }

    /// Merge another set into this one. Tables from `other` replace
    /// same-named tables in `self`.
    pub fn merge(&mut self, other: TableSet) {
        for (name, table) in other.tables {
            self.tables.insert(name, table);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn set(defs: &[(&str, &[&str])]) -> TableSet {
        let map: HashMap<String, Vec<&str>> = defs
            .iter()
            .map(|(name, rows)| (name.to_string(), rows.to_vec()))
            .collect();
        TableSet::from_definitions(&map)
    }

    #[test]
    fn deserialized_table_sums_row_weights() {
        let table: Table = ron::from_str(
            r#"(
                rows: [
                    (weight: 2, content: Static(Literal(["a"]))),
                    (content: Static(Literal(["b"]))),
                ],
                total_weight: 40,
            )"#,
        )
        .unwrap();
        assert_eq!(table.total_weight(), 3);

        let mut rng = StdRng::seed_from_u64(12);
        for _ in 0..50 {
            assert!(table.sample(&mut rng).is_some());
        }
    }

    #[test]
    fn reachable_follows_references() {
        let tables = set(&[
            ("a", &["[[b]]"]),
            ("b", &["[[c]] [[gone]]"]),
            ("c", &["leaf"]),
            ("island", &["[[island]]"]),
        ]);
        let reached: Vec<&str> = tables.reachable_from(["a"]).into_iter().collect();
        assert_eq!(reached, vec!["a", "b", "c"]);
        assert!(tables.reachable_from(["gone"]).is_empty());
    }

    #[test]
    fn rows_are_classified() {
        let table = Table::from_rows(&["plain", "a [[ref]] here", "x|y"]);
        assert!(matches!(table.rows()[0].content, RowContent::Static(_)));
        assert!(matches!(table.rows()[1].content, RowContent::Recursive(_)));
        assert_eq!(
            table.rows()[2].content,
            RowContent::Static(PlaceholderItem::literal("x|y"))
        );
        assert_eq!(table.total_weight(), 3);
    }

    #[test]
    fn recursive_rows_are_parsed_like_templates() {
        let row = TableRow::parse("[[a]] and [[b]]");
        assert_eq!(
            row.content,
            RowContent::Recursive(placeholder::parse("[[a]] and [[b]]"))
        );
        assert_eq!(row.references().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn weighted_rows_sum_weights() {
        let table = Table::from_weighted_rows(&[("common", 9), ("rare", 1)]);
        assert_eq!(table.total_weight(), 10);
        assert_eq!(table.rows()[0].weight, 9);
    }

    #[test]
    fn zero_weight_rows_are_never_chosen() {
        let table = Table::from_weighted_rows(&[("never", 0), ("always", 2)]);
        let tables = {
            let mut s = TableSet::new();
            s.insert("t".to_string(), table);
            s
        };
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..100 {
            assert_eq!(tables.resolve("t", &mut rng), "always");
        }
    }

    #[test]
    fn resolve_static_row() {
        let tables = set(&[("color", &["red", "blue"])]);
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let color = tables.resolve("color", &mut rng);
            assert!(color == "red" || color == "blue");
        }
    }

    #[test]
    fn resolve_static_row_alternatives() {
        let tables = set(&[("size", &["big|huge"])]);
        let mut rng = StdRng::seed_from_u64(2);
        let mut seen = BTreeSet::new();
        for _ in 0..100 {
            seen.insert(tables.resolve("size", &mut rng));
        }
        assert_eq!(seen.into_iter().collect::<Vec<_>>(), vec!["big", "huge"]);
    }

    #[test]
    fn resolve_nested_rows() {
        let tables = set(&[
            ("creature", &["[[size]] [[beast]]"]),
            ("size", &["tiny"]),
            ("beast", &["[[color]] wolf"]),
            ("color", &["grey"]),
        ]);
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(tables.resolve("creature", &mut rng), "tiny grey wolf");
    }

    #[test]
    fn missing_table_resolves_empty() {
        let tables = set(&[("a", &["x [[nope]] y"])]);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(tables.resolve("missing", &mut rng), "");
        assert_eq!(tables.resolve("a", &mut rng), "x  y");
    }

    #[test]
    fn empty_table_resolves_empty() {
        let mut tables = TableSet::new();
        tables.insert("empty".to_string(), Table::new());
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(tables.resolve("empty", &mut rng), "");
    }

    #[test]
    fn validate_clean_set() {
        let tables = set(&[("a", &["[[b]]"]), ("b", &["leaf"])]);
        assert!(tables.validate().is_empty());
    }

    #[test]
    fn validate_reports_missing_tables() {
        let tables = set(&[("a", &["[[b]] [[c]]", "[[c]]"]), ("b", &["leaf"])]);
        assert_eq!(
            tables.validate(),
            vec![TableIssue::MissingTable {
                table: "a".to_string(),
                reference: "c".to_string(),
            }]
        );
    }

    #[test]
    fn validate_reports_self_reference() {
        let tables = set(&[("loop", &["again [[loop]]", "done"])]);
        assert_eq!(
            tables.validate(),
            vec![TableIssue::Cycle {
                path: vec!["loop".to_string(), "loop".to_string()],
            }]
        );
    }

    #[test]
    fn validate_reports_indirect_cycle_once() {
        let tables = set(&[
            ("a", &["[[b]]"]),
            ("b", &["[[c]]"]),
            ("c", &["[[a]]"]),
            ("d", &["[[b]]"]),
        ]);
        let issues = tables.validate();
        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0],
            TableIssue::Cycle {
                path: vec!["a", "b", "c", "a"].into_iter().map(String::from).collect(),
            }
        );
        assert_eq!(issues[0].to_string(), "reference cycle: a -> b -> c -> a");
    }

    #[test]
    fn merge_replaces_tables() {
        let mut base = set(&[("shared", &["base"]), ("base_only", &["x"])]);
        base.merge(set(&[("shared", &["override"])]));
        let mut rng = StdRng::seed_from_u64(6);
        assert_eq!(base.resolve("shared", &mut rng), "override");
        assert!(base.contains("base_only"));
        assert_eq!(base.names(), vec!["base_only", "shared"]);
    }

    #[test]
    fn ron_round_trip() {
        let tables = set(&[("a", &["[[b]] or|nor"]), ("b", &["x|y"])]);
        let serialized = ron::to_string(&tables).unwrap();
        let deserialized: TableSet = ron::from_str(&serialized).unwrap();
        assert_eq!(deserialized, tables);
    }
}
