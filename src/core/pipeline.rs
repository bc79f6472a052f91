/// The flavor engine: a catalog of name and template generators behind one seeded RNG.
///
/// Loads generators from a data directory (by manifest or by convention),
/// validates table sets, and routes generation calls by generator name.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::markov::{self, MarkovError, MarkovModel, MarkovOrder, MarkovTrainer};
use crate::core::table::{TableError, TableIssue};
use crate::core::template::TemplateGenerator;
use crate::schema::definition::{GeneratorKind, GeneratorManifest};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("markov error: {0}")]
    Markov(#[from] MarkovError),
    #[error("table error: {0}")]
    Table(#[from] TableError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unknown generator: {0}")]
    UnknownGenerator(String),
    #[error("generator '{generator}' has cyclic tables: {issues:?}")]
    CyclicTables {
        generator: String,
        issues: Vec<String>,
    },
}

/// Sub-directory scanned for Markov models when no manifest is given.
pub const NAMES_DIR: &str = "names";
/// Sub-directory scanned for table generators when no manifest is given.
pub const TABLES_DIR: &str = "tables";

/// Name and template generators keyed by display name.
pub struct FlavorEngine {
    name_generators: BTreeMap<String, MarkovModel>,
    template_generators: BTreeMap<String, TemplateGenerator>,
    rng: StdRng,
    seed: u64,
    validate_tables: bool,
}

/// Builder for constructing a `FlavorEngine`.
pub struct FlavorEngineBuilder {
    data_dir: Option<PathBuf>,
    manifest_path: Option<PathBuf>,
    seed: u64,
    validate_tables: bool,
    /// Directly provided models (for testing without files).
    markov_models: Vec<MarkovModel>,
    /// Directly provided template generators (for testing without files).
    template_generators: Vec<TemplateGenerator>,
}

impl FlavorEngine {
    pub fn builder() -> FlavorEngineBuilder {
        FlavorEngineBuilder {
            data_dir: None,
            manifest_path: None,
            seed: 0,
            validate_tables: true,
            markov_models: Vec::new(),
            template_generators: Vec::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the random sequence from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = StdRng::seed_from_u64(seed);
    }

    /// Names of the Markov generators, sorted.
    pub fn name_generators(&self) -> Vec<&str> {
        self.name_generators.keys().map(String::as_str).collect()
    }

    /// Names of the template generators, sorted.
    pub fn template_generators(&self) -> Vec<&str> {
        self.template_generators.keys().map(String::as_str).collect()
    }

    pub fn markov_model(&self, name: &str) -> Option<&MarkovModel> {
        self.name_generators.get(name)
    }

    pub fn template_generator(&self, name: &str) -> Option<&TemplateGenerator> {
        self.template_generators.get(name)
    }

    /// Generate a word with the named Markov generator. An empty string
    /// means no word could be built this time.
    pub fn generate_name(&mut self, name: &str, order: MarkovOrder) -> Result<String, PipelineError> {
        let model = self
            .name_generators
            .get(name)
            .ok_or_else(|| PipelineError::UnknownGenerator(name.to_string()))?;
        Ok(model.generate_word(order, &mut self.rng))
    }

    /// Fully regenerate the named template generator.
    pub fn generate(&mut self, name: &str) -> Result<String, PipelineError> {
        let generator = self
            .template_generators
            .get_mut(name)
            .ok_or_else(|| PipelineError::UnknownGenerator(name.to_string()))?;
        Ok(generator.generate(&mut self.rng).to_string())
    }

    /// Re-roll one placeholder of the named template generator.
    pub fn regenerate(&mut self, name: &str, placeholder: &str) -> Result<String, PipelineError> {
        let generator = self
            .template_generators
            .get_mut(name)
            .ok_or_else(|| PipelineError::UnknownGenerator(name.to_string()))?;
        Ok(generator.regenerate(placeholder, &mut self.rng).to_string())
    }

    /// Last output of the named template generator.
    pub fn current_output(&self, name: &str) -> Result<&str, PipelineError> {
        self.template_generators
            .get(name)
            .map(TemplateGenerator::last_output)
            .ok_or_else(|| PipelineError::UnknownGenerator(name.to_string()))
    }

    /// Register a name generator on a running engine. The RNG and every
    /// other generator's state are left as they are.
    pub fn add_markov_model(&mut self, model: MarkovModel) {
        insert_markov_model(&mut self.name_generators, model);
    }

    /// Register a template generator on a running engine, with the same
    /// table checks as [`FlavorEngineBuilder::build`].
    pub fn add_template_generator(&mut self, generator: TemplateGenerator) -> Result<(), PipelineError> {
        check_tables(&generator, self.validate_tables)?;
        insert_template_generator(&mut self.template_generators, generator);
        Ok(())
    }
}

fn insert_markov_model(generators: &mut BTreeMap<String, MarkovModel>, model: MarkovModel) {
    if generators.contains_key(model.name()) {
        log::warn!("duplicate name generator '{}', keeping the last one", model.name());
    }
    generators.insert(model.name().to_string(), model);
}

fn insert_template_generator(
    generators: &mut BTreeMap<String, TemplateGenerator>,
    generator: TemplateGenerator,
) {
    if generators.contains_key(generator.name()) {
        log::warn!("duplicate template generator '{}', keeping the last one", generator.name());
    }
    generators.insert(generator.name().to_string(), generator);
}

/// Warn about references to missing tables and refuse cycles the template can reach.
///
/// Cycles among tables the template never uses are only logged.
fn check_tables(generator: &TemplateGenerator, reject_cycles: bool) -> Result<(), PipelineError> {
    let tables = generator.tables();
    for placeholder in generator.missing_tables() {
        log::warn!(
            "generator '{}': template references missing table '{}'",
            generator.name(),
            placeholder
        );
    }

    let reachable = tables.reachable_from(generator.placeholder_names());
    let mut cycles = Vec::new();
    for issue in tables.validate() {
        match issue {
            TableIssue::MissingTable { .. } => {
                log::warn!("generator '{}': {}", generator.name(), issue)
            }
            TableIssue::Cycle { ref path } => {
                if path.iter().any(|name| reachable.contains(name.as_str())) {
                    cycles.push(issue.to_string());
                } else {
                    log::warn!("generator '{}': unused {}", generator.name(), issue);
                }
            }
        }
    }

    if reject_cycles && !cycles.is_empty() {
        return Err(PipelineError::CyclicTables {
            generator: generator.name().to_string(),
            issues: cycles,
        });
    }
    Ok(())
}

impl FlavorEngineBuilder {
    /// Directory holding generator data files.
    pub fn data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// RON manifest listing which files of the data directory to load.
    pub fn manifest<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.manifest_path = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Reject table generators whose tables reference themselves. On by default.
    pub fn validate_tables(mut self, validate: bool) -> Self {
        self.validate_tables = validate;
        self
    }

    /// Provide a model directly (for testing without files).
    pub fn with_markov_model(mut self, model: MarkovModel) -> Self {
        self.markov_models.push(model);
        self
    }

    /// Provide a template generator directly (for testing without files).
    pub fn with_template_generator(mut self, generator: TemplateGenerator) -> Self {
        self.template_generators.push(generator);
        self
    }

    pub fn build(self) -> Result<FlavorEngine, PipelineError> {
        let mut markov_models = self.markov_models;
        let mut template_generators = self.template_generators;

        if let Some(ref manifest_path) = self.manifest_path {
            let contents = std::fs::read_to_string(manifest_path)?;
            let manifest: GeneratorManifest = ron::from_str(&contents)?;
            let base = match self.data_dir {
                Some(ref dir) => dir.clone(),
                None => manifest_path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default(),
            };

            for entry in &manifest {
                let path = base.join(entry.file_name());
                log::debug!("loading {:?} generator from {}", entry.kind, path.display());
                match entry.kind {
                    GeneratorKind::Markov => markov_models.push(markov::load_model(&path)?),
                    GeneratorKind::WordList => {
                        let text = std::fs::read_to_string(&path)?;
                        let model = MarkovTrainer::train_from_text(entry.display_name(), &text)?;
                        markov_models.push(model);
                    }
                    GeneratorKind::Tables => {
                        template_generators.push(TemplateGenerator::load_from_ron(&path)?)
                    }
                }
            }
        } else if let Some(ref dir) = self.data_dir {
            let names_dir = dir.join(NAMES_DIR);
            if names_dir.exists() {
                load_files_from_dir(&names_dir, |path| {
                    match path.extension().and_then(|s| s.to_str()) {
                        Some("ron") => markov_models.push(markov::load_model(path)?),
                        Some("txt") => {
                            let stem = path
                                .file_stem()
                                .and_then(|s| s.to_str())
                                .unwrap_or("unknown");
                            let text = std::fs::read_to_string(path)?;
                            markov_models.push(MarkovTrainer::train_from_text(stem, &text)?);
                        }
                        _ => {}
                    }
                    Ok(())
                })?;
            }

            let tables_dir = dir.join(TABLES_DIR);
            if tables_dir.exists() {
                load_files_from_dir(&tables_dir, |path| {
                    if path.extension().and_then(|s| s.to_str()) == Some("ron") {
                        template_generators.push(TemplateGenerator::load_from_ron(path)?);
                    }
                    Ok(())
                })?;
            }
        }

        let mut name_generators = BTreeMap::new();
        for model in markov_models {
            insert_markov_model(&mut name_generators, model);
        }

        let mut templates = BTreeMap::new();
        for generator in template_generators {
            check_tables(&generator, self.validate_tables)?;
            insert_template_generator(&mut templates, generator);
        }

        log::info!(
            "flavor engine ready: {} name generators, {} template generators, seed {}",
            name_generators.len(),
            templates.len(),
            self.seed
        );

        Ok(FlavorEngine {
            name_generators,
            template_generators: templates,
            rng: StdRng::seed_from_u64(self.seed),
            seed: self.seed,
            validate_tables: self.validate_tables,
        })
    }
}

/// Visit every file in a directory in file-name order.
fn load_files_from_dir<F>(dir: &Path, mut loader: F) -> Result<(), PipelineError>
where
    F: FnMut(&Path) -> Result<(), PipelineError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    for path in paths {
        loader(&path)?;
    }
    Ok(())
}
