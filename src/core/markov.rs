/// Character-level Markov name generator — training, serialization, and generation.

use rand::rngs::StdRng;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::weighted::WeightedTable;

#[derive(Debug, Error)]
pub enum MarkovError {
    #[error("training corpus contains no usable words")]
    EmptyCorpus,
    #[error("no data for generation (model is empty)")]
    NoData,
    #[error("no word of the sampled length found after {0} attempts")]
    Exhausted(u32),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("RON serialization error: {0}")]
    RonWrite(#[from] ron::Error),
}

/// Marks the position before the first letter of a word.
pub const WORD_START: char = '^';
/// Marks the end of a word, and also a state with no known continuation.
pub const WORD_END: char = '$';

/// Maximum number of walks attempted before giving up on a word.
pub const MAX_ATTEMPTS: u32 = 100;

/// How many previous characters condition the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarkovOrder {
    First,
    Second,
}

/// A trained character model for one family of names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkovModel {
    name: String,
    initial_letters: WeightedTable<char>,
    /// Transition table: current char → next char (`$` ends the word).
    first_order: FxHashMap<char, WeightedTable<char>>,
    /// Transition table: previous + current char → next char.
    second_order: FxHashMap<String, WeightedTable<char>>,
    word_lengths: WeightedTable<usize>,
    min_length: usize,
    max_length: usize,
}

impl MarkovModel {
    /// Display name of this generator.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn initial_letters(&self) -> &WeightedTable<char> {
        &self.initial_letters
    }

    pub fn first_order(&self) -> &FxHashMap<char, WeightedTable<char>> {
        &self.first_order
    }

    pub fn second_order(&self) -> &FxHashMap<String, WeightedTable<char>> {
        &self.second_order
    }

    pub fn word_lengths(&self) -> &WeightedTable<usize> {
        &self.word_lengths
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Generate a capitalized word, or an empty string when none could be built.
    pub fn generate_word(&self, order: MarkovOrder, rng: &mut StdRng) -> String {
        match self.try_generate_word(order, rng) {
            Ok(word) => word,
            Err(e) => {
                log::debug!("'{}' produced no word: {}", self.name, e);
                String::new()
            }
        }
    }

    /// Generate a word by random walk.
    ///
    /// Each attempt samples a target length, seeds the walk with a start
    /// letter and extends it until the chain emits the end marker. The word
    /// is only accepted if the end marker arrives exactly at the target
    /// length; otherwise the attempt is thrown away.
    pub fn try_generate_word(
        &self,
        order: MarkovOrder,
        rng: &mut StdRng,
    ) -> Result<String, MarkovError> {
        if self.initial_letters.is_empty() || self.word_lengths.is_empty() {
            return Err(MarkovError::NoData);
        }

        for _ in 0..MAX_ATTEMPTS {
            let (Some(&length), Some(&first)) = (
                self.word_lengths.sample(rng),
                self.initial_letters.sample(rng),
            ) else {
                continue;
            };
            let mut buffer = vec![WORD_START, first];

            for i in 1..=length {
                let next = self.next_char(&buffer, order, rng);
                if next == WORD_END {
                    if i == length {
                        return Ok(capitalize_first(&buffer[1..]));
                    }
                    break;
                }
                buffer.push(next);
            }
        }

        Err(MarkovError::Exhausted(MAX_ATTEMPTS))
    }

    /// Pick the character following `buffer`.
    ///
    /// Second order is only consulted once the buffer holds more than two
    /// characters (start marker included) and the pair was seen in
    /// training; otherwise the last character alone decides. An untrained
    /// state yields `WORD_END`.
    fn next_char(&self, buffer: &[char], order: MarkovOrder, rng: &mut StdRng) -> char {
        if order == MarkovOrder::Second && buffer.len() > 2 {
            let key: String = buffer[buffer.len() - 2..].iter().collect();
            if let Some(table) = self.second_order.get(&key) {
                if let Some(c) = table.sample(rng) {
                    return *c;
                }
            }
        }

        let Some(last) = buffer.last() else {
            return WORD_END;
        };
        self.first_order
            .get(last)
            .and_then(|table| table.sample(rng))
            .copied()
            .unwrap_or(WORD_END)
    }
}

/// Uppercase the first character, keep the rest as generated.
fn capitalize_first(chars: &[char]) -> String {
    let mut out = String::with_capacity(chars.len());
    if let Some((first, rest)) = chars.split_first() {
        out.extend(first.to_uppercase());
        out.extend(rest.iter());
    }
    out
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// Trains Markov models from word lists.
pub struct MarkovTrainer;

impl MarkovTrainer {
    /// Build a model from a list of training words.
    ///
    /// Words are split into Unicode scalar values and lowercased. Words are
    /// trimmed; empty entries are skipped.
    pub fn train<S: AsRef<str>>(name: &str, words: &[S]) -> Result<MarkovModel, MarkovError> {
        let mut model = MarkovModel {
            name: name.to_string(),
            initial_letters: WeightedTable::new(),
            first_order: FxHashMap::default(),
            second_order: FxHashMap::default(),
            word_lengths: WeightedTable::new(),
            min_length: usize::MAX,
            max_length: 0,
        };

        for word in words {
            let chars: Vec<char> = word.as_ref().trim().chars().map(fold_case).collect();
            if chars.is_empty() {
                continue;
            }
            add_word(&mut model, &chars);
        }

        if model.word_lengths.is_empty() {
            return Err(MarkovError::EmptyCorpus);
        }

        log::debug!(
            "trained '{}': {} first-order states, {} second-order states, lengths {}..={}",
            model.name,
            model.first_order.len(),
            model.second_order.len(),
            model.min_length,
            model.max_length
        );
        Ok(model)
    }

    /// Parse a word list: one word per line, blank lines and `#` comments ignored.
    pub fn train_from_text(name: &str, text: &str) -> Result<MarkovModel, MarkovError> {
        let words: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();
        Self::train(name, &words)
    }
}

fn add_word(model: &mut MarkovModel, chars: &[char]) {
    let len = chars.len();
    for (i, &c) in chars.iter().enumerate() {
        let next = chars.get(i + 1).copied().unwrap_or(WORD_END);
        let prev = if i == 0 { WORD_START } else { chars[i - 1] };

        if i == 0 {
            model.initial_letters.increment(c);
        }
        model.first_order.entry(c).or_default().increment(next);

        let key: String = [prev, c].iter().collect();
        model.second_order.entry(key).or_default().increment(next);
    }

    model.word_lengths.increment(len);
    model.min_length = model.min_length.min(len);
    model.max_length = model.max_length.max(len);
}

/// Save a MarkovModel to a RON file.
pub fn save_model(model: &MarkovModel, path: &std::path::Path) -> Result<(), MarkovError> {
    let serialized = ron::ser::to_string_pretty(model, ron::ser::PrettyConfig::default())?;
    std::fs::write(path, serialized)?;
    Ok(())
}

/// Load a MarkovModel from a RON file.
pub fn load_model(path: &std::path::Path) -> Result<MarkovModel, MarkovError> {
    let contents = std::fs::read_to_string(path)?;
    let model: MarkovModel = ron::from_str(&contents)?;
    Ok(model)
}
