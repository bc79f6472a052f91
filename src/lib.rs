//! Flavor Generator — procedural names and flavor text from small corpora.
//!
//! Two engines share one weighted sampler: a character-level Markov chain
//! that invents words resembling a training list, and a template expander
//! that fills `[[placeholder]]` slots from named, nestable random tables.

pub mod core;
pub mod schema;
