pub mod markov;
pub mod pipeline;
pub mod placeholder;
pub mod table;
pub mod template;
pub mod weighted;
