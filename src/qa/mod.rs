//! Keyword question answering over the graph

pub mod answerer;
pub mod keywords;

pub use answerer::{answer_from_subgraph, answer_question, QaAnswer, NO_INFORMATION_ANSWER};
pub use keywords::extract_keywords;
