pub mod corpus_store;
pub mod question_log;
pub mod types;
