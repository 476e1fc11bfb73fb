pub mod chunking;
pub mod corpus;
pub mod generation;
pub mod search;
pub mod service;
pub mod vector_index;

pub use corpus::{build_index, load_or_build_corpus, IndexedCorpus};
pub use generation::{OpenAIQuestionGenerator, QuestionGenerator};
pub use service::{GeneratedQuestion, QuestionRequest, QuestionService};
