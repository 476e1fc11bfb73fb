use std::sync::Arc;

use retrieval_pipeline::service::QuestionService;

#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<QuestionService>,
}

impl ApiState {
    pub fn new(service: Arc<QuestionService>) -> Self {
        Self { service }
    }
}
