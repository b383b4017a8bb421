use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct AskTutorPayload {
    #[validate(length(min = 1, max = 2000, message = "Question must be 1-2000 characters"))]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct TutorReply {
    pub response: String,
    pub module_title: String,
}

#[derive(Debug, Serialize)]
pub struct ModuleContentResponse {
    pub module_id: i32,
    pub content: String,
}
