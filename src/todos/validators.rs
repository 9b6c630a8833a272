// src/todos/validators.rs

use super::models::CreateTodoRequest;
use crate::common::{ValidationResult, Validator};

pub const MAX_TEXT_LENGTH: usize = 1000;

pub struct CreateTodoValidator;

impl Validator<CreateTodoRequest> for CreateTodoValidator {
    fn validate(&self, data: &CreateTodoRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        // Limits apply to the text as stored, which is trimmed
        let text = data.text.trim();
        if text.is_empty() {
            result.add_error("text", "Text is required");
        } else if text.chars().count() > MAX_TEXT_LENGTH {
            result.add_error("text", "Text must be at most 1000 characters");
        }

        if matches!(data.due_at, Some(due) if due < 0) {
            result.add_error("dueAt", "Due date must be a non-negative timestamp");
        }

        result
    }
}
