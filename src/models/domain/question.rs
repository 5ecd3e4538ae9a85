use serde::{Deserialize, Serialize};

use crate::models::{
    domain::Exam,
    dto::request::{UpdateAnswerRequest, UpdateQuestionRequest},
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<Exam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paragraph_id: Option<i64>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answers: Option<Vec<Answer>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_answer: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Choice,
    TrueFalse,
    ShortAnswer,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_index: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Question {
    /// Merges a partial update the backend has accepted into this copy.
    pub fn apply_patch(&mut self, patch: &UpdateQuestionRequest) {
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(explanation) = &patch.explanation {
            self.explanation = Some(explanation.clone());
        }
        if let Some(short_answer) = &patch.short_answer {
            self.short_answer = Some(short_answer.clone());
        }
    }
}

impl Answer {
    pub fn apply_patch(&mut self, patch: &UpdateAnswerRequest) {
        if let Some(content) = &patch.content {
            self.content = Some(content.clone());
        }
        if let Some(is_correct) = patch.is_correct {
            self.is_correct = Some(is_correct);
        }
    }
}

/// Applies a question update to the matching record in a locally held list.
/// Returns false when no question has that id.
pub fn apply_question_patch(
    questions: &mut [Question],
    question_id: i64,
    patch: &UpdateQuestionRequest,
) -> bool {
    match questions.iter_mut().find(|q| q.id == Some(question_id)) {
        Some(question) => {
            question.apply_patch(patch);
            true
        }
        None => false,
    }
}

/// Applies an answer update wherever that answer appears in the list.
pub fn apply_answer_patch(
    questions: &mut [Question],
    answer_id: i64,
    patch: &UpdateAnswerRequest,
) -> bool {
    let mut found = false;
    for answer in questions
        .iter_mut()
        .filter_map(|q| q.answers.as_mut())
        .flat_map(|answers| answers.iter_mut())
        .filter(|a| a.id == Some(answer_id))
    {
        answer.apply_patch(patch);
        found = true;
    }
    found
}
