use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::domain::{Exam, User};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exam: Option<Exam>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ExamHistory {
    /// `"12m 5s"` style duration, `None` when the attempt has no timing.
    pub fn time_spent_label(&self) -> Option<String> {
        self.time_spent
            .filter(|s| *s > 0)
            .map(|s| format!("{}m {}s", s / 60, s % 60))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAnswer {
    pub exam_id: i64,
    pub question_order_index: i32,
    #[serde(default)]
    pub answer_order_index: Option<i32>,
    #[serde(default)]
    pub short_answer: Option<String>,
    #[serde(default)]
    pub true_false_answer: Option<String>,
    #[serde(default)]
    pub is_correct: Option<bool>,
}
