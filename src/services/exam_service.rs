use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use validator::Validate;

use crate::{
    api::{ApiClient, ApiRequest},
    errors::AppResult,
    models::{
        domain::{Course, Exam, ExamHistory, Question},
        dto::{
            request::{PaginationParams, SubmitExamRequest},
            response::ListResponse,
        },
    },
};

/// Exam-taking endpoints shared with the learner app. Listings here are not
/// paginated envelopes; they come back bare or wrapped in `data`.
pub struct ExamService {
    client: Arc<ApiClient>,
}

impl ExamService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn courses_by_subject(&self, subject_id: i64) -> AppResult<Vec<Course>> {
        self.subject_listing(subject_id).await
    }

    /// Same endpoint as [`Self::courses_by_subject`]; with `isExam` set the
    /// backend lists the exam records themselves.
    pub async fn exams_by_subject(&self, subject_id: i64) -> AppResult<Vec<Exam>> {
        self.subject_listing(subject_id).await
    }

    pub async fn exam_questions(
        &self,
        exam_id: i64,
        params: PaginationParams,
    ) -> AppResult<Vec<Question>> {
        params.validate()?;
        let response: ListResponse<Question> = self
            .client
            .execute(
                ApiRequest::get(format!("/question/subject/{}", exam_id))
                    .with_query(params.to_query()),
            )
            .await?;
        Ok(response.into_vec())
    }

    pub async fn submit_exam(&self, request: &SubmitExamRequest) -> AppResult<ExamHistory> {
        request.validate()?;
        self.client.post("/history/submit", request).await
    }

    pub async fn histories(&self) -> AppResult<Vec<ExamHistory>> {
        let response: ListResponse<ExamHistory> =
            self.client.execute(ApiRequest::get("/history")).await?;
        Ok(response.into_vec())
    }

    async fn subject_listing<T: DeserializeOwned>(&self, subject_id: i64) -> AppResult<Vec<T>> {
        let response: ListResponse<T> = self
            .client
            .execute(
                ApiRequest::get(format!("/course/subject/{}", subject_id)).query("isExam", "true"),
            )
            .await?;
        Ok(response.into_vec())
    }

    /// Per-question answers of one attempt. The shape differs between
    /// backend versions, so it is handed back undecoded.
    pub async fn history_answers(&self, history_id: i64, exam_id: i64) -> AppResult<Value> {
        self.client
            .execute(
                ApiRequest::get("/history/answers")
                    .query("historyId", history_id.to_string())
                    .query("examId", exam_id.to_string()),
            )
            .await
    }
}
