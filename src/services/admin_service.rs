use std::sync::Arc;

use validator::Validate;

use crate::{
    api::{ApiClient, ApiRequest},
    errors::{AppError, AppResult},
    models::{
        domain::{Answer, Course, Exam, ExamHistory, Question, Subject, User},
        dto::{
            request::{PaginationParams, UpdateAnswerRequest, UpdateExamRequest, UpdateQuestionRequest},
            response::{DashboardSummary, ListResponse, Paginated},
        },
    },
};

pub const RECENT_HISTORY_LIMIT: u32 = 5;
pub const SUBJECT_PAGE_LIMIT: u32 = 100;

/// Admin listings and the partial updates behind the exam editor.
pub struct AdminService {
    client: Arc<ApiClient>,
}

impl AdminService {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub async fn dashboard(&self) -> AppResult<DashboardSummary> {
        self.client.execute(ApiRequest::get("/admin")).await
    }

    pub async fn histories(&self, params: PaginationParams) -> AppResult<Paginated<ExamHistory>> {
        self.page("/admin/histories", params).await
    }

    pub async fn recent_histories(&self) -> AppResult<Paginated<ExamHistory>> {
        self.histories(PaginationParams::new(1, RECENT_HISTORY_LIMIT))
            .await
    }

    pub async fn users(&self, params: PaginationParams) -> AppResult<Paginated<User>> {
        self.page("/admin/users", params).await
    }

    pub async fn exams(&self, params: PaginationParams) -> AppResult<Paginated<Exam>> {
        self.page("/admin/exams", params).await
    }

    pub async fn courses(&self, params: PaginationParams) -> AppResult<Paginated<Course>> {
        self.page("/admin/courses", params).await
    }

    /// Subjects feed selection lists, so they come in one large page.
    pub async fn subjects(&self) -> AppResult<Paginated<Subject>> {
        self.page("/admin/subjects", PaginationParams::new(1, SUBJECT_PAGE_LIMIT))
            .await
    }

    pub async fn exams_by_subject(
        &self,
        subject_id: i64,
        params: PaginationParams,
    ) -> AppResult<Paginated<Exam>> {
        self.page(&format!("/admin/exams/subject/{}", subject_id), params)
            .await
    }

    pub async fn questions_by_exam(&self, exam_id: i64) -> AppResult<Vec<Question>> {
        let response: ListResponse<Question> = self
            .client
            .execute(ApiRequest::get(format!("/admin/questions/exam/{}", exam_id)))
            .await?;
        Ok(response.into_vec())
    }

    pub async fn update_question(
        &self,
        question_id: i64,
        patch: &UpdateQuestionRequest,
    ) -> AppResult<Question> {
        if patch.is_empty() {
            return Err(AppError::ValidationError(
                "Question update has no fields".to_string(),
            ));
        }
        self.client
            .patch(&format!("/question/{}", question_id), patch)
            .await
    }

    pub async fn update_answer(
        &self,
        answer_id: i64,
        patch: &UpdateAnswerRequest,
    ) -> AppResult<Answer> {
        if patch.is_empty() {
            return Err(AppError::ValidationError(
                "Answer update has no fields".to_string(),
            ));
        }
        self.client
            .patch(&format!("/answer/{}", answer_id), patch)
            .await
    }

    pub async fn update_exam(&self, exam_id: i64, patch: &UpdateExamRequest) -> AppResult<Exam> {
        patch.validate()?;
        if patch.title.is_none() {
            return Err(AppError::ValidationError(
                "Exam update has no fields".to_string(),
            ));
        }
        self.client
            .patch(&format!("/exam/{}", exam_id), patch)
            .await
    }

    async fn page<T>(&self, path: &str, params: PaginationParams) -> AppResult<Paginated<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        params.validate()?;
        self.client
            .execute(ApiRequest::get(path).with_query(params.to_query()))
            .await
    }
}
