use crate::models::domain::{Answer, Exam, Question, QuestionType, User};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// Creates a standard test user
    pub fn test_user() -> User {
        User::new(1, "Test User", "test@example.com")
    }

    pub fn test_exam() -> Exam {
        Exam {
            id: Some(11),
            subject_id: Some(1),
            title: Some("Physics Midterm".to_string()),
            duration: Some(45),
            ..Default::default()
        }
    }

    /// Two questions of exam 11; the second one carries answers 21 and 22.
    pub fn test_questions() -> Vec<Question> {
        vec![
            Question {
                id: Some(1),
                exam_id: Some(11),
                question_type: Some(QuestionType::ShortAnswer),
                content: Some("What is the SI unit of force?".to_string()),
                short_answer: Some("Newton".to_string()),
                order_index: Some(1),
                ..Default::default()
            },
            Question {
                id: Some(2),
                exam_id: Some(11),
                question_type: Some(QuestionType::Choice),
                content: Some("What is F?".to_string()),
                order_index: Some(2),
                answers: Some(vec![
                    Answer {
                        id: Some(21),
                        question_id: Some(2),
                        order_index: Some(1),
                        is_correct: Some(false),
                        content: Some("m * a".to_string()),
                    },
                    Answer {
                        id: Some(22),
                        question_id: Some(2),
                        order_index: Some(2),
                        is_correct: Some(true),
                        content: Some("m / a".to_string()),
                    },
                ]),
                ..Default::default()
            },
        ]
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use serde_json::Value;

    use crate::{
        api::transport::HttpResponse,
        auth::TokenStore,
        storage::MemoryStorage,
    };

    /// Response with a JSON body and the given status
    pub fn json_response(status: u16, body: Value) -> HttpResponse {
        HttpResponse::new(status, body.to_string())
    }

    /// Token store over fresh in-memory slots
    pub fn memory_store() -> Arc<TokenStore> {
        Arc::new(TokenStore::new(Arc::new(MemoryStorage::new())))
    }

    /// Same, with a session already in place
    pub fn signed_in_store(token: &str) -> Arc<TokenStore> {
        let store = memory_store();
        store.set(Some(token));
        store
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::test_helpers::*;

    #[test]
    fn test_fixtures_test_user() {
        let user = test_user();
        assert_eq!(user.id, Some(1));
        assert_eq!(user.email.as_deref(), Some("test@example.com"));
    }

    #[test]
    fn test_fixtures_test_questions() {
        let questions = test_questions();
        assert_eq!(questions.len(), 2);
        assert!(questions.iter().all(|q| q.exam_id == test_exam().id));
    }

    #[test]
    fn test_signed_in_store() {
        assert_eq!(signed_in_store("t1").get().as_deref(), Some("t1"));
    }
}
