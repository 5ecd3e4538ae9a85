pub mod exam;
pub mod history;
pub mod question;
pub mod user;

pub use exam::{Course, Exam, Lesson};
pub use history::{ExamHistory, UserAnswer};
pub use question::{Answer, Question, QuestionType};
pub use user::{Group, LoginType, Subject, User};
