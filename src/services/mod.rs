pub mod admin_service;
pub mod exam_service;
pub mod upload_service;

pub use admin_service::AdminService;
pub use exam_service::ExamService;
pub use upload_service::{PdfUpload, UploadService};
