pub mod client;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use request::{ApiRequest, Method, MultipartForm, RequestBody};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
