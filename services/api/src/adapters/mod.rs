pub mod completion_llm;
pub mod db;
pub mod identity;
pub mod pdf;
pub mod usage;

pub use completion_llm::OpenAiCompletionAdapter;
pub use db::DbAdapter;
pub use identity::JwtIdentityVerifier;
pub use pdf::PdfExtractAdapter;
pub use usage::{InMemoryUsageLimiter, RedisUsageLimiter};
