pub mod domain;
pub mod ports;
pub mod prompt;
pub mod quota;

pub use domain::{
    Account, Document, DocumentPatch, DocumentStatus, Generation, Identity, NewDocument,
    Provisioned, QuotaDecision, UsageSnapshot,
};
pub use ports::{
    DatabaseService, IdentityVerifier, PortError, PortResult, TextExtractionService,
    TextGenerationService, TextStream, UsageLimiter,
};
pub use prompt::{compose_prompt, AiCommand};
pub use quota::{QuotaPolicy, SlidingWindowLog};
