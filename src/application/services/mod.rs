//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **ChatService**: chat admission, queue, relay with database fallback
//! - **PaymentService**: donations, gateway checkouts, callback reconciliation
//! - **AdminAuthService**: admin logins and cookie sessions
//! - **SubmissionService**: public forms
//! - **ContentService**: translations, media and homepage slots
//! - **CatalogService**: services price list
//! - **ReportService**: public spending report
//! - **InstagramService**: cached Instagram feed

pub mod admin_auth_service;
pub mod catalog_service;
pub mod chat_service;
pub mod content_service;
pub mod instagram_service;
pub mod payment_service;
pub mod report_service;
pub mod submission_service;

// Re-export chat service types
pub use chat_service::{
    ChatError, ChatService, ChatServiceImpl, Delivery, OpenSessionDto, SentMessageDto,
    SessionStatusDto,
};

// Re-export payment service types
pub use payment_service::{
    CallbackOutcome, CreateDonationDto, DonationCheckoutDto, PaymentError, PaymentService,
    PaymentServiceImpl,
};

// Re-export admin auth types
pub use admin_auth_service::{AdminAuthService, AdminAuthServiceImpl, AdminLogin, AuthError};

// Re-export submission service types
pub use submission_service::{
    CreateSubmissionDto, SubmissionError, SubmissionReceiptDto, SubmissionService,
    SubmissionServiceImpl,
};

// Re-export content service types
pub use content_service::{
    ContentError, ContentService, ContentServiceImpl, HomepageItemInput, HomepageSectionDto,
    MediaDto, MediaQueryDto, TranslationsDto, UploadMediaDto,
};

// Re-export catalog service types
pub use catalog_service::{
    CatalogService, CatalogServiceImpl, ServiceDto, ServiceInput, ServiceOptionInput,
};

// Re-export report service types
pub use report_service::{ReportDto, ReportItemInput, ReportService, ReportServiceImpl};

// Re-export instagram service types
pub use instagram_service::{
    InstagramFeedDto, InstagramService, InstagramServiceImpl, InstagramSource,
};
