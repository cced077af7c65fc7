//! Repository Implementations
//!
//! PostgreSQL implementations of domain repository traits.
//!
//! ## Available Repositories
//!
//! - **PgChatSessionRepository / PgChatMessageRepository** - chat admission and history
//! - **PgDonationRepository** - donations and their gateway status
//! - **PgSubmissionRepository** - public form submissions
//! - **PgAdminUserRepository / PgAdminSessionRepository** - admin accounts and cookies
//! - **PgTextRepository / PgMediaRepository / PgHomepageMediaRepository** - site content
//! - **PgServiceRepository** - services price list
//! - **PgReportRepository** - spending report
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use rehab_center::infrastructure::repositories::{PgChatSessionRepository, PgDonationRepository};
//!
//! fn setup_repositories(pool: PgPool) {
//!     let sessions = PgChatSessionRepository::new(pool.clone());
//!     let donations = PgDonationRepository::new(pool);
//! }
//! ```

pub mod admin_repository;
pub mod catalog_repository;
pub mod chat_repository;
pub mod content_repository;
pub mod donation_repository;
pub mod report_repository;
pub mod submission_repository;

pub use admin_repository::{PgAdminSessionRepository, PgAdminUserRepository};
pub use catalog_repository::PgServiceRepository;
pub use chat_repository::{PgChatMessageRepository, PgChatSessionRepository};
pub use content_repository::{PgHomepageMediaRepository, PgMediaRepository, PgTextRepository};
pub use donation_repository::PgDonationRepository;
pub use report_repository::PgReportRepository;
pub use submission_repository::PgSubmissionRepository;
