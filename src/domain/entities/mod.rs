//! # Domain Entities
//!
//! Core domain entities of the rehabilitation center backend.
//! All entities map directly to their corresponding database tables.
//!
//! ## Core Entities
//!
//! - **ChatSession / ChatMessage**: visitor chats with single-active admission
//! - **Donation**: a payment attempt through one of the gateways
//!
//! ## Supporting Entities
//!
//! - **FormSubmission**: contact, consultation and volunteer forms
//! - **AdminUser / AdminSession**: admin panel accounts and cookie sessions
//! - **TextEntry / MediaObject / HomepageMediaItem**: editable site content
//! - **Service / ServiceOption**: the services price list
//! - **ReportItem / ReportSetting**: the public spending report
//!
//! ## Repository Traits
//!
//! Each entity has an associated repository trait defining data access operations.
//! These traits are implemented in the infrastructure layer, following the
//! dependency inversion principle.

mod admin;
mod catalog;
mod chat;
mod content;
mod donation;
mod report;
mod submission;

pub use admin::{AdminSession, AdminSessionRepository, AdminUser, AdminUserRepository};

pub use catalog::{Service, ServiceOption, ServiceRepository, ServiceWithOptions};

pub use chat::{
    ChatMessage, ChatMessageRepository, ChatSession, ChatSessionRepository, ChatSessionStatus,
    CloseOutcome, MessageSender, NewChatSession,
};

pub use content::{
    HomepageMediaItem, HomepageMediaRepository, MediaObject, MediaRepository, TextEntry,
    TextRepository,
};

pub use donation::{
    Donation, DonationFilter, DonationRepository, DonationStatus, DonationTotals, PaymentGateway,
    StatusUpdate,
};

pub use report::{is_valid_period, ReportItem, ReportRepository, ReportSetting};

pub use submission::{FormSubmission, FormType, SubmissionFilter, SubmissionRepository};
