//! API endpoint tests

mod admin_tests;
mod health_tests;
mod payment_callback_tests;
mod public_api_tests;
