pub mod access; // Consultation access policy
pub mod api; // HTTP surface: router, middleware, endpoints
pub mod config;
pub mod consultations; // Lifecycle engine
pub mod db;
pub mod messaging; // Message thread manager
pub mod models;
pub mod notify; // Notification events, templates, transport, dispatcher
pub mod photos; // Photo ledger
pub mod storage; // Uploaded photo file storage
