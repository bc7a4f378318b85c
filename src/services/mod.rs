pub mod lead_service;
pub mod scoring;
pub mod token;
