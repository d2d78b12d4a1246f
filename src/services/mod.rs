pub mod contact_service;
pub mod rate_limit_service;
