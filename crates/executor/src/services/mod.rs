pub mod poll_service;
pub mod telegram_service;
