pub mod dispatch;
pub mod models;
pub mod repositories;
pub mod services;
