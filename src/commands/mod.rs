pub mod auth;
pub mod db;
pub mod notify;
pub mod records;
pub mod settings;
pub mod shell;
