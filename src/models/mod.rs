pub mod changelog;
pub mod dates;
pub mod defaults;
pub mod feedback;
pub mod session;
pub mod user;
