pub mod error;
pub mod fs;
pub mod logger;
pub mod token;
pub mod validation;
