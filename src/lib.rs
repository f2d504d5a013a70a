pub mod app;
pub mod error;
pub mod flash;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod orm;
pub mod router;
pub mod settings;
pub mod template;
pub mod views;

pub use error::{Error, Result};
