pub mod attachment;
pub mod auth;
pub mod department;
pub mod document;
pub mod health;
pub mod signature;
pub mod stats;
pub mod user;
