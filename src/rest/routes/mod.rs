pub mod accounts;
pub mod applications;
pub mod auth;
pub mod automation;
pub mod catalog;
pub mod documents;
pub mod grants;
pub mod health;
pub mod users;
pub mod whatsapp;
