pub mod buttons;
pub mod listener;
pub mod models;
pub mod motion;
pub mod settings;
