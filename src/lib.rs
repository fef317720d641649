pub mod cli;
pub mod compare;
pub mod config;
pub mod drive;
pub mod logging;
pub mod menu;
pub mod routines;
pub mod sheets;
pub mod source;
pub mod transfer;
pub mod utils;
