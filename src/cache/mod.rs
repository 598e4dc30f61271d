pub mod service;

pub use service::handle_cache_commands;
