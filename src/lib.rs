pub mod analyzers;
pub mod fetch;
pub mod loader;
pub mod output;
pub mod parser;
pub mod record;
pub mod session;
pub mod stats;
