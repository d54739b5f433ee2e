pub mod explore;
pub mod fetch;
pub mod list;
pub mod refresh;
pub mod saved;
