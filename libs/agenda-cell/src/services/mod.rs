pub mod cache;
pub mod refresh;
pub mod upstream;
