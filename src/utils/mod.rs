pub mod download;
pub mod process;
pub mod prompt;
