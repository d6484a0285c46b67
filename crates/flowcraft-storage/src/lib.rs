//! ABOUTME: Storage Layer (C4) — WorkflowStorage backends plus the parsing
//! ABOUTME: decorator that guarantees every returned WorkflowFile carries parsed_data

mod decorator;
mod filesystem;
mod gcs;
mod memory;

pub use decorator::ParsingDecorator;
pub use filesystem::FilesystemBackend;
pub use gcs::GcsBackend;
pub use memory::MemoryBackend;
