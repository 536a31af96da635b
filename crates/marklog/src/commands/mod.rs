pub mod convert;
pub mod progress;
pub mod show;
pub mod version;
