//! Durable storage for session markup logs

mod codec;
mod discover;
mod flat;
mod io;
mod rich;
mod store;

pub use codec::{CodecError, LogCodec, LogEncoding};
pub use discover::{find_report_file, list_markup_files};
pub use flat::FlatCodec;
pub use io::atomic_write;
pub use rich::RichCodec;
pub use store::{project_active_view, LogStore, StoreError};
