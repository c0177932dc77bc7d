// Sub-modules
pub mod list;
pub mod operations;
pub mod download;
pub mod upload;

// Re-exports
pub use list::*;
pub use operations::*;
pub use download::*;
pub use upload::*;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct FsPathReq {
    pub path: String,
}
