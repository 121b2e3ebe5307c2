//! Data models for the WebCraft Studio editor.
//!
//! Field names are camelCase on the wire to match the editor frontend.

mod content;
mod design;
mod media;
mod preset;
mod preview;
mod version;
mod working;

pub use content::*;
pub use design::*;
pub use media::*;
pub use preset::*;
pub use preview::*;
pub use version::*;
pub use working::*;
