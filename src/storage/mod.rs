pub mod handles;

pub use handles::{CachedHandles, HandleCache};
