//! A mutable character sequence backed by a binary tree of fragments.
//!
//! ```
//! use text_rope::Rope;
//!
//! let mut rope = Rope::from("hello");
//! rope.insert(" world", 5).unwrap();
//! rope.erase(0, 5).unwrap();
//! assert_eq!(rope.report(1, 5).unwrap(), "world");
//! ```

mod error;
mod rope;

pub use self::error::{Result, RopeError};
pub use self::rope::{Fragments, Rope};
