//! Memory infrastructure
//!
//! - [`alloc`]: allocator trait, heap and counting base allocators
//! - [`arena`]: bump allocator with temp sections
//! - [`array`]: growable array over any [`alloc::Allocator`]

pub mod alloc;
pub mod arena;
pub mod array;
