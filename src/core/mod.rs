//! Core parsing primitives
//!
//! This module contains the building blocks the node parser sits on:
//! - Slice: non-owning byte views with search, compare and integer parsing
//! - Scanner: memchr-accelerated cursor with line/column tracking
//! - Tokenizer: three-mode state machine producing tokens
//! - Attributes: attribute values collected from tags

pub mod attributes;
pub mod scanner;
pub mod slice;
pub mod tokenizer;
