//! Reader Module
//!
//! The pull side of the crate:
//! - Source: in-memory, copied, streamed or memory-mapped input
//! - Parser: node-at-a-time pull parser
//! - Node: the structural units it produces
//! - Lookahead: one-token buffer between tokenizer and parser

pub mod lookahead;
pub mod node;
pub mod parser;
pub mod source;
