pub mod ast;
pub mod cache;
pub mod compiler;
pub mod config;
pub mod parser;
pub mod path;
pub mod translator;

pub use ast::*;
pub use cache::{QueryCache, SelectorCache};
pub use compiler::{
    cache_enabled, clear_cache, compile, compile_uncached, set_cache_enabled, xpath_for, Compiler,
};
pub use config::{CacheScope, CompilerConfig};
pub use parser::{parse, ParseError, Rule, SelectorParser};
pub use path::{PathQuery, DEFAULT_PREFIX, RELATIVE_PREFIX};
pub use translator::{translate, TranslationError};

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Syntax error: {0}")]
    Syntax(#[from] ParseError),
    #[error("Unsupported selector: {0}")]
    Unsupported(#[from] TranslationError),
}

impl CompileError {
    /// Byte offset of the offending token for syntax errors.
    pub fn position(&self) -> Option<usize> {
        match self {
            CompileError::Syntax(e) => e.position(),
            CompileError::Unsupported(_) => None,
        }
    }
}
