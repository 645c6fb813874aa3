use crate::config::{CsspathConfig, check_prefix};
use crate::document::{Document, DocumentError};
use crate::evaluator::Functions;
use crate::executor::{QueryError, QueryExecutor};
use crate::formatter::{OutputFormat, format_matches};
use csspath_core::{CompileError, Compiler};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Query(#[from] QueryError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Unknown directive: !{0}")]
    UnknownDirective(String),
    #[error("Invalid argument for !{directive}: {reason}")]
    InvalidArgument { directive: String, reason: String },
}

/// State shared by the lines of a script or REPL session.
///
/// A line is either a selector or a directive starting with `!`:
/// `!load <file>`, `!cache on|off|clear|status`, `!format text|json|xpath`,
/// `!prefix <prefix>`.
pub struct Session {
    compiler: Compiler,
    document: Option<Document>,
    format: OutputFormat,
    show_xpath: bool,
    functions: Functions,
}

impl Session {
    pub fn new(config: &CsspathConfig) -> Self {
        Self {
            compiler: Compiler::from_config(&config.compiler),
            document: None,
            format: config.output.format,
            show_xpath: config.output.show_xpath,
            functions: Functions::new(),
        }
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn with_document(mut self, document: Document) -> Self {
        self.document = Some(document);
        self
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Custom pseudo-functions available to selectors in this session.
    pub fn functions_mut(&mut self) -> &mut Functions {
        &mut self.functions
    }

    pub fn load_document(&mut self, path: &Path) -> Result<(), SessionError> {
        let document = Document::from_file(path)?;
        info!("Loaded document {} ({} nodes)", path.display(), document.len());
        self.document = Some(document);
        Ok(())
    }

    pub fn execute_line(&mut self, line: &str) -> Result<String, SessionError> {
        let line = line.trim();
        match line.strip_prefix('!') {
            Some(directive) => self.execute_directive(directive.trim()),
            None => self.execute_selector(line),
        }
    }

    fn execute_selector(&self, selector: &str) -> Result<String, SessionError> {
        let query = self.compiler.compile(selector)?;
        let xpath = query.to_xpath_with_prefix(self.compiler.prefix());
        let document = match (&self.document, self.format) {
            (Some(document), OutputFormat::Text | OutputFormat::Json) => document,
            _ => return Ok(xpath),
        };

        let matches = QueryExecutor::new(document)
            .with_evaluator(&self.functions)
            .execute(&query, document.root())?;
        let rendered = format_matches(document, &matches, self.format)?;

        if self.show_xpath {
            Ok(format!("{}\n{}", xpath, rendered))
        } else {
            Ok(rendered)
        }
    }

    fn execute_directive(&mut self, directive: &str) -> Result<String, SessionError> {
        let (name, arg) = match directive.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (directive, ""),
        };
        debug!(directive = name, arg, "session directive");

        match name {
            "load" => {
                if arg.is_empty() {
                    return Err(invalid(name, "expected a file path"));
                }
                self.load_document(Path::new(arg))?;
                Ok(format!("Loaded {}", arg))
            }
            "cache" => self.cache_directive(arg),
            "format" => {
                self.format = arg
                    .parse()
                    .map_err(|reason: String| invalid(name, &reason))?;
                Ok(format!("Output format: {}", self.format))
            }
            "prefix" => {
                if arg.is_empty() {
                    return Err(invalid(name, "expected a prefix such as // or .//"));
                }
                check_prefix(arg).map_err(|reason: String| invalid(name, &reason))?;
                self.compiler = self.compiler.clone().with_prefix(arg);
                Ok(format!("Prefix: {}", arg))
            }
            _ => Err(SessionError::UnknownDirective(name.to_string())),
        }
    }

    fn cache_directive(&self, arg: &str) -> Result<String, SessionError> {
        let cache = self.compiler.cache();
        match arg {
            "on" => {
                cache.set_enabled(true);
                Ok("Cache enabled".to_string())
            }
            "off" => {
                cache.set_enabled(false);
                Ok("Cache disabled".to_string())
            }
            "clear" => {
                cache.clear();
                Ok("Cache cleared".to_string())
            }
            "" | "status" => Ok(format!(
                "Cache {} ({} entries)",
                if cache.is_enabled() { "enabled" } else { "disabled" },
                cache.len()
            )),
            other => Err(invalid("cache", &format!("unknown mode '{}'", other))),
        }
    }
}

fn invalid(directive: &str, reason: &str) -> SessionError {
    SessionError::InvalidArgument {
        directive: directive.to_string(),
        reason: reason.to_string(),
    }
}
