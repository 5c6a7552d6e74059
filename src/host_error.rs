//! Failures that originate outside the compilation pipeline itself: file
//! I/O, temporary-file handling, and invoking the external C compiler.
//! Front-end diagnostics (`LexError`/`ParseError`/`TypecheckError`) are
//! rendered directly by their own `Display` impls; this enum exists for
//! the host-side operations the core pipeline never touches.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("could not read '{}': {source}", path.display())]
    ReadSource { path: PathBuf, #[source] source: std::io::Error },

    #[error("could not create a temporary file for the generated C source: {0}")]
    TempFile(#[source] std::io::Error),

    #[error("could not write the generated C source: {0}")]
    WriteGenerated(#[source] std::io::Error),

    #[error("could not invoke '{command}': {source}")]
    Invoke { command: String, #[source] source: std::io::Error },

    #[error("'{command}' exited with status {status}")]
    CompilerFailed { command: String, status: ExitStatus },

    #[error("could not write output '{}': {source}", path.display())]
    WriteOutput { path: PathBuf, #[source] source: std::io::Error },
}
