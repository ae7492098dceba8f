//! Command implementations

pub mod check;
pub mod preview;

use anyhow::bail;
use hotwidget_kernel::source::is_remote;
use std::path::PathBuf;

/// A module or stylesheet given on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceArg {
    File(PathBuf),
    Url(String),
}

impl SourceArg {
    /// URLs are taken as-is; anything else must be an existing file
    pub fn resolve(arg: &str) -> anyhow::Result<Self> {
        if is_remote(arg) {
            return Ok(SourceArg::Url(arg.to_string()));
        }
        let path = PathBuf::from(arg);
        if !path.is_file() {
            bail!("{} is neither a file nor an http(s) URL", arg);
        }
        Ok(SourceArg::File(path))
    }
}
