//! Command-line configuration.
//!
//! Arguments use the `-name:value` form and are scanned once, in any order:
//!
//! ```text
//! tv-renamer -options:print,noact -paths:/mnt/media/
//! ```

use crate::error::{RenameError, Result};

const KNOWN_OPTIONS: [&str; 5] = ["print", "noact", "doubleep", "keepep", "preserve"];

/// The five recognized behavior switches.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Print every planned rename as an aligned "old -> new" line.
    pub print: bool,
    /// Dry run: report, but never touch the filesystem.
    pub noact: bool,
    /// Each video file holds two aired episodes.
    pub doubleep: bool,
    /// Keep the file's original number as the episode number.
    pub keepep: bool,
    /// Preserve the filename, replacing only the marker token.
    pub preserve: bool,
}

/// Immutable run configuration, parsed once and read by every operation.
#[derive(Debug, Clone)]
pub struct Config {
    pub options: Options,
    /// Root directories to process, in the order supplied.
    pub paths: Vec<String>,
    /// Placeholder token replaced by the episode label in `preserve` mode.
    pub marker: String,
    /// Separator inserted before a spliced-in label.
    pub field_separator: String,
    /// Separator inserted after the label (and between combined episodes).
    pub episode_separator: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            options: Options::default(),
            paths: Vec::new(),
            marker: "***".to_string(),
            field_separator: " - ".to_string(),
            episode_separator: " - ".to_string(),
        }
    }
}

impl Config {
    /// Scan the raw argument list (without the binary name) into a config.
    ///
    /// Unknown option names and unrecognized argument tokens are warned
    /// about on stderr but accepted. An empty `-marker:` is rejected: an
    /// empty pattern matches at position 0 of every name.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Self::default();

        for arg in args {
            if let Some(value) = arg.strip_prefix("-options:") {
                for name in value.split(',') {
                    match name {
                        "print" => config.options.print = true,
                        "noact" => config.options.noact = true,
                        "doubleep" => config.options.doubleep = true,
                        "keepep" => config.options.keepep = true,
                        "preserve" => config.options.preserve = true,
                        "" => {}
                        other => {
                            eprintln!(
                                "⚠ Unknown option '{}' ignored (known: {})",
                                other,
                                KNOWN_OPTIONS.join(", ")
                            );
                        }
                    }
                }
            } else if let Some(value) = arg.strip_prefix("-paths:") {
                // An empty first field means no usable paths in this token.
                // Paths are double-comma delimited.
                if !value.split(',').next().unwrap_or("").is_empty() {
                    config
                        .paths
                        .extend(value.split(",,").filter(|p| !p.is_empty()).map(String::from));
                }
            } else if let Some(value) = arg.strip_prefix("-marker:") {
                if value.is_empty() {
                    return Err(RenameError::MalformedArgument(
                        "-marker: requires a non-empty token".to_string(),
                    ));
                }
                config.marker = value.to_string();
            } else if let Some(value) = arg.strip_prefix("-fseparator:") {
                config.field_separator = value.to_string();
            } else if let Some(value) = arg.strip_prefix("-eseparator:") {
                config.episode_separator = value.to_string();
            } else {
                eprintln!("⚠ Unrecognized argument '{}' ignored", arg);
            }
        }

        for path in &mut config.paths {
            if path != "/" {
                path.push('/');
            }
        }

        Ok(config)
    }
}
