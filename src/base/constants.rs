//! Domain constants shared across the crate.

/// Extensions of TTCN-3 source files handled by the project source parser.
pub const SUPPORTED_TTCN3_EXTENSIONS: &[&str] = &["ttcn3", "ttcn"];

/// Extension of TTCN-3 files that still need preprocessing.
pub const TTCNPP_EXTENSION: &str = "ttcnpp";

/// Name of the synthetic type every module owns.
pub const ANYTYPE_NAME: &str = "anytype";

/// Sentinel emitted by code generation for nodes that cannot be generated.
pub const FATAL_ERROR: &str = "FATAL_ERROR";

/// Returns `true` if files with this extension are parsed as TTCN-3 modules.
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_TTCN3_EXTENSIONS.contains(&extension) || extension == TTCNPP_EXTENSION
}
