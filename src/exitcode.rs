//! Standard exit codes (BSD sysexits.h compatible)

/// Input too combinatorially large to expand within the configured limits
pub const TOOBIG: i32 = 3;

/// Command line usage error
pub const USAGE: i32 = 64;

/// Data format error (input is not a valid tree)
pub const DATAERR: i32 = 65;

/// Cannot open input
pub const NOINPUT: i32 = 66;

/// Service unavailable (parser)
pub const UNAVAILABLE: i32 = 69;

/// Internal software error
pub const SOFTWARE: i32 = 70;

/// Input/output error
pub const IOERR: i32 = 74;

/// Configuration error
pub const CONFIG: i32 = 78;
