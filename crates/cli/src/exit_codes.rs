//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Scripts rely on these values; treat them as part of the shell contract.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | Issues found (`run --strict`)            |
//! | 2       | Universal        | CLI usage error (bad args, bad rate)     |
//! | 60-69   | recon            | Reconciliation run failures              |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// `run --strict` completed but the issue report is not empty.
/// Like `diff(1)`, exit 1 means "sources differ."
pub const EXIT_ISSUES: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Recon (60-69)
// =============================================================================

/// Config file unreadable, unparseable, or failed validation.
pub const EXIT_RECON_INVALID_CONFIG: u8 = 60;

/// A required column could not be found in an input file.
pub const EXIT_RECON_SCHEMA: u8 = 61;

/// Input file missing, unreadable, or in an unsupported format.
pub const EXIT_RECON_INPUT: u8 = 62;

/// Could not write the JSON result or the export file.
pub const EXIT_RECON_OUTPUT: u8 = 63;
