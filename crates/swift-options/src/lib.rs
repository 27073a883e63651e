//! Option table and argv parser for the Swift driver planner.
//!
//! Parses driver argv into [`ParsedOptions`] and exposes the read-only
//! [`FlagSource`] surface the planner consumes, together with per-option
//! metadata (spelling, group, incremental relevance).

mod parser;
mod table;

pub use parser::{parse_arguments, FlagSource, ParseError, ParsedOption, ParsedOptions};
pub use table::{Opt, OptionGroup, OptionInfo, OptionKind, OPTIONS};
