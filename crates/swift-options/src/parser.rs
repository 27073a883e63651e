//! Driver argv parser.
//!
//! Parses driver command-line arguments against the option table:
//! - Flags: `-emit-library`, `-wmo`
//! - Separate arguments: `-module-name App` or `-module-name=App`
//! - Joined-or-separate arguments: `-DDEBUG`, `-D DEBUG`
//! - Bare words, and everything after `--`, are positional inputs

use serde::Serialize;
use thiserror::Error;

use crate::table::{Opt, OptionKind};

/// Errors produced while parsing argv.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unknown option '{0}'")]
    UnknownOption(String),

    #[error("missing argument value for '{0}'")]
    MissingArgument(String),

    #[error("option '{0}' does not take an argument")]
    UnexpectedArgument(String),
}

/// One parsed occurrence of an option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedOption {
    pub option: Opt,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
}

impl ParsedOption {
    pub fn flag(option: Opt) -> Self {
        Self {
            option,
            argument: None,
        }
    }

    pub fn with_argument(option: Opt, argument: impl Into<String>) -> Self {
        Self {
            option,
            argument: Some(argument.into()),
        }
    }

    pub fn input(path: impl Into<String>) -> Self {
        Self::with_argument(Opt::Input, path)
    }
}

/// Parsed driver arguments, in command-line order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedOptions {
    options: Vec<ParsedOption>,
}

impl ParsedOptions {
    pub fn new(options: Vec<ParsedOption>) -> Self {
        Self { options }
    }

    pub fn push(&mut self, option: ParsedOption) {
        self.options.push(option);
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Parse driver argv (excluding the executable name) into structured form.
pub fn parse_arguments(argv: &[String]) -> Result<ParsedOptions, ParseError> {
    let mut result = ParsedOptions::default();
    let mut i = 0;
    let mut only_inputs = false;

    while i < argv.len() {
        let arg = &argv[i];
        i += 1;

        if only_inputs || arg == "-" || !arg.starts_with('-') {
            result.push(ParsedOption::input(arg.as_str()));
            continue;
        }

        if arg == "--" {
            only_inputs = true;
            continue;
        }

        if let Some(option) = Opt::from_spelling(arg) {
            if option.takes_argument() {
                let value = argv
                    .get(i)
                    .ok_or_else(|| ParseError::MissingArgument(arg.clone()))?;
                i += 1;
                result.push(ParsedOption::with_argument(option, value.as_str()));
            } else {
                result.push(ParsedOption::flag(option));
            }
            continue;
        }

        // `-name=value`
        if let Some((name, value)) = arg.split_once('=') {
            if let Some(option) = Opt::from_spelling(name) {
                if !option.takes_argument() {
                    return Err(ParseError::UnexpectedArgument(name.to_string()));
                }
                result.push(ParsedOption::with_argument(option, value));
                continue;
            }
        }

        if let Some(option) = Opt::joined_prefix_of(arg) {
            debug_assert_eq!(option.kind(), OptionKind::JoinedOrSeparate);
            let value = &arg[option.spelling().len()..];
            result.push(ParsedOption::with_argument(option, value));
            continue;
        }

        return Err(ParseError::UnknownOption(arg.clone()));
    }

    Ok(result)
}

/// Query surface over parsed options.
///
/// The planner only ever reads flags through this trait, so alternative
/// option sources (a frontend invocation, a test double) can stand in for
/// [`ParsedOptions`].
pub trait FlagSource {
    /// All parsed options in command-line order.
    fn options(&self) -> &[ParsedOption];

    /// The last option present from `group`, if any.
    fn last_in_group(&self, group: crate::OptionGroup) -> Option<&ParsedOption> {
        self.options()
            .iter()
            .rev()
            .find(|parsed| parsed.option.group() == Some(group))
    }

    fn contains(&self, option: Opt) -> bool {
        self.options().iter().any(|parsed| parsed.option == option)
    }

    fn contains_any(&self, options: &[Opt]) -> bool {
        self.options()
            .iter()
            .any(|parsed| options.contains(&parsed.option))
    }

    /// Resolve a positive/negative flag pair; the last one present wins.
    fn has_flag(&self, positive: Opt, negative: Opt, default: bool) -> bool {
        self.options()
            .iter()
            .rev()
            .find_map(|parsed| {
                if parsed.option == positive {
                    Some(true)
                } else if parsed.option == negative {
                    Some(false)
                } else {
                    None
                }
            })
            .unwrap_or(default)
    }

    /// Argument of the last occurrence of `option`.
    fn last_argument(&self, option: Opt) -> Option<&str> {
        self.options()
            .iter()
            .rev()
            .find(|parsed| parsed.option == option)
            .and_then(|parsed| parsed.argument.as_deref())
    }

    /// Arguments of every occurrence of `option`, in order.
    fn all_arguments(&self, option: Opt) -> Vec<&str> {
        self.options()
            .iter()
            .filter(|parsed| parsed.option == option)
            .filter_map(|parsed| parsed.argument.as_deref())
            .collect()
    }

    /// Positional input paths.
    fn inputs(&self) -> Vec<&str> {
        self.all_arguments(Opt::Input)
    }
}

impl FlagSource for ParsedOptions {
    fn options(&self) -> &[ParsedOption] {
        &self.options
    }
}
