//! Static option table.
//!
//! Each driver option carries its canonical spelling, accepted aliases, how it
//! consumes arguments, the group it belongs to, and whether changing it
//! between runs can change what incremental compilation must redo.

use serde::{Serialize, Serializer};
use std::fmt;

/// How an option consumes its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Boolean flag, no argument.
    Flag,
    /// Argument is the next argv element (`-o out`), or `-o=out`.
    Separate,
    /// Argument is glued on (`-DFOO`) or the next argv element (`-D FOO`).
    JoinedOrSeparate,
    /// Positional input file.
    Input,
}

/// Mutually-exclusive option families. The last member present wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionGroup {
    /// Options selecting what the driver produces.
    Modes,
    /// Optimization level.
    Optimization,
    /// Debug info level.
    Debug,
}

/// Static metadata for one option.
#[derive(Debug, Clone, Copy)]
pub struct OptionInfo {
    pub option: Opt,
    pub spelling: &'static str,
    pub aliases: &'static [&'static str],
    pub kind: OptionKind,
    pub group: Option<OptionGroup>,
    pub affects_incremental_build: bool,
}

macro_rules! option_table {
    ($(
        $variant:ident => $spelling:literal, $kind:ident, $group:expr, $incremental:expr, [$($alias:literal),*];
    )*) => {
        /// A driver option known to the option table.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Opt {
            $($variant,)*
        }

        /// Every option, in declaration order.
        pub const OPTIONS: &[OptionInfo] = &[
            $(OptionInfo {
                option: Opt::$variant,
                spelling: $spelling,
                aliases: &[$($alias),*],
                kind: OptionKind::$kind,
                group: $group,
                affects_incremental_build: $incremental,
            },)*
        ];

        impl Opt {
            /// Static metadata for this option.
            pub const fn info(self) -> OptionInfo {
                match self {
                    $(Opt::$variant => OptionInfo {
                        option: Opt::$variant,
                        spelling: $spelling,
                        aliases: &[$($alias),*],
                        kind: OptionKind::$kind,
                        group: $group,
                        affects_incremental_build: $incremental,
                    },)*
                }
            }
        }
    };
}

const MODES: Option<OptionGroup> = Some(OptionGroup::Modes);
const OPT_LEVEL: Option<OptionGroup> = Some(OptionGroup::Optimization);
const DEBUG: Option<OptionGroup> = Some(OptionGroup::Debug);
const NONE: Option<OptionGroup> = None;

option_table! {
    EmitExecutable => "-emit-executable", Flag, MODES, false, [];
    EmitLibrary => "-emit-library", Flag, MODES, false, [];
    EmitObject => "-emit-object", Flag, MODES, false, ["-c"];
    EmitAssembly => "-emit-assembly", Flag, MODES, false, ["-S"];
    EmitSil => "-emit-sil", Flag, MODES, false, [];
    EmitSilgen => "-emit-silgen", Flag, MODES, false, [];
    EmitSib => "-emit-sib", Flag, MODES, false, [];
    EmitSibgen => "-emit-sibgen", Flag, MODES, false, [];
    EmitIr => "-emit-ir", Flag, MODES, false, [];
    EmitBc => "-emit-bc", Flag, MODES, false, [];
    DumpAst => "-dump-ast", Flag, MODES, false, [];
    EmitPch => "-emit-pch", Flag, MODES, false, [];
    EmitPcm => "-emit-pcm", Flag, MODES, false, [];
    EmitImportedModules => "-emit-imported-modules", Flag, MODES, false, [];
    IndexFile => "-index-file", Flag, MODES, false, [];
    UpdateCode => "-update-code", Flag, MODES, false, [];
    Parse => "-parse", Flag, MODES, false, [];
    ResolveImports => "-resolve-imports", Flag, MODES, false, [];
    Typecheck => "-typecheck", Flag, MODES, false, [];
    DumpParse => "-dump-parse", Flag, MODES, false, [];
    PrintAst => "-print-ast", Flag, MODES, false, [];
    DumpScopeMaps => "-dump-scope-maps", Separate, MODES, false, [];
    DumpTypeRefinementContexts => "-dump-type-refinement-contexts", Flag, MODES, false, [];
    DumpInterfaceHash => "-dump-interface-hash", Flag, MODES, false, [];
    DumpTypeInfo => "-dump-type-info", Flag, MODES, false, [];
    VerifyDebugInfo => "-verify-debug-info", Flag, MODES, false, [];
    Repl => "-repl", Flag, MODES, false, [];
    DeprecatedIntegratedRepl => "-deprecated-integrated-repl", Flag, MODES, false, [];
    LldbRepl => "-lldb-repl", Flag, MODES, false, [];

    EmitModule => "-emit-module", Flag, NONE, false, [];
    EmitModulePath => "-emit-module-path", Separate, NONE, false, [];
    Static => "-static", Flag, NONE, false, [];
    WholeModuleOptimization => "-whole-module-optimization", Flag, NONE, false, ["-wmo"];
    NoWholeModuleOptimization => "-no-whole-module-optimization", Flag, NONE, false, [];
    Incremental => "-incremental", Flag, NONE, false, [];
    OutputFileMap => "-output-file-map", Separate, NONE, false, [];
    ModuleName => "-module-name", Separate, NONE, true, [];
    Output => "-o", Separate, NONE, false, [];
    Define => "-D", JoinedOrSeparate, NONE, true, [];
    Onone => "-Onone", Flag, OPT_LEVEL, true, [];
    O => "-O", Flag, OPT_LEVEL, true, [];
    Osize => "-Osize", Flag, OPT_LEVEL, true, [];
    G => "-g", Flag, DEBUG, true, [];
    Gnone => "-gnone", Flag, DEBUG, true, [];
    Sdk => "-sdk", Separate, NONE, true, [];
    Target => "-target", Separate, NONE, true, [];
    SwiftVersion => "-swift-version", Separate, NONE, true, [];
    ImportPath => "-I", JoinedOrSeparate, NONE, true, [];
    FrameworkPath => "-F", JoinedOrSeparate, NONE, true, [];
    EnableTesting => "-enable-testing", Flag, NONE, true, [];
    EnableLibraryEvolution => "-enable-library-evolution", Flag, NONE, true, [];
    Jobs => "-j", JoinedOrSeparate, NONE, false, [];
    Verbose => "-v", Flag, NONE, false, [];
    DriverBatchSeed => "-driver-batch-seed", Separate, NONE, false, [];
    DriverBatchCount => "-driver-batch-count", Separate, NONE, false, [];
    DriverBatchSizeLimit => "-driver-batch-size-limit", Separate, NONE, false, [];
    WorkingDirectory => "-working-directory", Separate, NONE, false, [];
    Input => "<input>", Input, NONE, false, [];
}

impl Opt {
    /// Canonical spelling, e.g. `-emit-library`.
    pub const fn spelling(self) -> &'static str {
        self.info().spelling
    }

    pub const fn kind(self) -> OptionKind {
        self.info().kind
    }

    pub const fn group(self) -> Option<OptionGroup> {
        self.info().group
    }

    /// Whether a change to this option between runs invalidates incremental state.
    pub const fn affects_incremental_build(self) -> bool {
        self.info().affects_incremental_build
    }

    /// Whether this is the positional input pseudo-option.
    pub const fn is_input_positional(self) -> bool {
        matches!(self.info().kind, OptionKind::Input)
    }

    pub const fn takes_argument(self) -> bool {
        matches!(
            self.info().kind,
            OptionKind::Separate | OptionKind::JoinedOrSeparate
        )
    }

    /// Look up an option by its exact spelling or one of its aliases.
    pub fn from_spelling(spelling: &str) -> Option<Opt> {
        OPTIONS
            .iter()
            .filter(|info| info.kind != OptionKind::Input)
            .find(|info| info.spelling == spelling || info.aliases.contains(&spelling))
            .map(|info| info.option)
    }

    /// Find the joined-argument option whose spelling prefixes `arg`
    /// (e.g. `-DDEBUG` → `-D`), preferring the longest spelling.
    pub fn joined_prefix_of(arg: &str) -> Option<Opt> {
        OPTIONS
            .iter()
            .filter(|info| info.kind == OptionKind::JoinedOrSeparate)
            .filter(|info| arg.len() > info.spelling.len() && arg.starts_with(info.spelling))
            .max_by_key(|info| info.spelling.len())
            .map(|info| info.option)
    }
}

impl fmt::Display for Opt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spelling())
    }
}

impl Serialize for Opt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.spelling())
    }
}
