//! Compiler mode resolution
//!
//! Decides what kind of compilation a driver invocation runs. Resolution is
//! pure: (driver kind, parsed flags) → exactly one [`CompilerMode`].
//!
//! Priority, first match wins:
//! 1. `-emit-pch`, `-emit-imported-modules`, `-index-file` → single compile;
//!    `-emit-pcm` → precompiled-module compile
//! 2. `-repl`, `-deprecated-integrated-repl`, `-lldb-repl` → REPL
//! 3. interactive driver → immediate with inputs, otherwise REPL
//! 4. whole-module optimization → single compile
//! 5. batch compile if the [`BatchModeSelection`] picks it, else standard

use serde::{Deserialize, Serialize};
use std::fmt;
use swift_options::{FlagSource, Opt, OptionGroup};

use crate::driver_kind::DriverKind;

/// Parameters for grouping inputs into multi-file jobs. Never mutated after
/// construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchModeInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_limit: Option<usize>,
}

impl BatchModeInfo {
    /// Read the batch payload from `-driver-batch-seed`, `-driver-batch-count`
    /// and `-driver-batch-size-limit`. Values that do not parse read as absent.
    pub fn from_flags(flags: &dyn FlagSource) -> Self {
        Self {
            seed: flags
                .last_argument(Opt::DriverBatchSeed)
                .and_then(|v| v.parse().ok()),
            count: flags
                .last_argument(Opt::DriverBatchCount)
                .and_then(|v| v.parse().ok()),
            size_limit: flags
                .last_argument(Opt::DriverBatchSizeLimit)
                .and_then(|v| v.parse().ok()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum CompilerMode {
    /// One frontend job per primary input.
    StandardCompile,
    /// Primary inputs grouped into multi-file frontend jobs.
    BatchCompile(BatchModeInfo),
    /// One frontend job for the whole module.
    SingleCompile,
    Repl,
    /// Compile and run in-process.
    Immediate,
    CompilePrecompiledModule,
}

/// Variant tag of a [`CompilerMode`], without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModeTag {
    StandardCompile,
    BatchCompile,
    SingleCompile,
    Repl,
    Immediate,
    CompilePrecompiledModule,
}

/// Properties derived from a mode's tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModeTraits {
    /// Frontend jobs take per-file `-primary-file` inputs.
    pub uses_primary_file_inputs: bool,
    /// A single whole-module frontend job.
    pub is_single_compilation: bool,
    /// Goes through the standard compile/link job planning.
    pub is_standard_compilation_for_planning: bool,
    pub supports_bridging_pch: bool,
}

const fn traits(uses_primary: bool, single: bool, planning: bool, bridging_pch: bool) -> ModeTraits {
    ModeTraits {
        uses_primary_file_inputs: uses_primary,
        is_single_compilation: single,
        is_standard_compilation_for_planning: planning,
        supports_bridging_pch: bridging_pch,
    }
}

impl ModeTag {
    pub const fn traits(self) -> ModeTraits {
        match self {
            ModeTag::StandardCompile => traits(true, false, true, true),
            ModeTag::BatchCompile => traits(true, false, true, true),
            ModeTag::SingleCompile => traits(false, true, true, true),
            ModeTag::Repl => traits(false, false, false, false),
            ModeTag::Immediate => traits(false, false, false, false),
            ModeTag::CompilePrecompiledModule => traits(false, true, false, true),
        }
    }
}

impl CompilerMode {
    pub fn tag(&self) -> ModeTag {
        match self {
            CompilerMode::StandardCompile => ModeTag::StandardCompile,
            CompilerMode::BatchCompile(_) => ModeTag::BatchCompile,
            CompilerMode::SingleCompile => ModeTag::SingleCompile,
            CompilerMode::Repl => ModeTag::Repl,
            CompilerMode::Immediate => ModeTag::Immediate,
            CompilerMode::CompilePrecompiledModule => ModeTag::CompilePrecompiledModule,
        }
    }

    pub fn traits(&self) -> ModeTraits {
        self.tag().traits()
    }

    pub fn uses_primary_file_inputs(&self) -> bool {
        self.traits().uses_primary_file_inputs
    }

    pub fn is_single_compilation(&self) -> bool {
        self.traits().is_single_compilation
    }

    pub fn is_standard_compilation_for_planning(&self) -> bool {
        self.traits().is_standard_compilation_for_planning
    }

    pub fn supports_bridging_pch(&self) -> bool {
        self.traits().supports_bridging_pch
    }

    pub fn batch_mode_info(&self) -> Option<&BatchModeInfo> {
        match self {
            CompilerMode::BatchCompile(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for CompilerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompilerMode::StandardCompile => write!(f, "standard compilation"),
            CompilerMode::BatchCompile(_) => write!(f, "batch compilation"),
            CompilerMode::SingleCompile => write!(f, "whole module optimization"),
            CompilerMode::Repl => write!(f, "read-eval-print-loop compilation"),
            CompilerMode::Immediate => write!(f, "immediate compilation"),
            CompilerMode::CompilePrecompiledModule => write!(f, "precompile Clang module"),
        }
    }
}

/// Decides whether a compilation that would otherwise be standard runs in
/// batch mode, and with which payload.
pub trait BatchModeSelection {
    fn select(&self, flags: &dyn FlagSource) -> Option<BatchModeInfo>;
}

/// Never selects batch mode.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardOnly;

impl BatchModeSelection for StandardOnly {
    fn select(&self, _flags: &dyn FlagSource) -> Option<BatchModeInfo> {
        None
    }
}

impl<F> BatchModeSelection for F
where
    F: Fn(&dyn FlagSource) -> Option<BatchModeInfo>,
{
    fn select(&self, flags: &dyn FlagSource) -> Option<BatchModeInfo> {
        self(flags)
    }
}

const SINGLE_COMPILE_OUTPUTS: &[Opt] = &[Opt::EmitPch, Opt::EmitImportedModules, Opt::IndexFile];
const REPL_MODES: &[Opt] = &[Opt::Repl, Opt::DeprecatedIntegratedRepl, Opt::LldbRepl];

/// Resolve the compiler mode with batch mode never selected.
pub fn compute_compiler_mode(driver_kind: DriverKind, flags: &dyn FlagSource) -> CompilerMode {
    compute_compiler_mode_with(driver_kind, flags, &StandardOnly)
}

/// Resolve the compiler mode, consulting `batch` for the final
/// standard-vs-batch decision.
pub fn compute_compiler_mode_with(
    driver_kind: DriverKind,
    flags: &dyn FlagSource,
    batch: &dyn BatchModeSelection,
) -> CompilerMode {
    if let Some(output) = flags.last_in_group(OptionGroup::Modes) {
        if SINGLE_COMPILE_OUTPUTS.contains(&output.option) {
            return CompilerMode::SingleCompile;
        }
        if output.option == Opt::EmitPcm {
            return CompilerMode::CompilePrecompiledModule;
        }
    }

    if flags.contains_any(REPL_MODES) {
        return CompilerMode::Repl;
    }

    if driver_kind.is_interactive() {
        return if flags.inputs().is_empty() {
            CompilerMode::Repl
        } else {
            CompilerMode::Immediate
        };
    }

    if flags.has_flag(Opt::WholeModuleOptimization, Opt::NoWholeModuleOptimization, false) {
        return CompilerMode::SingleCompile;
    }

    match batch.select(flags) {
        Some(info) => CompilerMode::BatchCompile(info),
        None => CompilerMode::StandardCompile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swift_options::{parse_arguments, ParsedOptions};

    fn parse(args: &[&str]) -> ParsedOptions {
        let argv: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        parse_arguments(&argv).unwrap()
    }

    fn mode(kind: DriverKind, args: &[&str]) -> CompilerMode {
        compute_compiler_mode(kind, &parse(args))
    }

    #[test]
    fn test_default_is_standard() {
        assert_eq!(mode(DriverKind::Batch, &["a.swift"]), CompilerMode::StandardCompile);
    }

    #[test]
    fn test_pch_imported_modules_index_file_are_single() {
        assert_eq!(mode(DriverKind::Batch, &["-emit-pch", "h.h"]), CompilerMode::SingleCompile);
        assert_eq!(
            mode(DriverKind::Batch, &["-emit-imported-modules", "a.swift"]),
            CompilerMode::SingleCompile
        );
        assert_eq!(mode(DriverKind::Batch, &["-index-file", "a.swift"]), CompilerMode::SingleCompile);
    }

    #[test]
    fn test_single_compile_output_beats_repl_and_interactive() {
        assert_eq!(
            mode(DriverKind::Interactive, &["-repl", "-emit-pch"]),
            CompilerMode::SingleCompile
        );
    }

    #[test]
    fn test_emit_pcm_is_precompiled_module() {
        assert_eq!(
            mode(DriverKind::Batch, &["-emit-pcm", "module.modulemap"]),
            CompilerMode::CompilePrecompiledModule
        );
    }

    #[test]
    fn test_repl_flags() {
        for flag in ["-repl", "-deprecated-integrated-repl", "-lldb-repl"] {
            assert_eq!(mode(DriverKind::Batch, &[flag]), CompilerMode::Repl, "{}", flag);
        }
    }

    #[test]
    fn test_repl_flag_beats_wmo() {
        assert_eq!(mode(DriverKind::Batch, &["-wmo", "-repl"]), CompilerMode::Repl);
    }

    #[test]
    fn test_interactive_with_and_without_inputs() {
        assert_eq!(mode(DriverKind::Interactive, &["main.swift"]), CompilerMode::Immediate);
        assert_eq!(mode(DriverKind::Interactive, &[]), CompilerMode::Repl);
    }

    #[test]
    fn test_interactive_beats_wmo() {
        assert_eq!(mode(DriverKind::Interactive, &["-wmo", "a.swift"]), CompilerMode::Immediate);
    }

    #[test]
    fn test_whole_module_optimization() {
        assert_eq!(mode(DriverKind::Batch, &["-wmo", "a.swift"]), CompilerMode::SingleCompile);
        assert_eq!(
            mode(DriverKind::Batch, &["-wmo", "-no-whole-module-optimization", "a.swift"]),
            CompilerMode::StandardCompile
        );
    }

    #[test]
    fn test_batch_selection_extension_point() {
        let flags = parse(&["-driver-batch-seed", "7", "-driver-batch-count", "3", "a.swift"]);
        let select = |flags: &dyn FlagSource| Some(BatchModeInfo::from_flags(flags));

        let resolved = compute_compiler_mode_with(DriverKind::Batch, &flags, &select);
        assert_eq!(
            resolved,
            CompilerMode::BatchCompile(BatchModeInfo {
                seed: Some(7),
                count: Some(3),
                size_limit: None,
            })
        );
        assert_eq!(resolved.batch_mode_info().and_then(|i| i.seed), Some(7));
    }

    #[test]
    fn test_batch_selection_not_consulted_for_wmo() {
        let flags = parse(&["-wmo", "a.swift"]);
        let select = |_: &dyn FlagSource| Some(BatchModeInfo::default());
        assert_eq!(
            compute_compiler_mode_with(DriverKind::Batch, &flags, &select),
            CompilerMode::SingleCompile
        );
    }

    #[test]
    fn test_batch_info_ignores_unparseable_values() {
        let flags = parse(&["-driver-batch-size-limit", "lots"]);
        assert_eq!(BatchModeInfo::from_flags(&flags), BatchModeInfo::default());
    }

    #[test]
    fn test_derived_predicates_table() {
        let standard = CompilerMode::StandardCompile;
        assert!(standard.uses_primary_file_inputs());
        assert!(!standard.is_single_compilation());
        assert!(standard.is_standard_compilation_for_planning());
        assert!(standard.supports_bridging_pch());

        let batch = CompilerMode::BatchCompile(BatchModeInfo::default());
        assert_eq!(batch.traits(), standard.traits());

        let single = CompilerMode::SingleCompile;
        assert!(!single.uses_primary_file_inputs());
        assert!(single.is_single_compilation());
        assert!(single.is_standard_compilation_for_planning());

        for interactive in [CompilerMode::Repl, CompilerMode::Immediate] {
            assert!(!interactive.uses_primary_file_inputs());
            assert!(!interactive.is_single_compilation());
            assert!(!interactive.is_standard_compilation_for_planning());
            assert!(!interactive.supports_bridging_pch());
        }

        let pcm = CompilerMode::CompilePrecompiledModule;
        assert!(pcm.is_single_compilation());
        assert!(!pcm.is_standard_compilation_for_planning());
        assert!(pcm.supports_bridging_pch());
    }

    #[test]
    fn test_every_driver_kind_resolves() {
        let flag_sets: &[&[&str]] = &[&[], &["a.swift"], &["-wmo", "a.swift"], &["-repl"], &["-typecheck"]];
        for kind in [
            DriverKind::Interactive,
            DriverKind::Batch,
            DriverKind::Frontend,
            DriverKind::ModuleWrap,
            DriverKind::AutolinkExtract,
            DriverKind::Indent,
        ] {
            for args in flag_sets {
                let resolved = mode(kind, args);
                assert_eq!(resolved.traits(), resolved.tag().traits());
            }
        }
    }
}
