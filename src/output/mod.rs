//! Primary output resolution
//!
//! Decides the compiler's primary output kind and whether (and how) to link.
//! A mode flag, when present, decides both exclusively through a fixed
//! table. The table must cover every option in the modes group: reaching an
//! uncovered one means the option table grew without this resolver and
//! aborts the run.

use serde::{Deserialize, Serialize};
use std::fmt;
use swift_options::{FlagSource, Opt, OptionGroup};

use crate::driver_kind::DriverKind;
use crate::file_type::FileType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkOutputType {
    Executable,
    StaticLibrary,
    DynamicLibrary,
}

impl fmt::Display for LinkOutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkOutputType::Executable => write!(f, "executable"),
            LinkOutputType::StaticLibrary => write!(f, "static library"),
            LinkOutputType::DynamicLibrary => write!(f, "dynamic library"),
        }
    }
}

/// Primary outputs of a driver invocation. `None` compiler output means no
/// compiler artifact; `None` linker output means no link step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputKinds {
    pub compiler_output: Option<FileType>,
    pub linker_output: Option<LinkOutputType>,
}

impl OutputKinds {
    pub const fn new(compiler_output: Option<FileType>, linker_output: Option<LinkOutputType>) -> Self {
        Self {
            compiler_output,
            linker_output,
        }
    }

    pub fn links(&self) -> bool {
        self.linker_output.is_some()
    }
}

/// Resolve the primary output kinds for an invocation.
pub fn compute_output_kinds(flags: &dyn FlagSource, driver_kind: DriverKind) -> OutputKinds {
    let default_compiler_output = if driver_kind.is_interactive() {
        None
    } else {
        Some(FileType::Object)
    };

    if let Some(mode) = flags.last_in_group(OptionGroup::Modes) {
        return output_kinds_for_mode(mode.option, flags);
    }

    if flags.contains_any(&[Opt::EmitModule, Opt::EmitModulePath]) {
        return OutputKinds::new(Some(FileType::SwiftModule), None);
    }

    if !driver_kind.is_interactive() {
        return OutputKinds::new(default_compiler_output, Some(LinkOutputType::Executable));
    }

    OutputKinds::new(default_compiler_output, None)
}

fn output_kinds_for_mode(mode: Opt, flags: &dyn FlagSource) -> OutputKinds {
    let compile_only = |file_type: FileType| OutputKinds::new(Some(file_type), None);

    match mode {
        Opt::EmitExecutable => {
            OutputKinds::new(Some(FileType::Object), Some(LinkOutputType::Executable))
        }
        Opt::EmitLibrary => {
            let link = if flags.contains(Opt::Static) {
                LinkOutputType::StaticLibrary
            } else {
                LinkOutputType::DynamicLibrary
            };
            OutputKinds::new(Some(FileType::Object), Some(link))
        }
        Opt::EmitObject => compile_only(FileType::Object),
        Opt::EmitAssembly => compile_only(FileType::Assembly),
        Opt::EmitSil => compile_only(FileType::Sil),
        Opt::EmitSilgen => compile_only(FileType::RawSil),
        Opt::EmitSib => compile_only(FileType::Sib),
        Opt::EmitSibgen => compile_only(FileType::RawSib),
        Opt::EmitIr => compile_only(FileType::LlvmIr),
        Opt::EmitBc => compile_only(FileType::LlvmBitcode),
        Opt::DumpAst => compile_only(FileType::Ast),
        Opt::EmitPch => compile_only(FileType::Pch),
        Opt::EmitPcm => compile_only(FileType::Pcm),
        Opt::EmitImportedModules => compile_only(FileType::ImportedModules),
        Opt::IndexFile => compile_only(FileType::IndexData),
        Opt::UpdateCode => compile_only(FileType::Remap),
        Opt::Parse
        | Opt::ResolveImports
        | Opt::Typecheck
        | Opt::DumpParse
        | Opt::PrintAst
        | Opt::DumpScopeMaps
        | Opt::DumpTypeRefinementContexts
        | Opt::DumpInterfaceHash
        | Opt::DumpTypeInfo
        | Opt::VerifyDebugInfo => OutputKinds::new(None, None),
        Opt::Repl | Opt::DeprecatedIntegratedRepl | Opt::LldbRepl => OutputKinds::new(None, None),
        other => panic!(
            "unhandled output mode option '{}': the output resolver is out of sync with the option table",
            other.spelling()
        ),
    }
}
