//! File kinds produced and consumed by the driver
//!
//! The canonical names double as output-file-map keys and as the type tag
//! stored next to each path in the build record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A kind of file the driver knows how to produce or consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "swift")]
    Swift,
    #[serde(rename = "sil")]
    Sil,
    #[serde(rename = "sib")]
    Sib,
    #[serde(rename = "raw-sil")]
    RawSil,
    #[serde(rename = "raw-sib")]
    RawSib,
    #[serde(rename = "object")]
    Object,
    #[serde(rename = "assembly")]
    Assembly,
    #[serde(rename = "llvm-ir")]
    LlvmIr,
    #[serde(rename = "llvm-bc")]
    LlvmBitcode,
    #[serde(rename = "ast-dump")]
    Ast,
    #[serde(rename = "pch")]
    Pch,
    #[serde(rename = "pcm")]
    Pcm,
    #[serde(rename = "imported-modules")]
    ImportedModules,
    #[serde(rename = "index-data")]
    IndexData,
    #[serde(rename = "remap")]
    Remap,
    #[serde(rename = "swiftmodule")]
    SwiftModule,
    #[serde(rename = "swiftdoc")]
    SwiftDocumentation,
    #[serde(rename = "swiftinterface")]
    SwiftInterface,
    #[serde(rename = "swift-dependencies")]
    SwiftDeps,
    #[serde(rename = "dependencies")]
    Dependencies,
    #[serde(rename = "diagnostics")]
    Diagnostics,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "tbd")]
    Tbd,
}

impl FileType {
    /// Canonical name, as used in output file maps and build records.
    pub fn name(self) -> &'static str {
        match self {
            FileType::Swift => "swift",
            FileType::Sil => "sil",
            FileType::Sib => "sib",
            FileType::RawSil => "raw-sil",
            FileType::RawSib => "raw-sib",
            FileType::Object => "object",
            FileType::Assembly => "assembly",
            FileType::LlvmIr => "llvm-ir",
            FileType::LlvmBitcode => "llvm-bc",
            FileType::Ast => "ast-dump",
            FileType::Pch => "pch",
            FileType::Pcm => "pcm",
            FileType::ImportedModules => "imported-modules",
            FileType::IndexData => "index-data",
            FileType::Remap => "remap",
            FileType::SwiftModule => "swiftmodule",
            FileType::SwiftDocumentation => "swiftdoc",
            FileType::SwiftInterface => "swiftinterface",
            FileType::SwiftDeps => "swift-dependencies",
            FileType::Dependencies => "dependencies",
            FileType::Diagnostics => "diagnostics",
            FileType::Image => "image",
            FileType::Tbd => "tbd",
        }
    }

    /// Conventional file extension (without the dot).
    pub fn extension(self) -> &'static str {
        match self {
            FileType::Swift => "swift",
            FileType::Sil | FileType::RawSil => "sil",
            FileType::Sib | FileType::RawSib => "sib",
            FileType::Object => "o",
            FileType::Assembly => "s",
            FileType::LlvmIr => "ll",
            FileType::LlvmBitcode => "bc",
            FileType::Ast => "ast",
            FileType::Pch => "pch",
            FileType::Pcm => "pcm",
            FileType::ImportedModules => "importedmodules",
            FileType::IndexData => "indexdata",
            FileType::Remap => "remap",
            FileType::SwiftModule => "swiftmodule",
            FileType::SwiftDocumentation => "swiftdoc",
            FileType::SwiftInterface => "swiftinterface",
            FileType::SwiftDeps => "swiftdeps",
            FileType::Dependencies => "d",
            FileType::Diagnostics => "dia",
            FileType::Image => "out",
            FileType::Tbd => "tbd",
        }
    }

    /// Guess the kind of an input from its extension. Unknown extensions
    /// are treated as linker inputs.
    pub fn for_input(path: &Path) -> FileType {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("swift") => FileType::Swift,
            Some("sil") => FileType::Sil,
            Some("sib") => FileType::Sib,
            Some("swiftmodule") => FileType::SwiftModule,
            Some("pcm") => FileType::Pcm,
            Some("tbd") => FileType::Tbd,
            _ => FileType::Object,
        }
    }

    /// Whether files of this kind feed the Swift frontend directly.
    ///
    /// Only these inputs get modification dates in the build record; linker
    /// inputs and other auxiliaries are not tracked.
    pub fn is_part_of_swift_compilation(self) -> bool {
        matches!(
            self,
            FileType::Swift | FileType::Sil | FileType::Sib | FileType::RawSil | FileType::RawSib
        )
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A path tagged with the kind of file it names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypedPath {
    pub path: PathBuf,
    #[serde(rename = "type")]
    pub file_type: FileType,
}

impl TypedPath {
    pub fn new(path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
        }
    }

    /// Tag an input path with the kind implied by its extension.
    pub fn input(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let file_type = FileType::for_input(&path);
        Self { path, file_type }
    }
}

impl fmt::Display for TypedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path.display(), self.file_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_name_matches_name() {
        for ty in [FileType::SwiftDeps, FileType::RawSil, FileType::LlvmBitcode, FileType::Object] {
            let json = serde_json::to_string(&ty).unwrap();
            assert_eq!(json, format!("\"{}\"", ty.name()));
        }
    }

    #[test]
    fn test_swift_compilation_inputs() {
        assert!(FileType::Swift.is_part_of_swift_compilation());
        assert!(FileType::RawSib.is_part_of_swift_compilation());
        assert!(!FileType::Object.is_part_of_swift_compilation());
        assert!(!FileType::SwiftModule.is_part_of_swift_compilation());
    }

    #[test]
    fn test_typed_input_from_extension() {
        assert_eq!(TypedPath::input("/src/a.swift").file_type, FileType::Swift);
        assert_eq!(TypedPath::input("/lib/libfoo.a").file_type, FileType::Object);
    }
}
