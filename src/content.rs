//! Inputs and outputs of a generation run
//!
//! Classes come in through a [`ClassProvider`] and generated classes leave
//! through a [`ContentSink`]. Directory-backed implementations are used by the
//! CLI; the in-memory ones by tests and embedders.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use walkdir::WalkDir;

use crate::common::error::Result;
use crate::consts::extras;
use crate::registry::ClassReference;

/// A generated or rewritten class file plus side-channel metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedContent {
    /// `internal/Name.class`
    pub path: String,
    pub bytes: Vec<u8>,
    pub extras: BTreeMap<String, String>,
}

impl GeneratedContent {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { path: path.into(), bytes, extras: BTreeMap::new() }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    /// `binding`, `patched`, `listener` or `factory`
    pub fn kind(&self) -> Option<&str> {
        self.extra(extras::KIND)
    }

    /// Internal name of the class this content was generated for
    pub fn original(&self) -> Option<&str> {
        self.extra(extras::ORIGINAL)
    }

    /// Internal name derived from the path
    pub fn class_name(&self) -> &str {
        self.path.strip_suffix(".class").unwrap_or(&self.path)
    }
}

/// Source of class metadata
pub trait ClassProvider {
    fn references(&self) -> Result<Vec<ClassReference>>;
}

/// Every `.class` file below one or more directories
#[derive(Debug, Clone)]
pub struct DirectoryClassProvider {
    roots: Vec<PathBuf>,
}

impl DirectoryClassProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { roots: vec![root.into()] }
    }

    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl ClassProvider for DirectoryClassProvider {
    fn references(&self) -> Result<Vec<ClassReference>> {
        let mut references = Vec::new();
        for root in &self.roots {
            let mut entries = Vec::new();
            for entry in WalkDir::new(root) {
                let entry = entry?;
                let is_class = entry.path().extension().map_or(false, |extension| extension == "class");
                if entry.file_type().is_file() && is_class {
                    entries.push(entry.into_path());
                }
            }
            entries.sort();

            for path in entries {
                match ClassReference::from_file(&path) {
                    Ok(reference) => references.push(reference),
                    Err(error) => log::warn!("skipping unreadable class file {}: {}", path.display(), error),
                }
            }
        }
        log::debug!("found {} classes under {:?}", references.len(), self.roots);
        Ok(references)
    }
}

/// Classes held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryClassProvider {
    classes: Vec<Rc<[u8]>>,
}

impl MemoryClassProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_class(mut self, bytes: impl Into<Rc<[u8]>>) -> Self {
        self.classes.push(bytes.into());
        self
    }

    pub fn add(&mut self, bytes: impl Into<Rc<[u8]>>) {
        self.classes.push(bytes.into());
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassProvider for MemoryClassProvider {
    fn references(&self) -> Result<Vec<ClassReference>> {
        self.classes.iter().map(|bytes| ClassReference::from_bytes(bytes.clone())).collect()
    }
}

/// Destination of generated contents
pub trait ContentSink {
    fn write(&mut self, content: &GeneratedContent) -> Result<()>;
}

/// Writes each content to `<root>/<path>`, creating parent directories
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ContentSink for DirectorySink {
    fn write(&mut self, content: &GeneratedContent) -> Result<()> {
        let path = self.root.join(&content.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &content.bytes)?;
        log::debug!("wrote {}", path.display());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pub contents: Vec<GeneratedContent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&GeneratedContent> {
        self.contents.iter().find(|content| content.path == path)
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a GeneratedContent> + 'a {
        self.contents.iter().filter(move |content| content.kind() == Some(kind))
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

impl ContentSink for MemorySink {
    fn write(&mut self, content: &GeneratedContent) -> Result<()> {
        self.contents.push(content.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::class_writer::ClassBuilder;
    use crate::codegen::flag::access_flags::*;

    fn class_bytes(name: &str) -> Vec<u8> {
        ClassBuilder::new(ACC_PUBLIC | ACC_SUPER, name, "java/lang/Object", &[]).unwrap().to_bytes()
    }

    #[test]
    fn test_content_extras() {
        let content = GeneratedContent::new("com/example/Target$$SentoBinding.class", vec![1, 2, 3])
            .with_extra(extras::KIND, extras::KIND_BINDING)
            .with_extra(extras::ORIGINAL, "com/example/Target");
        assert_eq!(content.kind(), Some("binding"));
        assert_eq!(content.original(), Some("com/example/Target"));
        assert_eq!(content.class_name(), "com/example/Target$$SentoBinding");
        assert_eq!(content.extra("missing"), None);
    }

    #[test]
    fn test_memory_provider() {
        let provider = MemoryClassProvider::new().with_class(class_bytes("com/example/A"));
        let references = provider.references().unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].name, "com/example/A");
    }

    #[test]
    fn test_directory_round_trip() {
        let input = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(input.path());
        sink.write(&GeneratedContent::new("com/example/A.class", class_bytes("com/example/A"))).unwrap();
        sink.write(&GeneratedContent::new("com/example/nested/B.class", class_bytes("com/example/nested/B"))).unwrap();
        fs::write(input.path().join("com/example/broken.class"), b"not a class").unwrap();
        fs::write(input.path().join("com/example/notes.txt"), b"ignored").unwrap();

        let references = DirectoryClassProvider::new(input.path()).references().unwrap();
        let names: Vec<&str> = references.iter().map(|reference| reference.name.as_str()).collect();
        assert_eq!(names, vec!["com/example/A", "com/example/nested/B"]);
        assert_eq!(references[1].open().unwrap().len(), class_bytes("com/example/nested/B").len());
    }

    #[test]
    fn test_missing_root_fails() {
        let root = tempfile::tempdir().unwrap();
        let provider = DirectoryClassProvider::new(root.path().join("missing"));
        assert!(matches!(provider.references(), Err(crate::Error::Walk(_))));
    }
}
