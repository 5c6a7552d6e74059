use std::{
    fs::File,
    io,
    io::Read,
    path::{Path, PathBuf},
    rc::Rc,
};

/// `SourceFile` is an immutable pair of display name and byte text.
/// Every span in the pipeline refers into `text` by byte offset, so a
/// `SourceFile` is never mutated after construction and is shared by `Rc`
/// rather than copied.
#[derive(Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub name: PathBuf,
    pub text: String,
}

impl SourceFile {
    /// Builds a `SourceFile` from an in-memory string. The display name
    /// defaults to `./source` when one isn't given, matching the behavior
    /// of a literal snippet that was never read from disk.
    pub fn new(text: &str, name: &Path) -> Rc<SourceFile> {
        Rc::new(SourceFile {
            name: name.to_owned(),
            text: text.to_string(),
        })
    }

    /// Builds a `SourceFile` from a literal string, with no backing path.
    pub fn from_str(text: &str) -> Rc<SourceFile> {
        SourceFile::new(text, &PathBuf::from("./source"))
    }

    /// Reads a file from disk into a `SourceFile`.
    pub fn from_path(path: &Path) -> io::Result<Rc<SourceFile>> {
        let mut text = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut text)?;
        Ok(SourceFile::new(&text, path))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn literal_source_points_at_default_path() {
        let source = SourceFile::from_str("pub fn main() -> i32 { return 0; }");
        assert_eq!(source.name, PathBuf::from("./source"));
    }
}
