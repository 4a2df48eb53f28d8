//! Platform-specific location of the engine library

use std::path::{Path, PathBuf};

/// Build the library path for the running platform.
///
/// `dbms` becomes `dbms.dll` on Windows, `libdbms.dylib` on macOS and
/// `libdbms.so` on other Unix targets.
pub fn library_path(dir: impl AsRef<Path>, name: &str) -> PathBuf {
    dir.as_ref().join(libloading::library_filename(name))
}

/// Check the file before handing it to the dynamic linker, so a missing
/// file is reported as such instead of as a linker diagnostic.
pub(crate) fn check_exists(path: &Path) -> crate::Result<()> {
    match path.metadata() {
        Ok(meta) if meta.is_file() => Ok(()),
        Ok(_) => Err(crate::Error::load_failure(path, "not a regular file")),
        Err(e) => Err(crate::Error::load_failure(
            path,
            format!("file not accessible: {}", e),
        )),
    }
}
