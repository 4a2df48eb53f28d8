use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::PathBuf;

/// Locate a fixture engine library built for this test run.
///
/// Cargo builds dev-dependencies into `target/<profile>/deps`, next to the
/// test executable, and may add a `-<hash>` suffix to the file stem.
pub fn fixture_library(crate_name: &str) -> PathBuf {
    let stem = format!("{}{}", DLL_PREFIX, crate_name.replace('-', "_"));
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();

    let mut candidates = Vec::new();
    for dir in [Some(deps), deps.parent()].into_iter().flatten() {
        let Ok(entries) = std::fs::read_dir(dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = name.strip_prefix(&stem) else {
                continue;
            };
            if rest == DLL_SUFFIX || (rest.starts_with('-') && rest.ends_with(DLL_SUFFIX)) {
                let modified = entry.metadata().and_then(|m| m.modified()).ok();
                candidates.push((modified, entry.path()));
            }
        }
    }

    // Newest build wins when stale copies are lying around.
    candidates.sort();
    match candidates.pop() {
        Some((_, path)) => path,
        None => panic!(
            "fixture library {}*{} not found near {}",
            stem,
            DLL_SUFFIX,
            exe.display()
        ),
    }
}
