use std::path::Path;

/// Marker every region file name carries (`*.mc*`).
const REGION_MARKER: &str = ".mc";
/// Extension of the older region format this layout cannot mix with.
pub const LEGACY_REGION_EXTENSION: &str = ".mcr";

/// Whether `path` is a world stored in this format: it has `level.dat`, a
/// `region/` directory, and no legacy region files. A world holding even one
/// legacy region is rejected.
pub fn is_valid(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    if !path.join("level.dat").exists() {
        return false;
    }
    let region_dir = path.join("region");
    if !region_dir.is_dir() {
        return false;
    }
    let Ok(entries) = std::fs::read_dir(&region_dir) else {
        return false;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.contains(REGION_MARKER) && name.contains(LEGACY_REGION_EXTENSION) {
            tracing::debug!(file = %name, "legacy region file found");
            return false;
        }
    }
    true
}
