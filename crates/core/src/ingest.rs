use crate::classifier::check_topic;
use crate::models::Placement;
use crate::IngestError;
use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Recursively lists image files under `folder`, sorted by path.
pub fn discover_image_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if entry.file_type().is_file() && is_image_file(entry.path()) {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

pub fn file_name_of(path: &Path) -> Result<String, IngestError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

/// Puts `source` at `<data_root>/<topic>/<file_name>` and returns that path.
pub fn place_paper(
    source: &Path,
    data_root: &Path,
    topic: &str,
    file_name: &str,
    placement: Placement,
) -> Result<PathBuf, IngestError> {
    if file_name.is_empty() || Path::new(file_name).file_name() != Some(OsStr::new(file_name)) {
        return Err(IngestError::InvalidArgument(format!(
            "not a plain file name: {file_name:?}"
        )));
    }

    check_topic(topic)?;

    let target_dir = data_root.join(topic);
    fs::create_dir_all(&target_dir)?;
    let target = target_dir.join(file_name);

    if same_file(source, &target) {
        debug!(path = %target.display(), "paper already in place");
        return Ok(target);
    }

    match placement {
        Placement::Copy => {
            fs::copy(source, &target)?;
        }
        Placement::Move => {
            if let Err(err) = fs::rename(source, &target) {
                if err.kind() == ErrorKind::NotFound {
                    return Err(err.into());
                }
                // rename cannot cross filesystems
                debug!(error = %err, "rename failed, copying instead");
                fs::copy(source, &target)?;
                fs::remove_file(source)?;
            }
        }
    }

    Ok(target)
}

fn same_file(left: &Path, right: &Path) -> bool {
    match (fs::canonicalize(left), fs::canonicalize(right)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}
