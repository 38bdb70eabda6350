use std::env;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Resolves a path against the current working directory, collapsing `.` and
/// `..` components lexically. The target does not need to exist and symlinks
/// are not followed.
pub fn to_absolute(path: &Path) -> io::Result<PathBuf> {
    let absolute_path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    Ok(normalize_path(&absolute_path))
}

fn normalize_path(path: &Path) -> PathBuf {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(components.last(), None | Some(Component::RootDir)) {
                    components.pop();
                }
            }
            _ => {
                components.push(component);
            }
        }
    }

    components.iter().collect()
}

pub trait AbsolutePathExt {
    fn to_absolute(&self) -> io::Result<PathBuf>;
}

impl AbsolutePathExt for Path {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        to_absolute(self)
    }
}

impl AbsolutePathExt for PathBuf {
    fn to_absolute(&self) -> io::Result<PathBuf> {
        to_absolute(self)
    }
}
