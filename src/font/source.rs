//! Where font bytes come from: user-supplied sources and system font
//! directories.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::CoverError;

/// Resolve a font source string to raw bytes.
///
/// Supported `src` formats:
/// - `data:font/...;base64,...` (any `data:` URI with a base64 payload)
/// - File path (absolute, `./`, `../` or `~/`)
/// - Raw base64-encoded font data
pub fn read_source_bytes(src: &str) -> Result<Vec<u8>, CoverError> {
    let src = src.trim();
    if let Some(rest) = src.strip_prefix("data:") {
        let comma_pos = rest
            .find(',')
            .ok_or_else(|| CoverError::Font("Invalid data URI: missing comma".to_string()))?;
        return base64_decode(&rest[comma_pos + 1..]);
    }

    // Only explicit path prefixes count as paths; base64 contains '/' too.
    if let Some(home_relative) = src.strip_prefix("~/") {
        let home = std::env::var("HOME")
            .map_err(|_| CoverError::Font(format!("Cannot expand '{}': HOME is not set", src)))?;
        return read_file(&PathBuf::from(home).join(home_relative));
    }
    if src.starts_with('/') || src.starts_with("./") || src.starts_with("../") {
        return read_file(&PathBuf::from(src));
    }

    base64_decode(src)
}

fn read_file(path: &PathBuf) -> Result<Vec<u8>, CoverError> {
    std::fs::read(path)
        .map_err(|e| CoverError::Font(format!("Failed to read font file '{}': {}", path.display(), e)))
}

fn base64_decode(input: &str) -> Result<Vec<u8>, CoverError> {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD
        .decode(input.trim())
        .map_err(|e| CoverError::Font(format!("Base64 decode error: {}", e)))
}

/// Families the layouts ask for, with well-known file names that provide
/// them, best first.
const SYSTEM_FACES: &[(&str, u16, &[&str])] = &[
    (
        "serif",
        400,
        &[
            "NotoSerifCJK-Regular.ttc",
            "NotoSerifCJKsc-Regular.otf",
            "NotoSerifSC-Regular.otf",
            "NotoSerifSC-Regular.ttf",
            "SourceHanSerifSC-Regular.otf",
            "SourceHanSerif-Regular.ttc",
            "Songti.ttc",
            "simsun.ttc",
            "NotoSerif-Regular.ttf",
            "DejaVuSerif.ttf",
            "LiberationSerif-Regular.ttf",
            "Times New Roman.ttf",
        ],
    ),
    (
        "serif",
        700,
        &[
            "NotoSerifCJK-Bold.ttc",
            "NotoSerifCJKsc-Bold.otf",
            "NotoSerifSC-Bold.otf",
            "SourceHanSerifSC-Bold.otf",
            "NotoSerif-Bold.ttf",
            "DejaVuSerif-Bold.ttf",
            "LiberationSerif-Bold.ttf",
        ],
    ),
    (
        "sans",
        400,
        &[
            "NotoSansCJK-Regular.ttc",
            "NotoSansCJKsc-Regular.otf",
            "NotoSansSC-Regular.otf",
            "wqy-microhei.ttc",
            "wqy-zenhei.ttc",
            "PingFang.ttc",
            "msyh.ttc",
            "DejaVuSans.ttf",
            "LiberationSans-Regular.ttf",
        ],
    ),
    (
        "mono",
        400,
        &[
            "DejaVuSansMono.ttf",
            "LiberationMono-Regular.ttf",
            "NotoSansMono-Regular.ttf",
            "Menlo.ttc",
            "consola.ttf",
        ],
    ),
    (
        "mono",
        700,
        &[
            "DejaVuSansMono-Bold.ttf",
            "LiberationMono-Bold.ttf",
            "NotoSansMono-Bold.ttf",
            "consolab.ttf",
        ],
    ),
];

/// A font file found on this machine.
#[derive(Debug, Clone)]
pub struct SystemFace {
    pub family: &'static str,
    pub weight: u16,
    pub path: PathBuf,
}

/// Find one file per known family and weight in the system font
/// directories.
pub fn discover_system_faces() -> Vec<SystemFace> {
    let index = index_font_files(&system_font_dirs());
    SYSTEM_FACES
        .iter()
        .filter_map(|(family, weight, candidates)| {
            candidates
                .iter()
                .find_map(|name| index.get(&name.to_ascii_lowercase()))
                .map(|path| SystemFace {
                    family: *family,
                    weight: *weight,
                    path: path.clone(),
                })
        })
        .collect()
}

fn system_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        dirs.push(PathBuf::from(r"C:\Windows\Fonts"));
        if let Ok(windir) = std::env::var("WINDIR") {
            dirs.push(PathBuf::from(windir).join("Fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    if let Ok(extra) = std::env::var("COVERKIT_FONT_DIR") {
        for path in std::env::split_paths(&extra) {
            if !path.as_os_str().is_empty() {
                dirs.push(path);
            }
        }
    }

    dirs
}

const MAX_FONT_DIR_DEPTH: usize = 5;

/// Map lowercase file names to their first location under `dirs`.
fn index_font_files(dirs: &[PathBuf]) -> HashMap<String, PathBuf> {
    let mut index = HashMap::new();
    let mut stack: Vec<(PathBuf, usize)> = dirs.iter().map(|d| (d.clone(), 0)).collect();
    while let Some((dir, depth)) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                if depth < MAX_FONT_DIR_DEPTH {
                    stack.push((path, depth + 1));
                }
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                index.entry(name.to_ascii_lowercase()).or_insert(path);
            }
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri() {
        let bytes = read_source_bytes("data:font/ttf;base64,AAEAAA==").unwrap();
        assert_eq!(bytes, vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_raw_base64() {
        assert_eq!(read_source_bytes("AAEAAA==").unwrap(), vec![0, 1, 0, 0]);
    }

    #[test]
    fn test_bad_sources() {
        assert!(matches!(
            read_source_bytes("data:font/ttf;base64"),
            Err(CoverError::Font(_))
        ));
        assert!(matches!(
            read_source_bytes("/definitely/not/here.ttf"),
            Err(CoverError::Font(_))
        ));
        assert!(matches!(read_source_bytes("%%%"), Err(CoverError::Font(_))));
    }

    #[test]
    fn test_index_missing_dir_is_empty() {
        let index = index_font_files(&[PathBuf::from("/definitely/not/a/font/dir")]);
        assert!(index.is_empty());
    }
}
