use crate::engine::assets::bounds::RawBounds;
use crate::tools::dimensions::LengthUnit;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFormat {
    Fbx,
    Gltf,
    Glb,
}

impl ModelFormat {
    /// Format implied by the URL path extension. Query string and fragment are ignored.
    pub fn from_url(url: &str) -> Option<Self> {
        match url_extension(url)?.as_str() {
            "fbx" => Some(ModelFormat::Fbx),
            "gltf" => Some(ModelFormat::Gltf),
            "glb" => Some(ModelFormat::Glb),
            _ => None,
        }
    }

    /// Formats to attempt, in order. Unrecognised extensions try FBX before glTF.
    pub fn candidates(url: &str) -> Vec<Self> {
        match Self::from_url(url) {
            Some(format) => vec![format],
            None => vec![ModelFormat::Fbx, ModelFormat::Gltf],
        }
    }

    /// Binary formats that may be retried through a blob object URL.
    pub fn supports_blob_fallback(self) -> bool {
        matches!(self, ModelFormat::Fbx | ModelFormat::Glb)
    }
}

impl fmt::Display for ModelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ModelFormat::Fbx => "FBX",
            ModelFormat::Gltf => "glTF",
            ModelFormat::Glb => "GLB",
        })
    }
}

/// The model currently shown in the viewer.
#[derive(Debug, Clone)]
pub struct ModelAsset {
    pub url: String,
    pub format: ModelFormat,
    pub raw_bounds: RawBounds,
    pub assumed_unit: LengthUnit,
}

/// URL with any `?query` or `#fragment` removed.
pub fn strip_query(url: &str) -> &str {
    let end = url.find(['?', '#']).unwrap_or(url.len());
    &url[..end]
}

/// Lower-cased extension of the URL path.
pub fn url_extension(url: &str) -> Option<String> {
    let path = strip_query(url);
    let file = path.rsplit('/').next()?;
    let (_, ext) = file.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Directory part of the URL including the trailing slash, without query.
pub fn url_directory(url: &str) -> &str {
    let path = strip_query(url);
    match path.rfind('/') {
        Some(index) => &path[..=index],
        None => "",
    }
}

/// Resolve a side-file reference from a glTF document against the document URL.
///
/// Absolute URLs and `data:` URIs pass through unchanged. Root-relative paths
/// keep the document's origin.
pub fn resolve_side_file(document_url: &str, reference: &str) -> String {
    if reference.starts_with("data:") || reference.contains("://") || reference.starts_with("blob:")
    {
        return reference.to_string();
    }

    if let Some(rooted) = reference.strip_prefix('/') {
        let base = strip_query(document_url);
        if let Some(scheme_end) = base.find("://") {
            let after = &base[scheme_end + 3..];
            let host_end = after.find('/').map(|i| scheme_end + 3 + i).unwrap_or(base.len());
            return format!("{}/{}", &base[..host_end], rooted);
        }
        return reference.to_string();
    }

    let mut segments: Vec<&str> = url_directory(document_url)
        .trim_end_matches('/')
        .split('/')
        .collect();
    let keep_leading_slash = url_directory(document_url).starts_with('/');
    for part in reference.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                if segments.len() > 1 {
                    segments.pop();
                }
            }
            other => segments.push(other),
        }
    }
    let joined = segments.join("/");
    if keep_leading_slash || joined.is_empty() {
        joined
    } else {
        joined.trim_start_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_ignores_query_string() {
        let url = "https://cdn.example.com/doors/d-100.GLB?X-Amz-Signature=abc.fbx";
        assert_eq!(ModelFormat::from_url(url), Some(ModelFormat::Glb));
        assert_eq!(
            ModelFormat::from_url("/assets/door.fbx#part"),
            Some(ModelFormat::Fbx)
        );
    }

    #[test]
    fn test_unknown_extension_tries_fbx_then_gltf() {
        assert_eq!(
            ModelFormat::candidates("https://cdn.example.com/blob/12345"),
            vec![ModelFormat::Fbx, ModelFormat::Gltf]
        );
        assert_eq!(
            ModelFormat::candidates("model.gltf"),
            vec![ModelFormat::Gltf]
        );
    }

    #[test]
    fn test_side_files_resolve_against_document_directory() {
        let doc = "https://cdn.example.com/products/w1/window.gltf?token=1";
        assert_eq!(
            resolve_side_file(doc, "window.bin"),
            "https://cdn.example.com/products/w1/window.bin"
        );
        assert_eq!(
            resolve_side_file(doc, "../shared/glass.png"),
            "https://cdn.example.com/products/shared/glass.png"
        );
        assert_eq!(
            resolve_side_file(doc, "/textures/oak.jpg"),
            "https://cdn.example.com/textures/oak.jpg"
        );
        assert_eq!(
            resolve_side_file(doc, "data:application/octet-stream;base64,AAAA"),
            "data:application/octet-stream;base64,AAAA"
        );
        assert_eq!(resolve_side_file("models/a.gltf", "a.bin"), "models/a.bin");
    }
}
