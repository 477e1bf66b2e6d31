//! Signed URL inspection
//!
//! Signed file URLs look like
//! `https://host/<...>/signed-url-redirect/<resource id>?...`. The resource id
//! is what the file metadata API is queried with; the path's extension (if
//! any) names the delivered file.

use std::path::Path;
use url::Url;

/// Path segment that precedes the resource id in a signed URL
pub const SIGNED_URL_MARKER: &str = "signed-url-redirect";

/// Extension used when the URL path carries none
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Extract the resource id following the signed-url marker
///
/// Returns `None` if the URL does not parse, the marker is absent, or nothing
/// follows it.
///
/// # Examples
///
/// ```
/// use sheet_image_dl::resolver::extract_resource_id;
///
/// let url = "https://f.example.com/hubfs/1/signed-url-redirect/98765?Expires=1";
/// assert_eq!(extract_resource_id(url).as_deref(), Some("98765"));
/// assert_eq!(extract_resource_id("https://f.example.com/a/b"), None);
/// ```
pub fn extract_resource_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    let mut segments = parsed.path_segments()?.filter(|s| !s.is_empty());

    segments.find(|s| *s == SIGNED_URL_MARKER)?;
    segments.next().map(str::to_string)
}

/// Infer the delivered file's extension from the URL path
///
/// Returns the last path segment's extension without the leading dot, or
/// [`DEFAULT_EXTENSION`] when there is none. Query strings never contribute.
pub fn infer_extension(url: &str) -> String {
    Url::parse(url.trim())
        .ok()
        .and_then(|parsed| {
            let last = parsed.path_segments()?.next_back()?.to_string();
            Path::new(&last)
                .extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext| !ext.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
