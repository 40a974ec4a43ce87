//! Codec negotiation
//!
//! Picks the first codec string from an ordered preference list that the
//! encoder backend supports, falling back to a baseline WebM stream.

/// Preference order: widely compatible MP4/H.264 first, then WebM variants
pub const DEFAULT_CODEC_PREFERENCES: &[&str] = &[
    "video/mp4;codecs=avc1.42E01E,mp4a.40.2",
    "video/mp4",
    "video/webm;codecs=vp9,opus",
    "video/webm;codecs=vp8,opus",
    "video/webm",
];

/// Used when nothing in the preference list is supported
pub const FALLBACK_CODEC: &str = "video/webm";

/// First supported entry of `preferences`, or `fallback`
pub fn select_codec<S, F>(preferences: &[S], fallback: &str, is_supported: F) -> String
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    for candidate in preferences {
        let candidate = candidate.as_ref();
        if is_supported(candidate) {
            tracing::debug!("Selected codec {}", candidate);
            return candidate.to_string();
        }
        tracing::debug!("Codec {} not supported", candidate);
    }

    tracing::warn!("No preferred codec supported, falling back to {}", fallback);
    fallback.to_string()
}

/// Container part of a codec string, e.g. `video/mp4` for `video/mp4;codecs=avc1`
pub fn container(mime_type: &str) -> &str {
    mime_type.split(';').next().unwrap_or(mime_type).trim()
}

/// Codec list of a codec string, e.g. `["vp9", "opus"]`
pub fn codecs(mime_type: &str) -> Vec<&str> {
    mime_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("codecs="))
        .flat_map(|list| list.trim_matches('"').split(','))
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

/// File extension matching the container
pub fn container_extension(mime_type: &str) -> &'static str {
    match container(mime_type) {
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        _ => "mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selects_first_supported() {
        let prefs = ["A", "B", "C"];
        assert_eq!(select_codec(&prefs, "Z", |c| c == "C"), "C");
        assert_eq!(select_codec(&prefs, "Z", |c| c == "B" || c == "C"), "B");
    }

    #[test]
    fn test_falls_back_when_nothing_supported() {
        let prefs = ["A", "B"];
        assert_eq!(select_codec(&prefs, "Z", |_| false), "Z");

        let empty: [&str; 0] = [];
        assert_eq!(select_codec(&empty, FALLBACK_CODEC, |_| true), FALLBACK_CODEC);
    }

    #[test]
    fn test_parse_codec_string() {
        let mime = "video/webm;codecs=vp9,opus";
        assert_eq!(container(mime), "video/webm");
        assert_eq!(codecs(mime), vec!["vp9", "opus"]);

        assert_eq!(container("video/mp4"), "video/mp4");
        assert!(codecs("video/mp4").is_empty());
        assert_eq!(codecs("video/mp4; codecs=\"avc1.42E01E, mp4a.40.2\""), vec!["avc1.42E01E", "mp4a.40.2"]);
    }

    #[test]
    fn test_container_extension() {
        assert_eq!(container_extension(DEFAULT_CODEC_PREFERENCES[0]), "mp4");
        assert_eq!(container_extension("video/webm;codecs=vp8,opus"), "webm");
        assert_eq!(container_extension("application/octet-stream"), "mp4");
    }
}
