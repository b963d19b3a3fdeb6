// src/sitemap/extract.rs
// =============================================================================
// Pulls `<loc>` entries out of sitemap documents.
//
// Sitemaps in the wild are often not well-formed XML, so instead of a real
// XML parser we use two forgiving regex passes:
// 1. Sitemap index markup: <sitemap> ... <loc>URL</loc>
// 2. Only if pass 1 found nothing, URL set markup: <url> ... <loc>URL</loc>
//
// Nothing in here can fail. A document with no usable locations simply
// yields an empty list.
// =============================================================================

use flate2::read::GzDecoder;
use regex::Regex;
use std::io::Read;
use std::sync::OnceLock;

static INDEX_LOC: OnceLock<Regex> = OnceLock::new();
static URLSET_LOC: OnceLock<Regex> = OnceLock::new();

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

// The sitemap protocol caps an uncompressed sitemap at 50 MiB
const MAX_DECOMPRESSED: u64 = 50 * 1024 * 1024;

// The patterns are constants, so compiling them cannot fail at runtime
fn index_loc() -> &'static Regex {
    INDEX_LOC.get_or_init(|| {
        Regex::new(r"(?is)<sitemap\b[^>]*>.*?<loc\b[^>]*>(.*?)</loc>").expect("valid index regex")
    })
}

fn urlset_loc() -> &'static Regex {
    URLSET_LOC.get_or_init(|| {
        Regex::new(r"(?is)<url\b[^>]*>.*?<loc\b[^>]*>(.*?)</loc>").expect("valid urlset regex")
    })
}

/// Extracts location URLs, trying index markup first and URL set markup second
pub fn extract_locations(document: &str) -> Vec<String> {
    let locations = capture_all(index_loc(), document);
    if !locations.is_empty() {
        return locations;
    }
    capture_all(urlset_loc(), document)
}

/// Cheap check used by discovery: does the body look like it lists anything?
pub fn has_location_marker(document: &str) -> bool {
    document.to_ascii_lowercase().contains("<loc")
}

/// True when a location looks like another sitemap file rather than a page
pub fn is_sitemap_file(location: &str) -> bool {
    let without_query = location.split(['?', '#']).next().unwrap_or(location);
    let lower = without_query.to_ascii_lowercase();
    lower.ends_with(".xml") || lower.ends_with(".xml.gz")
}

/// Turns a fetched body into text, gunzipping it first when it is gzip data.
///
/// A body that claims to be gzip but fails to decompress is decoded as-is.
/// Decompressed output stops at `MAX_DECOMPRESSED` bytes.
pub fn decode_document(bytes: &[u8]) -> String {
    decode_with_limit(bytes, MAX_DECOMPRESSED)
}

fn decode_with_limit(bytes: &[u8], limit: u64) -> String {
    if bytes.starts_with(&GZIP_MAGIC) {
        let mut decompressed = Vec::new();
        if GzDecoder::new(bytes)
            .take(limit)
            .read_to_end(&mut decompressed)
            .is_ok()
        {
            return String::from_utf8_lossy(&decompressed).into_owned();
        }
    }
    String::from_utf8_lossy(bytes).into_owned()
}

fn capture_all(re: &Regex, document: &str) -> Vec<String> {
    re.captures_iter(document)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| clean_location(m.as_str()))
        .collect()
}

// Strips whitespace, CDATA wrappers and XML entities from a <loc> value
fn clean_location(raw: &str) -> Option<String> {
    let mut value = raw.trim();
    if let Some(inner) = value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
    {
        value = inner.trim();
    }

    if value.is_empty() {
        return None;
    }

    // &amp; goes last so "&amp;lt;" becomes "&lt;" and not "<"
    let unescaped = value
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&");
    Some(unescaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_extract_index_locations() {
        let xml = r#"<?xml version="1.0"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://example.com/posts.xml</loc></sitemap>
  <sitemap>
    <loc>
      https://example.com/pages.xml
    </loc>
    <lastmod>2024-01-01</lastmod>
  </sitemap>
</sitemapindex>"#;
        assert_eq!(
            extract_locations(xml),
            vec!["https://example.com/posts.xml", "https://example.com/pages.xml"]
        );
    }

    #[test]
    fn test_falls_back_to_urlset() {
        let xml = r#"<urlset>
  <url><loc>https://example.com/a</loc></url>
  <url><loc><![CDATA[https://example.com/b?x=1&y=2]]></loc></url>
  <url><loc>https://example.com/c?x=1&amp;y=2</loc></url>
</urlset>"#;
        assert_eq!(
            extract_locations(xml),
            vec![
                "https://example.com/a",
                "https://example.com/b?x=1&y=2",
                "https://example.com/c?x=1&y=2"
            ]
        );
    }

    #[test]
    fn test_malformed_documents_yield_nothing() {
        assert!(extract_locations("").is_empty());
        assert!(extract_locations("<html><body>not a sitemap</body></html>").is_empty());
        assert!(extract_locations("<urlset><url><loc></loc></url><url><loc>   </loc>").is_empty());
        // Unterminated <loc> is ignored rather than swallowing the document
        assert!(extract_locations("<urlset><url><loc>https://example.com/a").is_empty());
    }

    #[test]
    fn test_sitemap_file_suffixes() {
        assert!(is_sitemap_file("https://example.com/sitemap.xml"));
        assert!(is_sitemap_file("https://example.com/SITEMAP-1.XML"));
        assert!(is_sitemap_file("https://example.com/s.xml.gz"));
        assert!(is_sitemap_file("https://example.com/s.xml?page=2"));
        assert!(!is_sitemap_file("https://example.com/about"));
        assert!(!is_sitemap_file("https://example.com/feed.xml.json"));
    }

    #[test]
    fn test_decode_gzip_and_plain() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"<urlset></urlset>").unwrap();
        let gz = encoder.finish().unwrap();

        assert_eq!(decode_document(&gz), "<urlset></urlset>");
        assert_eq!(decode_document(b"<urlset/>"), "<urlset/>");
        // Gzip magic with garbage after it falls back to the raw bytes
        assert_eq!(decode_document(&[0x1f, 0x8b, b'x']).chars().count(), 3);
    }

    #[test]
    fn test_decompression_is_capped() {
        // 1 MiB of zeros compresses to about a kilobyte
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&vec![b'0'; 1024 * 1024]).unwrap();
        let gz = encoder.finish().unwrap();
        assert!(gz.len() < 16 * 1024);

        assert_eq!(decode_with_limit(&gz, 4096).len(), 4096);
        assert_eq!(decode_document(&gz).len(), 1024 * 1024);
    }
}
