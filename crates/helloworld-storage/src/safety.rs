//! Content inspection run by stores before any bytes reach their destination.

use crate::traits::{StorageError, StorageResult};

/// Extensions that must never land in a web-served directory, checked against every
/// dot-separated part of the name so `shell.php.png` is caught too.
const FORBIDDEN_EXTENSIONS: &[&str] = &[
    "php", "phps", "pht", "phtml", "phar", "php3", "php4", "php5", "php6", "php7", "php8",
    "inc", "pl", "py", "cgi", "fcgi", "asp", "aspx", "jsp", "java", "jar", "sh", "exe", "dll",
    "bat", "cmd", "com", "htaccess",
];

/// PHP opener looked for anywhere in the content.
const PHP_TAG: &[u8] = b"<?php";

/// Short openers are two or three bytes and show up by chance in compressed image data,
/// so they are only looked for in text-like files.
const SHORT_TAGS: &[&[u8]] = &[b"<?=", b"<%"];

/// Extensions whose content is scanned for short script openers.
const SHORT_TAG_EXTENSIONS: &[&str] = &[
    "txt", "dat", "tpl", "tmpl", "class", "htm", "html", "xml", "svg",
];

/// Inspect an upload's final name and content.
pub fn inspect_upload(name: &str, data: &[u8]) -> StorageResult<()> {
    let lowered = name.to_lowercase();
    for part in lowered.split('.').skip(1) {
        if FORBIDDEN_EXTENSIONS.contains(&part.trim()) {
            return Err(StorageError::UnsafeContent(format!(
                "forbidden extension '{}' in {}",
                part, name
            )));
        }
    }

    if let Some(kind) = executable_header(data) {
        return Err(StorageError::UnsafeContent(format!(
            "{} executable header in {}",
            kind, name
        )));
    }

    let scan_short_tags = lowered
        .rsplit_once('.')
        .is_some_and(|(_, ext)| SHORT_TAG_EXTENSIONS.contains(&ext));
    let found_tag = contains_ignore_ascii_case(data, PHP_TAG)
        || (scan_short_tags && SHORT_TAGS.iter().any(|tag| contains_ignore_ascii_case(data, tag)));
    if found_tag {
        return Err(StorageError::UnsafeContent(format!(
            "script tag found in {}",
            name
        )));
    }

    Ok(())
}

fn executable_header(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"\x7fELF") {
        Some("ELF")
    } else if data.starts_with(b"MZ") {
        Some("PE")
    } else if data.starts_with(b"#!") {
        Some("shebang")
    } else {
        None
    }
}

fn contains_ignore_ascii_case(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() || haystack.len() < needle.len() {
        return false;
    }
    haystack
        .windows(needle.len())
        .any(|window| window.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    #[test]
    fn test_plain_image_passes() {
        assert!(inspect_upload("cat.png", PNG_HEADER).is_ok());
        assert!(inspect_upload("my-holiday.photo.jpg", b"\xff\xd8\xff\xe0").is_ok());
    }

    #[test]
    fn test_forbidden_extension_anywhere_in_name() {
        assert!(matches!(
            inspect_upload("shell.php.png", PNG_HEADER),
            Err(StorageError::UnsafeContent(_))
        ));
        assert!(inspect_upload("run.PHTML", PNG_HEADER).is_err());
        assert!(inspect_upload("tool.exe", PNG_HEADER).is_err());
    }

    #[test]
    fn test_script_tag_in_content() {
        let mut data = PNG_HEADER.to_vec();
        data.extend_from_slice(b"garbage<?PHP system($_GET['c']); ?>");
        assert!(inspect_upload("cat.png", &data).is_err());
    }

    #[test]
    fn test_executable_headers() {
        assert!(inspect_upload("a.png", b"\x7fELF\x02\x01").is_err());
        assert!(inspect_upload("a.png", b"MZ\x90\x00").is_err());
        assert!(inspect_upload("a.png", b"#!/bin/sh\n").is_err());
    }

    #[test]
    fn test_short_tags_only_matter_in_text_files() {
        let mut data = PNG_HEADER.to_vec();
        data.extend_from_slice(b"\x10<%\x9a\x03<?=\xff");
        assert!(inspect_upload("photo.png", &data).is_ok());
        assert!(inspect_upload("notes.txt", b"hello <% evil %>").is_err());
        assert!(inspect_upload("page.html", b"<?= $x ?>").is_err());
    }

    #[test]
    fn test_high_entropy_image_body_passes() {
        // xorshift noise standing in for compressed pixel data
        let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
        let mut data = PNG_HEADER.to_vec();
        while data.len() < 256 * 1024 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            data.extend_from_slice(&state.to_le_bytes());
        }
        data.extend_from_slice(b"<%");
        assert!(inspect_upload("holiday.jpg", &data).is_ok());
    }
}
