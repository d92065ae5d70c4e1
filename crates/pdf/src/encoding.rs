//! Single-byte (WinAnsi) text encoding for the standard PDF fonts.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Byte written for characters with no WinAnsi equivalent.
pub const REPLACEMENT: u8 = b'?';

/// Text converted to WinAnsi bytes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    /// Characters that had to be approximated or replaced.
    pub substitutions: usize,
}

/// WinAnsi code points in 0x80..=0x9F that differ from Latin-1.
fn win_ansi_special(c: char) -> Option<u8> {
    let byte = match c {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Encode one character directly, if WinAnsi has it.
fn direct_byte(c: char) -> Option<u8> {
    match c {
        ' '..='~' => Some(c as u8),
        '\u{A0}'..='\u{FF}' => Some(c as u32 as u8),
        _ => win_ansi_special(c),
    }
}

/// Convert text to WinAnsi bytes for a single-line text operator.
///
/// Text is NFC-normalized first. Characters WinAnsi lacks fall back to their
/// base letters with accents stripped ("ā" becomes "a"), then to '?'.
/// Control characters, including newlines, become spaces.
pub fn encode_win_ansi(text: &str) -> EncodedText {
    let mut encoded = EncodedText::default();

    for c in text.nfc() {
        if c.is_control() {
            encoded.bytes.push(b' ');
            continue;
        }
        if let Some(byte) = direct_byte(c) {
            encoded.bytes.push(byte);
            continue;
        }
        if c == '₹' {
            encoded.bytes.extend_from_slice(b"Rs.");
            encoded.substitutions += 1;
            continue;
        }

        let base: Vec<u8> = c
            .to_string()
            .nfd()
            .filter(|d| !is_combining_mark(*d))
            .filter_map(direct_byte)
            .collect();
        encoded.substitutions += 1;
        if base.is_empty() {
            encoded.bytes.push(REPLACEMENT);
        } else {
            encoded.bytes.extend(base);
        }
    }

    encoded
}
