//! Assembles a laid-out page into a PDF file.

use crate::encoding::encode_win_ansi;
use crate::fonts::FontStyle;
use crate::layout::PageLayout;
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Document, Object, Stream};
use receipt_core::{Error, Result};

/// Write `page` as a one-page PDF.
///
/// Streams are left uncompressed and no creation date or file ID is written,
/// so the same page always yields the same bytes.
pub fn write_single_page(page: PageLayout, title: &str, author: &str) -> Result<Vec<u8>> {
    let (width_pt, height_pt) = page.size_pt();
    let mut doc = Document::with_version("1.4");
    let pages_id = doc.new_object_id();

    let mut fonts = Dictionary::new();
    for style in FontStyle::ALL {
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => style.base_font(),
            "Encoding" => "WinAnsiEncoding",
        });
        fonts.set(style.resource_name(), font_id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
    });

    let content = Content {
        operations: page.into_operations(),
    };
    let encoded = content
        .encode()
        .map_err(|e| Error::PdfError(format!("Failed to encode page content: {}", e)))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(encode_win_ansi(title).bytes),
        "Author" => Object::string_literal(encode_win_ansi(author).bytes),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| Error::PdfError(format!("Failed to write PDF: {}", e)))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Align;

    fn sample_page() -> PageLayout {
        let mut page = PageLayout::a4(10.0, 5.0, 10.0);
        page.set_font(FontStyle::Bold, 13.0);
        page.cell(0.0, 8.0, "Tax Exempt Receipt", Align::Center, true);
        page
    }

    #[test]
    fn test_single_page_loads_back() {
        let bytes = write_single_page(sample_page(), "T", "A").unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn test_output_is_deterministic() {
        let first = write_single_page(sample_page(), "T", "A").unwrap();
        let second = write_single_page(sample_page(), "T", "A").unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_text_is_stored_uncompressed() {
        let bytes = write_single_page(sample_page(), "T", "A").unwrap();
        let needle = b"(Tax Exempt Receipt)";

        assert!(bytes.windows(needle.len()).any(|w| w == needle));
    }
}
