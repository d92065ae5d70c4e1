//! Tax-exempt donation receipt rendered as a one-page PDF.

use crate::document::write_single_page;
use crate::fonts::FontStyle;
use crate::layout::{Align, PageLayout};
use receipt_core::{
    AmountFormatter, FilenameBuilder, LedgerRow, NameNormalizer, NormalizedReceipt,
    OrganizationProfile, ReceiptDocument, ReceiptRenderer, Result,
};

/// File extension of rendered receipts.
pub const RECEIPT_EXTENSION: &str = "pdf";

const RECEIPT_TITLE: &str = "Tax Exempt Receipt";

/// Width of the bold label column in the details block.
const LABEL_WIDTH_MM: f32 = 48.0;

/// Renders donation receipts for one organization.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    profile: OrganizationProfile,
    names: NameNormalizer,
    amounts: AmountFormatter,
    filenames: FilenameBuilder,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self::new(OrganizationProfile::default())
    }
}

impl PdfRenderer {
    /// Create a renderer printing `profile` in every header and footer.
    pub fn new(profile: OrganizationProfile) -> Self {
        Self {
            profile,
            names: NameNormalizer::new(),
            amounts: AmountFormatter::new(),
            filenames: FilenameBuilder::new(),
        }
    }

    /// Derive the printed values for a row.
    pub fn normalize(&self, row: &LedgerRow) -> Result<NormalizedReceipt> {
        NormalizedReceipt::from_row(row, &self.names, &self.amounts, &self.filenames)
    }

    /// Render a normalized receipt to its document.
    pub fn render_receipt(&self, receipt: &NormalizedReceipt) -> Result<ReceiptDocument> {
        let page = self.layout(receipt);
        if page.substitutions() > 0 {
            log::warn!(
                "Receipt '{}': {} character(s) approximated for the PDF font",
                receipt.serial,
                page.substitutions()
            );
        }

        let bytes = write_single_page(page, &receipt.serial, &self.profile.name)?;
        Ok(ReceiptDocument::new(&receipt.serial, RECEIPT_EXTENSION, bytes))
    }

    /// Lay out the receipt page.
    pub fn layout(&self, receipt: &NormalizedReceipt) -> PageLayout {
        let mut page = PageLayout::a4(10.0, 5.0, 10.0);

        self.letterhead(&mut page);

        page.set_font(FontStyle::Bold, 13.0);
        page.cell(0.0, 8.0, RECEIPT_TITLE, Align::Center, true);
        page.ln(2.0);

        page.set_font(FontStyle::Regular, 10.0);
        let (line_start, _) = page.cursor();
        page.cell(
            0.0,
            6.0,
            &format!("Receipt No.  {}", receipt.receipt_no),
            Align::Left,
            false,
        );
        page.set_x(line_start);
        page.cell(0.0, 6.0, &format!("Date: {}", receipt.date), Align::Right, true);
        page.ln(2.0);

        let salutation = [
            format!("Received with thanks from {},", receipt.donor_name),
            format!(
                "We have received your donation of Rs. {}. Thank you for your generosity.",
                receipt.amount_display
            ),
            "The details of the donation are mentioned below:".to_string(),
        ];
        for line in &salutation {
            page.cell(0.0, 6.0, line, Align::Center, true);
        }
        page.ln(3.0);

        let details = [
            ("Donor Name:", receipt.donor_name.as_str()),
            ("PAN No:", receipt.pan_no.as_str()),
            ("Address:", receipt.address.as_str()),
            ("Transaction ID:", receipt.transaction_ref.as_str()),
            ("Amount in words:", receipt.amount_words.as_str()),
        ];
        for (label, value) in details {
            page.set_font(FontStyle::Bold, 10.0);
            page.cell(LABEL_WIDTH_MM, 6.0, label, Align::Left, false);
            page.set_font(FontStyle::Regular, 10.0);
            page.multi_cell(0.0, 6.0, value, Align::Left);
        }

        page.ln(3.0);
        page.set_font(FontStyle::Regular, 9.5);
        page.multi_cell(0.0, 6.0, &self.profile.tax_exemption_notice, Align::Left);

        page.ln(2.0);
        page.set_font(FontStyle::Italic, 7.5);
        page.set_text_color(50, 50, 50);
        page.multi_cell(0.0, 3.8, &self.profile.disclaimers.join("\n"), Align::Left);

        page
    }

    /// Organization name, address and registration numbers.
    fn letterhead(&self, page: &mut PageLayout) {
        page.set_font(FontStyle::Bold, 16.0);
        page.set_text_color(200, 0, 0);
        page.cell(0.0, 8.0, &self.profile.name, Align::Center, true);

        page.set_font(FontStyle::Regular, 9.0);
        page.set_text_color(0, 0, 0);
        page.multi_cell(0.0, 5.0, &self.profile.address_lines.join("\n"), Align::Center);
        page.ln(1.0);

        page.set_font(FontStyle::Regular, 8.5);
        page.cell(0.0, 5.0, &self.profile.registration_line, Align::Center, true);
        page.ln(2.0);
    }
}

impl ReceiptRenderer for PdfRenderer {
    fn render(&self, row: &LedgerRow) -> Result<ReceiptDocument> {
        let receipt = self.normalize(row)?;
        log::debug!("Rendering receipt '{}' for row {}", receipt.serial, row.index);
        self.render_receipt(&receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use lopdf::Document;
    use receipt_core::{BatchProcessor, BatchRequest, CellValue, Error, RawTable, REQUIRED_COLUMNS};
    use std::io::{Cursor, Read};
    use zip::ZipArchive;

    fn sample_row() -> LedgerRow {
        LedgerRow {
            index: 0,
            date: NaiveDate::from_ymd_opt(2024, 4, 5).unwrap(),
            particulars: "Dr. Asha Verma (Regular Donor)".to_string(),
            address: "12 Park Street, Kolkata".to_string(),
            voucher_type: "Receipt".to_string(),
            voucher_no: "JSF/2024/001".to_string(),
            pan_no: "ABCDE1234F".to_string(),
            narration: "UPI-REF-99881".to_string(),
            gross_total: Some(1500.0),
            donation: 1500.0,
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|w| w == needle.as_bytes())
    }

    #[test]
    fn test_render_filename() {
        let doc = PdfRenderer::default().render(&sample_row()).unwrap();
        assert_eq!(doc.filename, "JSF-2024-001_Asha_Verma.pdf");
    }

    #[test]
    fn test_render_is_single_page_pdf() {
        let doc = PdfRenderer::default().render(&sample_row()).unwrap();
        let pdf = Document::load_mem(&doc.bytes).unwrap();

        assert_eq!(pdf.get_pages().len(), 1);
    }

    #[test]
    fn test_render_contents() {
        let doc = PdfRenderer::default().render(&sample_row()).unwrap();
        let bytes = &doc.bytes;

        assert!(contains(bytes, "Jeev Sewa Foundation"));
        assert!(contains(bytes, "Tax Exempt Receipt"));
        assert!(contains(bytes, "Receipt No.  JSF/2024/001"));
        assert!(contains(bytes, "Date: 05-04-2024"));
        assert!(contains(bytes, "Received with thanks from Asha Verma,"));
        assert!(contains(bytes, "Rs. 1,500.00. Thank you for your generosity."));
        assert!(contains(bytes, "ABCDE1234F"));
        assert!(contains(bytes, "UPI-REF-99881"));
        assert!(contains(bytes, "One Thousand Five Hundred Rupees Only"));
        assert!(contains(bytes, "computer-generated receipt"));
    }

    #[test]
    fn test_render_is_deterministic() {
        let renderer = PdfRenderer::default();
        let first = renderer.render(&sample_row()).unwrap();
        let second = renderer.render(&sample_row()).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_profile_in_header() {
        let profile = OrganizationProfile {
            name: "Asha Kiran Trust".to_string(),
            ..Default::default()
        };
        let doc = PdfRenderer::new(profile).render(&sample_row()).unwrap();

        assert!(contains(&doc.bytes, "Asha Kiran Trust"));
        assert!(!contains(&doc.bytes, "(Jeev Sewa Foundation)"));
    }

    #[test]
    fn test_empty_pan_renders() {
        let mut row = sample_row();
        row.pan_no.clear();

        assert!(PdfRenderer::default().render(&row).is_ok());
    }

    #[test]
    fn test_reversal_amount_renders_minus() {
        let mut row = sample_row();
        row.donation = -500.0;
        let doc = PdfRenderer::default().render(&row).unwrap();

        assert!(contains(&doc.bytes, "Minus Five Hundred Rupees Only"));
        assert!(contains(&doc.bytes, "Rs. -500.00."));
    }

    #[test]
    fn test_non_finite_amount_fails() {
        let mut row = sample_row();
        row.donation = f64::NAN;

        assert!(matches!(
            PdfRenderer::default().render(&row),
            Err(Error::InvalidAmount(_))
        ));
    }

    fn ledger(rows: &[(&str, &str, f64)]) -> RawTable {
        let mut raw = RawTable::new(REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect());
        for (voucher, particulars, donation) in rows {
            raw.push_row(vec![
                CellValue::Number(45387.0),
                CellValue::Text(particulars.to_string()),
                CellValue::Text("12 Park Street, Kolkata".to_string()),
                CellValue::Text("Receipt".to_string()),
                CellValue::Text(voucher.to_string()),
                CellValue::Text("ABCDE1234F".to_string()),
                CellValue::Text("UPI-REF".to_string()),
                CellValue::Number(*donation),
                CellValue::Number(*donation),
            ]);
        }
        raw
    }

    #[test]
    fn test_batch_archive_holds_one_page_pdf_per_row() {
        let raw = ledger(&[
            ("JSF/2024/001", "Dr. Asha Verma (Regular Donor)", 1500.0),
            ("JSF/2024/002", "Mr. Ravi Kumar", 2500.0),
            ("JSF/2024/003", "Neha Singh", 300.0),
        ]);
        let processor = BatchProcessor::new(PdfRenderer::default());
        let outcome = processor.process(&raw, &BatchRequest::new()).unwrap();
        assert_eq!(outcome.generated, 3);

        let filenames = FilenameBuilder::new();
        let expected: Vec<String> = [
            ("JSF/2024/001", "Asha Verma"),
            ("JSF/2024/002", "Ravi Kumar"),
            ("JSF/2024/003", "Neha Singh"),
        ]
        .iter()
        .map(|(voucher, name)| format!("{}.pdf", filenames.build_serial(voucher, name)))
        .collect();

        let bytes = outcome.archive.to_zip_bytes().unwrap();
        let mut zip = ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), expected.len());

        for (i, name) in expected.iter().enumerate() {
            let mut entry = zip.by_index(i).unwrap();
            assert_eq!(entry.name(), name);

            let mut pdf = Vec::new();
            entry.read_to_end(&mut pdf).unwrap();
            let doc = Document::load_mem(&pdf).unwrap();
            assert_eq!(doc.get_pages().len(), 1);
        }
    }

    #[test]
    fn test_layout_fits_on_one_page() {
        let renderer = PdfRenderer::default();
        let mut row = sample_row();
        row.address = "Flat 4B, ".repeat(30);
        let receipt = renderer.normalize(&row).unwrap();
        let page = renderer.layout(&receipt);

        let (_, y) = page.cursor();
        assert!(y < crate::layout::A4_HEIGHT_MM);
    }
}
