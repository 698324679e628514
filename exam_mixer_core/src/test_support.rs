//! WordprocessingML builders shared by the unit tests

use std::io::{Cursor, Write};

use zip::write::FileOptions;
use zip::ZipWriter;

use crate::ooxml::{Block, WordDocument};

pub(crate) const NAMESPACES: &str = concat!(
    r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
    r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
    r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
    r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships""#,
);

pub(crate) fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}</w:body></w:document>"#,
        NAMESPACES, body
    )
}

fn escape(text: &str) -> String {
    quick_xml::escape::partial_escape(text).into_owned()
}

/// Plain run
pub(crate) fn run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, escape(text))
}

/// Run with the given `w:rPr` content
pub(crate) fn run_with(rpr: &str, text: &str) -> String {
    format!(
        r#"<w:r><w:rPr>{}</w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        rpr,
        escape(text)
    )
}

/// Run coloured red, the usual "correct answer" mark
pub(crate) fn red_run(text: &str) -> String {
    run_with(r#"<w:color w:val="FF0000"/>"#, text)
}

pub(crate) fn p(runs: &[String]) -> String {
    format!("<w:p>{}</w:p>", runs.concat())
}

/// Paragraph with a single plain run
pub(crate) fn line(text: &str) -> String {
    p(&[run(text)])
}

/// A four-option question; option `correct` (0-based) is coloured red
pub(crate) fn mcq(number: u32, stem: &str, options: [&str; 4], correct: Option<usize>) -> String {
    let mut xml = line(&format!("Câu {}. {}", number, stem));
    for (i, option) in options.iter().enumerate() {
        let letter = (b'A' + i as u8) as char;
        let label = format!("{}. {}", letter, option);
        if Some(i) == correct {
            xml.push_str(&p(&[red_run(&label)]));
        } else {
            xml.push_str(&line(&label));
        }
    }
    xml
}

/// Body blocks of a document built from `body`
pub(crate) fn blocks(body: &str) -> Vec<Block> {
    let mut doc = WordDocument::parse(&document_xml(body)).expect("test document parses");
    doc.take_body().expect("test document has a body").blocks
}

/// The single block described by `xml`
pub(crate) fn block(xml: &str) -> Block {
    blocks(xml).remove(0)
}

/// Minimal `.docx` archive with the given body and extra entries
pub(crate) fn build_docx(body: &str, extra: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut writer);
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        let entries: Vec<(&str, Vec<u8>)> = vec![
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes().to_vec()),
            ("_rels/.rels", ROOT_RELS.as_bytes().to_vec()),
            ("word/document.xml", document_xml(body).into_bytes()),
        ];
        for (name, data) in entries {
            zip.start_file(name, options).expect("zip entry");
            zip.write_all(&data).expect("zip write");
        }
        for (name, data) in extra {
            zip.start_file(*name, options).expect("zip entry");
            zip.write_all(data).expect("zip write");
        }
        zip.finish().expect("zip finish");
    }
    writer.into_inner()
}

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
