//! ComicInfo.xml descriptor synthesis
//!
//! Only `Title` and `Series` are ever populated. The document is written
//! without an XML declaration, matching what most readers already ship.

use std::io::Cursor;

use quick_xml::Writer;
use quick_xml::events::BytesText;

use super::ArchiveRef;

/// Entry name readers look for inside an archive
pub const COMIC_INFO_ENTRY: &str = "ComicInfo.xml";

/// Minimal descriptor for one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComicInfo {
    pub title: String,
    pub series: String,
}

impl ComicInfo {
    pub fn new(series: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            series: series.into(),
        }
    }

    /// Series from the parent directory, title from the file stem
    pub fn for_archive(archive: &ArchiveRef) -> Self {
        Self::new(archive.series_name(), archive.title_name())
    }

    /// Serialize to UTF-8 XML bytes
    pub fn to_xml(&self) -> Vec<u8> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer
            .create_element("ComicInfo")
            .write_inner_content(|w| {
                w.create_element("Title")
                    .write_text_content(BytesText::new(&self.title))?;
                w.create_element("Series")
                    .write_text_content(BytesText::new(&self.series))?;
                Ok::<(), quick_xml::Error>(())
            })
            .expect("writing XML into a Vec cannot fail");
        writer.into_inner().into_inner()
    }
}

/// Build the descriptor document for a series/title pair
pub fn synthesize(series: &str, title: &str) -> Vec<u8> {
    ComicInfo::new(series, title).to_xml()
}
