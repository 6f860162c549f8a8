//! Incremental PDF document builder on top of lopdf.
//!
//! The builder owns one [`lopdf::Document`] for the lifetime of a single
//! generation. Pages are appended in call order; the page tree, catalog and
//! `/Info` dictionary are only written in [`DocumentBuilder::finish`].
//!
//! # Coordinate System
//!
//! PDF uses a **bottom-left origin**, while [`Placement`] is top-left. The
//! image transform converts with:
//! ```text
//! pdf_y = page_height - placement.y - placement.height
//! ```

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, text_string};
use tracing::debug;

use super::embed::ImageXObject;
use crate::error::{Error, Result};
use crate::layout::{Orientation, PageSize, Placement, SheetFormat};

/// PDF version written by the builder.
const PDF_VERSION: &str = "1.5";

/// Producer string stored in the document information dictionary.
const PRODUCER: &str = concat!("imgpdf ", env!("CARGO_PKG_VERSION"));

pub struct DocumentBuilder {
    doc: Document,
    pages_id: ObjectId,
    first_page: ObjectId,
    page_ids: Vec<ObjectId>,
    sheet: SheetFormat,
    title: Option<String>,
    image_count: usize,
}

impl DocumentBuilder {
    /// Start a document whose first page has the given orientation.
    pub fn new(sheet: SheetFormat, first_orientation: Orientation) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);
        let pages_id = doc.new_object_id();
        let first_page = insert_page(&mut doc, pages_id, sheet.page_size(first_orientation));

        Self {
            doc,
            pages_id,
            first_page,
            page_ids: vec![first_page],
            sheet,
            title: None,
            image_count: 0,
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Append a page of the builder's sheet format.
    pub fn add_page(&mut self, orientation: Orientation) -> ObjectId {
        let size = self.sheet.page_size(orientation);
        let page_id = insert_page(&mut self.doc, self.pages_id, size);
        self.page_ids.push(page_id);
        page_id
    }

    /// The page created together with the document.
    pub const fn first_page(&self) -> ObjectId {
        self.first_page
    }

    /// Pages in document order.
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Usable size of a page, read back from its MediaBox.
    pub fn page_size(&self, page_id: ObjectId) -> Result<PageSize> {
        let page_obj = self
            .doc
            .get_object(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page object: {e}")))?;

        let [x0, y0, x1, y1] = get_media_box(&self.doc, page_obj)
            .ok_or_else(|| Error::Lopdf(format!("Page {page_id:?} has no MediaBox")))?;

        Ok(PageSize::new(x1 - x0, y1 - y0))
    }

    /// Draw an image onto a page at `placement`.
    pub fn draw_image(
        &mut self,
        page_id: ObjectId,
        xobject: ImageXObject,
        placement: Placement,
    ) -> Result<()> {
        let page = self.page_size(page_id)?;

        let ImageXObject { mut image, smask } = xobject;
        if let Some(smask) = smask {
            let smask_id = self.doc.add_object(Object::Stream(smask));
            image.dict.set("SMask", Object::Reference(smask_id));
        }
        let image_id = self.doc.add_object(Object::Stream(image));

        let name = format!("Im{}", self.image_count);
        self.image_count += 1;

        self.add_xobject_to_page(page_id, &name, image_id)?;

        let pdf_y = page.height - placement.y - placement.height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(placement.width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(placement.height),
                        Object::Real(placement.x),
                        Object::Real(pdf_y),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_bytes = content
            .encode()
            .map_err(|e| Error::Lopdf(format!("Failed to encode content stream: {e}")))?;

        self.append_content_to_page(page_id, content_bytes)?;

        debug!(
            "Drew image at ({:.1}, {:.1}) size {:.1}x{:.1}",
            placement.x, placement.y, placement.width, placement.height
        );
        Ok(())
    }

    /// Write the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let kids: Vec<Object> = self.page_ids.iter().map(|&id| Object::Reference(id)).collect();

        #[allow(clippy::cast_possible_wrap)]
        let count = self.page_ids.len() as i64;

        let pages_dict = Dictionary::from_iter([
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
        ]);
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages_dict));

        let catalog_id = self.doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(self.pages_id)),
        ]));
        self.doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut info = Dictionary::new();
        info.set("Producer", text_string(PRODUCER));
        // Text strings: PDFDocEncoding when ASCII, UTF-16BE with BOM otherwise
        if let Some(title) = &self.title {
            info.set("Title", text_string(title));
        }
        let info_id = self.doc.add_object(Object::Dictionary(info));
        self.doc.trailer.set("Info", Object::Reference(info_id));

        self.doc.compress();

        let mut output = Vec::new();
        self.doc
            .save_to(&mut output)
            .map_err(|e| Error::PdfSave(format!("Failed to save PDF: {e}")))?;

        Ok(output)
    }

    /// Register an image under `name` in the page's inline Resources.
    fn add_xobject_to_page(&mut self, page_id: ObjectId, name: &str, image_id: ObjectId) -> Result<()> {
        let page = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

        let Object::Dictionary(page_dict) = page else {
            return Err(Error::Lopdf(format!("Page {page_id:?} is not a dictionary")));
        };

        let mut resources = match page_dict.get(b"Resources") {
            Ok(Object::Dictionary(d)) => d.clone(),
            _ => Dictionary::new(),
        };
        let mut xobjects = match resources.get(b"XObject") {
            Ok(Object::Dictionary(d)) => d.clone(),
            _ => Dictionary::new(),
        };

        xobjects.set(name, Object::Reference(image_id));
        resources.set("XObject", Object::Dictionary(xobjects));
        page_dict.set("Resources", Object::Dictionary(resources));

        Ok(())
    }

    /// Append a content stream to a page.
    fn append_content_to_page(&mut self, page_id: ObjectId, content: Vec<u8>) -> Result<()> {
        let content_id = self
            .doc
            .add_object(Object::Stream(Stream::new(Dictionary::new(), content)));

        let page = self
            .doc
            .get_object_mut(page_id)
            .map_err(|e| Error::Lopdf(format!("Failed to get page: {e}")))?;

        if let Object::Dictionary(dict) = page {
            let existing_contents = dict.get(b"Contents").ok().cloned();

            match existing_contents {
                Some(Object::Reference(existing_id)) => {
                    dict.set(
                        "Contents",
                        Object::Array(vec![
                            Object::Reference(existing_id),
                            Object::Reference(content_id),
                        ]),
                    );
                }
                Some(Object::Array(mut arr)) => {
                    arr.push(Object::Reference(content_id));
                    dict.set("Contents", Object::Array(arr));
                }
                _ => {
                    dict.set("Contents", Object::Reference(content_id));
                }
            }
        }

        Ok(())
    }
}

fn insert_page(doc: &mut Document, pages_id: ObjectId, size: PageSize) -> ObjectId {
    doc.add_object(Dictionary::from_iter([
        ("Type", Object::Name(b"Page".to_vec())),
        ("Parent", Object::Reference(pages_id)),
        (
            "MediaBox",
            Object::Array(vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(size.width),
                Object::Real(size.height),
            ]),
        ),
        ("Resources", Object::Dictionary(Dictionary::new())),
    ]))
}

/// Get media box from a page object, following `/Parent` inheritance.
pub(crate) fn get_media_box(doc: &Document, page_obj: &Object) -> Option<[f32; 4]> {
    let Object::Dictionary(dict) = page_obj else {
        return None;
    };

    if let Ok(Object::Array(arr)) = dict.get(b"MediaBox")
        && arr.len() == 4
    {
        let values: Vec<f32> = arr
            .iter()
            .filter_map(|o| match o {
                #[allow(clippy::cast_precision_loss)]
                Object::Integer(i) => Some(*i as f32),
                Object::Real(r) => Some(*r),
                _ => None,
            })
            .collect();

        if values.len() == 4 {
            return Some([values[0], values[1], values[2], values[3]]);
        }
    }

    if let Ok(Object::Reference(parent_id)) = dict.get(b"Parent")
        && let Ok(parent) = doc.get_object(*parent_id)
    {
        return get_media_box(doc, parent);
    }

    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::layout::fit_image;
    use crate::pdf::embed::image_xobject;
    use crate::record::ImageRecord;
    use crate::record::tests::{jpeg, png_rgba};

    #[test]
    fn test_first_page_created_up_front() {
        let builder = DocumentBuilder::new(SheetFormat::A4, Orientation::Landscape);
        assert_eq!(builder.page_count(), 1);

        let size = builder.page_size(builder.first_page()).unwrap();
        assert_eq!(size, SheetFormat::A4.page_size(Orientation::Landscape));
    }

    #[test]
    fn test_page_size_reflects_orientation() {
        let mut builder = DocumentBuilder::new(SheetFormat::Letter, Orientation::Portrait);
        let second = builder.add_page(Orientation::Landscape);
        let first = builder.page_size(builder.first_page()).unwrap();
        let second = builder.page_size(second).unwrap();
        assert_eq!(first.width, second.height);
        assert_eq!(first.height, second.width);
        assert!(second.width > second.height);
    }

    #[test]
    fn test_finish_writes_loadable_document() {
        let mut builder = DocumentBuilder::new(SheetFormat::A4, Orientation::Portrait)
            .with_title(Some("Holiday".to_string()));
        builder.add_page(Orientation::Landscape);
        builder.add_page(Orientation::Portrait);

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);

        let info_id = doc.trailer.get(b"Info").unwrap().as_reference().unwrap();
        let info = doc.get_dictionary(info_id).unwrap();
        assert_eq!(info.get(b"Title").unwrap().as_str().unwrap(), b"Holiday");
    }

    #[test]
    fn test_draw_image_registers_xobject_and_content() {
        let record = ImageRecord::new("a.jpg", jpeg(30, 20)).unwrap();
        let dims = record.dimensions(0).unwrap();

        let mut builder = DocumentBuilder::new(SheetFormat::A4, Orientation::Landscape);
        let page_id = builder.first_page();
        let placement = fit_image(dims, builder.page_size(page_id).unwrap());
        builder
            .draw_image(page_id, image_xobject(&record, dims).unwrap(), placement)
            .unwrap();

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();

        let content = doc.get_and_decode_page_content(page_id).unwrap();
        let ops: Vec<&str> = content.operations.iter().map(|op| op.operator.as_str()).collect();
        assert_eq!(ops, ["q", "cm", "Do", "Q"]);

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert!(xobjects.get(b"Im0").is_ok());
    }

    #[test]
    fn test_smask_is_linked_to_image() {
        let record = ImageRecord::new("a.png", png_rgba(3, 3)).unwrap();
        let dims = record.dimensions(0).unwrap();

        let mut builder = DocumentBuilder::new(SheetFormat::A4, Orientation::Portrait);
        let page_id = builder.first_page();
        let placement = fit_image(dims, builder.page_size(page_id).unwrap());
        builder
            .draw_image(page_id, image_xobject(&record, dims).unwrap(), placement)
            .unwrap();

        let bytes = builder.finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        let has_smask = doc.objects.values().any(|obj| {
            obj.as_stream()
                .is_ok_and(|s| s.dict.get(b"SMask").is_ok())
        });
        assert!(has_smask);
    }
}
