use anyhow::Result;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

const POINTS_PER_INCH: f32 = 72.0;

/// Lays out one image per page, each page exactly the size of its image at
/// the configured resolution.
#[derive(Debug, Clone, Copy)]
pub struct PdfWriter {
    resolution: f32,
    jpeg_quality: u8,
}

impl PdfWriter {
    pub fn new(resolution: f32, jpeg_quality: u8) -> Self {
        Self {
            resolution: if resolution > 0.0 { resolution } else { 100.0 },
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    /// Serializes the pages into an in-memory PDF.
    pub fn render(&self, pages: &[DynamicImage]) -> Result<Vec<u8>> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
        for page in pages {
            kids.push(self.add_page(&mut doc, pages_id, page)?.into());
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)?;
        Ok(buf)
    }

    fn add_page(
        &self,
        doc: &mut Document,
        parent: ObjectId,
        page: &DynamicImage,
    ) -> Result<ObjectId> {
        let (width, height) = (page.width(), page.height());
        let (jpeg, color_space) = self.encode(page)?;

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8_i64,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        let w = width as f32 * POINTS_PER_INCH / self.resolution;
        let h = height as f32 * POINTS_PER_INCH / self.resolution;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![w.into(), 0.into(), 0.into(), h.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Page".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let media_box: Vec<Object> = vec![0.into(), 0.into(), w.into(), h.into()];

        Ok(doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => parent,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Page" => image_id },
            },
        }))
    }

    fn encode(&self, page: &DynamicImage) -> Result<(Vec<u8>, &'static str)> {
        let mut out = Vec::new();
        let color_space = {
            let mut encoder = JpegEncoder::new_with_quality(&mut out, self.jpeg_quality);
            match page {
                DynamicImage::ImageLuma8(gray) => {
                    encoder.encode(gray, gray.width(), gray.height(), ExtendedColorType::L8)?;
                    "DeviceGray"
                }
                other => {
                    let rgb = other.to_rgb8();
                    encoder.encode(&rgb, rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
                    "DeviceRGB"
                }
            }
        };
        Ok((out, color_space))
    }
}
