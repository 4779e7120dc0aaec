//! Minimal XMP reader producing the tag mapping the extractor consumes.
//!
//! Only what the calibration needs is collected: every `Spatial.*` AVM
//! property and the image dimensions. Dimensions come from the JPEG or PNG
//! header when the bytes decode as one, and from the TIFF or EXIF schema of
//! the packet otherwise. Properties
//! may be written as attributes of `rdf:Description` or as child elements,
//! and `rdf:Seq`/`rdf:Bag`/`rdf:Alt` lists become [`TagValue::Seq`].
//!
//! ```
//! use celestial_avm::xmp::parse_xmp;
//! use celestial_avm::{TagProvider, REFERENCE_PIXEL};
//!
//! let xml = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
//!   <rdf:Description xmlns:avm="http://www.communicatingastronomy.org/avm/1.0/">
//!     <avm:Spatial.ReferencePixel>
//!       <rdf:Seq><rdf:li>5.5</rdf:li><rdf:li>5.5</rdf:li></rdf:Seq>
//!     </avm:Spatial.ReferencePixel>
//!   </rdf:Description>
//! </rdf:RDF>"#;
//!
//! let tags = parse_xmp(xml).unwrap();
//! assert_eq!(tags.require_numbers::<2>(REFERENCE_PIXEL).unwrap(), [5.5, 5.5]);
//! ```

use std::io::Cursor;
use std::path::Path;

use image::ImageReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{AvmError, AvmResult};
use crate::tags::{TagMap, TagProvider, TagValue, IMAGE_HEIGHT, IMAGE_WIDTH};
use crate::trace::{trace_event, trace_span};

const PACKET_BOUNDS: [(&[u8], &[u8]); 2] = [
    (b"<x:xmpmeta", b"</x:xmpmeta>"),
    (b"<rdf:RDF", b"</rdf:RDF>"),
];

/// Locates the XMP packet inside image bytes.
///
/// Works on anything that embeds the packet verbatim: JPEG APP1 segments,
/// PNG `iTXt` chunks, or a sidecar `.xmp` file.
pub fn find_xmp_packet(bytes: &[u8]) -> Option<&str> {
    for (open, close) in PACKET_BOUNDS {
        let Some(start) = find(bytes, open, 0) else {
            continue;
        };
        let Some(end) = find(bytes, close, start) else {
            continue;
        };
        if let Ok(packet) = std::str::from_utf8(&bytes[start..end + close.len()]) {
            return Some(packet);
        }
    }
    None
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Reads an image (or sidecar) file and returns its AVM tags.
pub fn read_tags<P: AsRef<Path>>(path: P) -> AvmResult<TagMap> {
    let bytes = std::fs::read(path)?;
    tags_from_bytes(&bytes)
}

/// Finds and parses the XMP packet in `bytes`.
///
/// `Image Width` and `Image Height` are taken from the image header when
/// `bytes` is a decodable JPEG or PNG, overriding any packet values.
pub fn tags_from_bytes(bytes: &[u8]) -> AvmResult<TagMap> {
    let packet = find_xmp_packet(bytes).ok_or(AvmError::MissingXmp)?;

    let mut tags = TagMap::new();
    if let Some((width, height)) = header_dimensions(bytes) {
        trace_event!("header_dimensions", width = width, height = height);
        tags.set_number(IMAGE_WIDTH, f64::from(width))
            .set_number(IMAGE_HEIGHT, f64::from(height));
    }
    for (tag, value) in parse_xmp(packet)? {
        insert_first(&mut tags, tag, value);
    }
    Ok(tags)
}

/// Pixel dimensions from the container header, or `None` for a sidecar or
/// an unreadable header.
fn header_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

/// A property element whose value is still being read.
struct PendingProperty {
    element: Vec<u8>,
    tag: String,
    text: String,
    items: Vec<TagValue>,
    is_list: bool,
    item: Option<String>,
}

impl PendingProperty {
    fn new(element: &[u8], tag: String) -> Self {
        Self {
            element: element.to_vec(),
            tag,
            text: String::new(),
            items: Vec::new(),
            is_list: false,
            item: None,
        }
    }

    fn finish(self) -> (String, TagValue) {
        let value = if self.is_list {
            TagValue::Seq(self.items)
        } else {
            TagValue::Text(self.text)
        };
        (self.tag, value)
    }
}

/// Parses an XMP packet into AVM tags.
pub fn parse_xmp(xml: &str) -> AvmResult<TagMap> {
    let _span = trace_span!("parse_xmp", bytes = xml.len()).entered();

    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut tags = TagMap::new();
    let mut pending: Option<PendingProperty> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = e.local_name();
                if let Some(property) = pending.as_mut() {
                    match local.as_ref() {
                        b"Seq" | b"Bag" | b"Alt" => property.is_list = true,
                        b"li" => property.item = Some(String::new()),
                        _ => {}
                    }
                } else if local.as_ref() == b"Description" {
                    collect_attributes(e, &mut tags)?;
                } else if let Some(tag) = tag_name(local.as_ref()) {
                    pending = Some(PendingProperty::new(e.name().as_ref(), tag));
                }
            }
            Ok(Event::Empty(ref e)) => {
                if pending.is_none() && e.local_name().as_ref() == b"Description" {
                    collect_attributes(e, &mut tags)?;
                }
            }
            Ok(Event::Text(ref e)) => {
                if let Some(property) = pending.as_mut() {
                    let text = e.unescape().map_err(|e| AvmError::xmp_parse(e.to_string()))?;
                    match property.item.as_mut() {
                        Some(item) => item.push_str(&text),
                        None => property.text.push_str(&text),
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let closes_property = match pending.as_mut() {
                    Some(property) if e.local_name().as_ref() == b"li" => {
                        if let Some(item) = property.item.take() {
                            property.items.push(TagValue::Text(item));
                        }
                        false
                    }
                    Some(property) => e.name().as_ref() == property.element.as_slice(),
                    None => false,
                };
                if closes_property {
                    if let Some(done) = pending.take() {
                        let (tag, value) = done.finish();
                        insert_first(&mut tags, tag, value);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(AvmError::xmp_parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    trace_event!("xmp_parsed", tags = tags.len());
    Ok(tags)
}

fn collect_attributes(element: &BytesStart, tags: &mut TagMap) -> AvmResult<()> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| AvmError::xmp_parse(e.to_string()))?;
        let key = attr.key.as_ref();
        if key == b"xmlns" || key.starts_with(b"xmlns:") {
            continue;
        }
        if let Some(tag) = tag_name(attr.key.local_name().as_ref()) {
            let value = attr
                .unescape_value()
                .map_err(|e| AvmError::xmp_parse(e.to_string()))?;
            insert_first(tags, tag, TagValue::Text(value.into_owned()));
        }
    }
    Ok(())
}

/// Tag name for an XMP property local name, or `None` if it is not needed.
fn tag_name(local: &[u8]) -> Option<String> {
    let name = std::str::from_utf8(local).ok()?;
    match name {
        "ImageWidth" | "PixelXDimension" => Some(IMAGE_WIDTH.to_string()),
        "ImageLength" | "PixelYDimension" => Some(IMAGE_HEIGHT.to_string()),
        _ if name.starts_with("Spatial.") => Some(name.to_string()),
        _ => None,
    }
}

fn insert_first(tags: &mut TagMap, tag: String, value: TagValue) {
    if !tags.contains(&tag) {
        tags.set(tag, value);
    }
}
