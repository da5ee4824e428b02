use std::borrow::Cow;

use roxmltree::{Document, Node};

use super::error::DecodeError;
use super::layout;
use crate::protocols::common::reader::parse_or_default;

/// Interpret a raw datagram as packet text ready for [`parse_document`].
///
/// Elements are matched by local name only, so a namespace prefix that the
/// packet never declares is bound to a placeholder URI on the root element
/// instead of failing the parse.
///
/// # Errors
/// Returns `DecodeError::MalformedPacket` for invalid UTF-8, for markup that
/// does not parse, or when more than `layout::MAX_UNDECLARED_PREFIXES`
/// prefixes need binding.
pub fn packet_text(packet: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    let text = std::str::from_utf8(packet).map_err(|_| DecodeError::MalformedPacket)?;
    if !text.contains(':') {
        return Ok(Cow::Borrowed(text));
    }

    let mut text = Cow::Borrowed(text);
    for _ in 0..=layout::MAX_UNDECLARED_PREFIXES {
        let parsed = Document::parse(&text).map(drop);
        let prefix = match parsed {
            Ok(()) => return Ok(text),
            Err(roxmltree::Error::UnknownNamespace(prefix, _)) => prefix,
            Err(_) => return Err(DecodeError::MalformedPacket),
        };
        text = Cow::Owned(declare_prefix(&text, &prefix)?);
    }
    Err(DecodeError::MalformedPacket)
}

/// Parse packet text as an XML document.
///
/// # Errors
/// Returns `DecodeError::MalformedPacket` for malformed markup.
pub fn parse_document(text: &str) -> Result<Document<'_>, DecodeError> {
    Document::parse(text).map_err(|_| DecodeError::MalformedPacket)
}

fn declare_prefix(text: &str, prefix: &str) -> Result<String, DecodeError> {
    let at = root_name_end(text).ok_or(DecodeError::MalformedPacket)?;
    Ok(format!(
        "{} xmlns:{prefix}=\"{}\"{}",
        &text[..at],
        layout::UNDECLARED_NAMESPACE,
        &text[at..]
    ))
}

/// Byte offset just past the root element's tag name.
fn root_name_end(text: &str) -> Option<usize> {
    let mut offset = 0;
    loop {
        let open = offset + text[offset..].find('<')?;
        let tag = &text[open + 1..];
        if tag.starts_with('?') {
            offset = open + text[open..].find("?>")? + 2;
        } else if tag.starts_with("!--") {
            offset = open + text[open..].find("-->")? + 3;
        } else if tag.starts_with('!') {
            return None;
        } else {
            let len = tag.find(|c: char| c.is_whitespace() || c == '/' || c == '>')?;
            return Some(open + 1 + len);
        }
    }
}

/// Read-only view of one element of an Intuition packet.
///
/// A reader may be detached (the element is absent from the packet); every
/// lookup on a detached reader yields the field's zero value, matching how
/// the gateway omits elements it has nothing to report for.
#[derive(Clone, Copy)]
pub struct IntuitionReader<'a, 'input> {
    node: Option<Node<'a, 'input>>,
}

impl<'a, 'input> IntuitionReader<'a, 'input> {
    pub fn new(node: Node<'a, 'input>) -> Self {
        Self { node: Some(node) }
    }

    /// Local name of the element, without namespace prefix.
    pub fn name(&self) -> &'input str {
        self.node.map(|node| node.tag_name().name()).unwrap_or("")
    }

    /// First child element with the given local name, detached if absent.
    pub fn child(&self, name: &str) -> Self {
        let node = self
            .node
            .and_then(|node| node.children().find(|child| is_element_named(child, name)));
        Self { node }
    }

    /// All child elements with the given local name, in document order.
    pub fn children(&self, name: &str) -> Vec<Self> {
        match self.node {
            Some(node) => node
                .children()
                .filter(|child| is_element_named(child, name))
                .map(Self::new)
                .collect(),
            None => Vec::new(),
        }
    }

    /// Attribute value by local name, ignoring any namespace prefix.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.node.and_then(|node| {
            node.attributes()
                .find(|attr| attr.name() == name)
                .map(|attr| attr.value())
        })
    }

    pub fn attr_str(&self, name: &str) -> String {
        self.attr(name).unwrap_or_default().to_string()
    }

    pub fn attr_f64(&self, name: &str) -> Result<f64, DecodeError> {
        parse_or_default(self.attr(name)).ok_or(DecodeError::MalformedPacket)
    }

    /// Character data directly inside the element.
    ///
    /// Text split by comments or CDATA sections is joined back together;
    /// text inside nested elements is not included.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        let node = self.node?;
        let mut parts = node
            .children()
            .filter(|child| child.is_text())
            .filter_map(|child| child.text());
        let first = parts.next()?;
        match parts.next() {
            None => Some(Cow::Borrowed(first)),
            Some(second) => {
                let mut joined = String::from(first);
                joined.push_str(second);
                joined.extend(parts);
                Some(Cow::Owned(joined))
            }
        }
    }

    pub fn text_f64(&self) -> Result<f64, DecodeError> {
        parse_or_default(self.text().as_deref()).ok_or(DecodeError::MalformedPacket)
    }

    pub fn text_i64(&self) -> Result<i64, DecodeError> {
        parse_or_default(self.text().as_deref()).ok_or(DecodeError::MalformedPacket)
    }
}

fn is_element_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Parse a battery level of the form `<float>%`.
///
/// Every percent sign is stripped before parsing, so `"100%"` reads as
/// `100.0`.
///
/// # Errors
/// Returns `DecodeError::InvalidBatteryFormat` carrying the raw level when
/// the value does not end in `%` or the remainder is not a number.
pub fn parse_battery_level(level: &str) -> Result<f64, DecodeError> {
    let invalid = || DecodeError::InvalidBatteryFormat {
        level: level.to_string(),
    };
    if !level.ends_with(layout::PERCENT_SIGN) {
        return Err(invalid());
    }
    level
        .replace(layout::PERCENT_SIGN, "")
        .parse::<f64>()
        .map_err(|_| invalid())
}

#[cfg(test)]
mod tests {
    use std::borrow::Cow;

    use super::{IntuitionReader, packet_text, parse_battery_level, parse_document};
    use crate::protocols::intuition::error::DecodeError;

    #[test]
    fn packet_text_rejects_invalid_utf8() {
        let result = packet_text(&[0x3c, 0xff, 0xfe, 0x3e]);
        assert!(matches!(result, Err(DecodeError::MalformedPacket)));
    }

    #[test]
    fn packet_text_borrows_plain_packets() {
        let packet = b"<electricity id='1'><timestamp>7</timestamp></electricity>";
        assert!(matches!(packet_text(packet), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn packet_text_binds_undeclared_prefixes() {
        let packet = b"<?xml version='1.0'?><!-- owl --><owl:electricity id='1'><x:timestamp>7</x:timestamp></owl:electricity>";
        let text = packet_text(packet).unwrap();
        let doc = parse_document(&text).unwrap();
        let root = IntuitionReader::new(doc.root_element());
        assert_eq!(root.name(), "electricity");
        assert_eq!(root.attr_str("id"), "1");
        assert_eq!(root.child("timestamp").text_i64(), Ok(7));
    }

    #[test]
    fn packet_text_keeps_colons_in_values() {
        let packet = b"<electricity id='a:b'><timestamp>7</timestamp></electricity>";
        let text = packet_text(packet).unwrap();
        assert_eq!(text.as_ref().as_bytes(), packet);
    }

    #[test]
    fn packet_text_rejects_malformed_markup_with_prefix() {
        let result = packet_text(b"<owl:electricity><owl:chan></owl:electricity>");
        assert!(matches!(result, Err(DecodeError::MalformedPacket)));
    }

    #[test]
    fn detached_reader_reads_zero_values() {
        let doc = parse_document("<electricity/>").unwrap();
        let root = IntuitionReader::new(doc.root_element());
        let missing = root.child("signal");
        assert_eq!(missing.name(), "");
        assert_eq!(missing.attr_f64("rssi"), Ok(0.0));
        assert_eq!(missing.child("curr").text_f64(), Ok(0.0));
        assert!(missing.children("chan").is_empty());
        assert_eq!(root.attr_str("id"), "");
    }

    #[test]
    fn reader_ignores_namespace_prefix() {
        let doc = parse_document(
            r#"<owl:electricity xmlns:owl="urn:owl"><owl:timestamp>7</owl:timestamp></owl:electricity>"#,
        )
        .unwrap();
        let root = IntuitionReader::new(doc.root_element());
        assert_eq!(root.name(), "electricity");
        assert_eq!(root.child("timestamp").text_i64(), Ok(7));
    }

    #[test]
    fn reader_rejects_non_numeric_text() {
        let doc = parse_document("<curr units='w'>lots</curr>").unwrap();
        let curr = IntuitionReader::new(doc.root_element());
        assert_eq!(curr.text_f64(), Err(DecodeError::MalformedPacket));
        assert_eq!(curr.attr_str("units"), "w");
    }

    #[test]
    fn text_joins_split_character_data() {
        let doc =
            parse_document("<curr units='w'>305<!--c-->.<![CDATA[00]]><x>9</x></curr>").unwrap();
        let curr = IntuitionReader::new(doc.root_element());
        assert_eq!(curr.text().as_deref(), Some("305.00"));
        assert_eq!(curr.text_f64(), Ok(305.0));
    }

    #[test]
    fn battery_level_strips_percent() {
        assert_eq!(parse_battery_level("100%"), Ok(100.0));
        assert_eq!(parse_battery_level("87.5%"), Ok(87.5));
    }

    #[test]
    fn battery_level_requires_number_and_percent() {
        for level in ["", "%", "80", "full%", "8 0%"] {
            let err = parse_battery_level(level).unwrap_err();
            assert_eq!(
                err,
                DecodeError::InvalidBatteryFormat {
                    level: level.to_string()
                }
            );
        }
    }
}
