//! Response negotiation
//!
//! Picks JSON or XML from the client's `Accept` header and renders an object
//! in that format, preferring the object's native serializer and falling back
//! to its generic mapping form.

use crate::error::{BindError, Result};
use crate::model::{Mapping, Serializable};
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::fmt;

/// Root element used when a mapping is rendered as XML
pub const XML_ROOT: &str = "hash";

/// Supported response formats, in tie-break priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Json,
    Xml,
}

impl Format {
    /// All formats, highest priority first.
    pub const ALL: [Format; 2] = [Format::Json, Format::Xml];

    /// Content type sent with a response in this format.
    pub fn content_type(&self) -> &'static str {
        match self {
            Format::Json => "application/json",
            Format::Xml => "application/xml",
        }
    }

    /// Media types that select this format.
    pub fn media_types(&self) -> &'static [&'static str] {
        match self {
            Format::Json => &["application/json", "text/json"],
            Format::Xml => &["application/xml", "text/xml"],
        }
    }

    /// Short name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Xml => "xml",
        }
    }

    /// Encode a mapping in this format.
    pub fn encode(&self, mapping: &Mapping) -> Result<String> {
        match self {
            Format::Json => serde_json::to_string(mapping).map_err(|e| BindError::Encode {
                format: *self,
                message: e.to_string(),
            }),
            Format::Xml => {
                if let Some(key) = reserved_xml_key(mapping) {
                    return Err(BindError::Encode {
                        format: *self,
                        message: format!("key '{}' cannot be written as an XML element", key),
                    });
                }
                quick_xml::se::to_string_with_root(XML_ROOT, mapping).map_err(|e| {
                    BindError::Encode {
                        format: *self,
                        message: e.to_string(),
                    }
                })
            }
        }
    }
}

/// First key, at any depth, that quick-xml would write as an attribute (`@`)
/// or as text content (`$text`, `$value`) instead of a child element.
fn reserved_xml_key(mapping: &Mapping) -> Option<&str> {
    fn scan(value: &Value) -> Option<&str> {
        match value {
            Value::Object(map) => reserved_xml_key(map),
            Value::Array(items) => items.iter().find_map(scan),
            _ => None,
        }
    }

    mapping.iter().find_map(|(key, value)| {
        if key.starts_with('@') || key.starts_with('$') {
            Some(key.as_str())
        } else {
            scan(value)
        }
    })
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One entry of an `Accept` header.
#[derive(Debug, Clone, PartialEq)]
struct MediaRange {
    kind: String,
    subtype: String,
    quality: f32,
}

impl MediaRange {
    fn parse(entry: &str) -> Option<Self> {
        let mut pieces = entry.split(';');
        let media = pieces.next()?.trim().to_ascii_lowercase();
        let (kind, subtype) = media.split_once('/')?;
        if kind.is_empty() || subtype.is_empty() {
            return None;
        }

        let mut quality = 1.0;
        for param in pieces {
            if let Some((name, value)) = param.split_once('=') {
                if name.trim().eq_ignore_ascii_case("q") {
                    quality = value.trim().parse::<f32>().ok().filter(|q| q.is_finite())?;
                }
            }
        }

        Some(Self {
            kind: kind.trim().to_string(),
            subtype: subtype.trim().to_string(),
            quality: quality.clamp(0.0, 1.0),
        })
    }

    /// Specificity of the match against `media_type`, if it matches.
    fn specificity(&self, media_type: &str) -> Option<u8> {
        let (kind, subtype) = media_type.split_once('/')?;
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", "*") => Some(0),
            (k, "*") if k == kind => Some(1),
            (k, s) if k == kind && s == subtype => Some(2),
            _ => None,
        }
    }
}

/// Parsed `Accept` header.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptPreference {
    ranges: Vec<MediaRange>,
}

impl AcceptPreference {
    /// Parse an `Accept` header. A missing or empty header accepts anything.
    pub fn parse(header: Option<&str>) -> Self {
        let ranges: Vec<MediaRange> = header
            .unwrap_or_default()
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(MediaRange::parse)
            .collect();

        if ranges.is_empty() && header.map_or(true, |h| h.trim().is_empty()) {
            return Self::any();
        }
        Self { ranges }
    }

    /// Preference accepting every media type.
    pub fn any() -> Self {
        Self {
            ranges: vec![MediaRange {
                kind: "*".to_string(),
                subtype: "*".to_string(),
                quality: 1.0,
            }],
        }
    }

    /// Quality the client assigns to `format`; the most specific matching
    /// range wins, with the highest q among equally specific ranges.
    pub fn quality(&self, format: Format) -> f32 {
        let mut best: Option<(u8, f32)> = None;
        for media_type in format.media_types() {
            for range in &self.ranges {
                let Some(specificity) = range.specificity(media_type) else {
                    continue;
                };
                best = match best {
                    Some((s, q)) if s > specificity || (s == specificity && q >= range.quality) => {
                        Some((s, q))
                    }
                    _ => Some((specificity, range.quality)),
                };
            }
        }
        best.map_or(0.0, |(_, q)| q)
    }

    /// Most preferred acceptable format; JSON wins ties.
    pub fn preferred(&self) -> Option<Format> {
        let mut chosen: Option<(Format, f32)> = None;
        for format in Format::ALL {
            let quality = self.quality(format);
            if quality <= 0.0 {
                continue;
            }
            if chosen.map_or(true, |(_, q)| quality > q) {
                chosen = Some((format, quality));
            }
        }
        chosen.map(|(format, _)| format)
    }
}

/// Serialized body plus its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedResponse {
    pub format: Format,
    pub body: String,
}

impl NegotiatedResponse {
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

impl IntoResponse for NegotiatedResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(
                header::CONTENT_TYPE,
                HeaderValue::from_static(self.format.content_type()),
            )],
            self.body,
        )
            .into_response()
    }
}

/// Render `object` in the format preferred by `accept`.
///
/// Returns `Ok(None)` when the client accepts neither JSON nor XML.
pub fn negotiate<S>(accept: &AcceptPreference, object: &S) -> Result<Option<NegotiatedResponse>>
where
    S: Serializable + ?Sized,
{
    let Some(format) = accept.preferred() else {
        return Ok(None);
    };
    render(format, object).map(Some)
}

/// Render `object` in an already chosen `format`.
pub fn render<S>(format: Format, object: &S) -> Result<NegotiatedResponse>
where
    S: Serializable + ?Sized,
{
    let body = convert(object, format)?;
    Ok(NegotiatedResponse { format, body })
}

/// Serialize `object` natively if it can, else through its mapping form.
pub fn convert<S>(object: &S, format: Format) -> Result<String>
where
    S: Serializable + ?Sized,
{
    if let Some(native) = object.to_native(format) {
        return native.map_err(BindError::Model);
    }
    match object.to_mapping() {
        Some(mapping) => format.encode(&mapping),
        None => Err(BindError::Conversion { format }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Native;

    impl Serializable for Native {
        fn to_json(&self) -> Option<anyhow::Result<String>> {
            Some(Ok("native-json".to_string()))
        }

        fn to_mapping(&self) -> Option<Mapping> {
            let mut map = Mapping::new();
            map.insert("kind".to_string(), json!("mapping"));
            Some(map)
        }
    }

    struct Opaque;

    impl Serializable for Opaque {}

    fn prefer(header: &str) -> Option<Format> {
        AcceptPreference::parse(Some(header)).preferred()
    }

    #[test]
    fn test_missing_accept_prefers_json() {
        assert_eq!(AcceptPreference::parse(None).preferred(), Some(Format::Json));
        assert_eq!(prefer(""), Some(Format::Json));
    }

    #[test]
    fn test_wildcard_prefers_json() {
        assert_eq!(prefer("*/*"), Some(Format::Json));
        assert_eq!(prefer("application/*"), Some(Format::Json));
    }

    #[test]
    fn test_explicit_xml() {
        assert_eq!(prefer("application/xml"), Some(Format::Xml));
        assert_eq!(prefer("text/xml"), Some(Format::Xml));
    }

    #[test]
    fn test_quality_values_decide() {
        assert_eq!(
            prefer("application/json;q=0.5, application/xml"),
            Some(Format::Xml)
        );
        assert_eq!(
            prefer("application/xml;q=0.9, application/json;q=0.9"),
            Some(Format::Json)
        );
    }

    #[test]
    fn test_specific_range_overrides_wildcard() {
        assert_eq!(prefer("*/*, application/json;q=0"), Some(Format::Xml));
    }

    #[test]
    fn test_unsupported_accept() {
        assert_eq!(prefer("text/html"), None);
        assert_eq!(prefer("image/png, text/plain;q=0.5"), None);
    }

    #[test]
    fn test_malformed_entries_are_ignored() {
        assert_eq!(prefer("garbage, application/xml"), Some(Format::Xml));
        assert_eq!(prefer("application/json;q=abc, text/xml"), Some(Format::Xml));
    }

    #[test]
    fn test_non_finite_quality_is_malformed() {
        assert_eq!(
            prefer("application/json;q=NaN, application/xml;q=0.5"),
            Some(Format::Xml)
        );
        assert_eq!(prefer("application/json;q=inf, text/xml;q=0.1"), Some(Format::Xml));
        assert_eq!(prefer("application/json;q=NaN"), None);
    }

    #[test]
    fn test_xml_rejects_attribute_and_text_keys() {
        for key in ["@evil", "$text", "$value"] {
            let mut map = Mapping::new();
            map.insert(key.to_string(), json!("x"));
            map.insert("title".to_string(), json!("Hi"));

            let err = Format::Xml.encode(&map).unwrap_err();
            assert!(
                matches!(err, BindError::Encode { format: Format::Xml, .. }),
                "{key}"
            );
        }
    }

    #[test]
    fn test_xml_rejects_nested_attribute_keys() {
        let mut map = Mapping::new();
        map.insert("meta".to_string(), json!([{ "@id": "1" }]));

        assert!(Format::Xml.encode(&map).is_err());
        // JSON has no such restriction
        assert_eq!(Format::Json.encode(&map).unwrap(), r#"{"meta":[{"@id":"1"}]}"#);
    }

    #[test]
    fn test_convert_prefers_native() {
        assert_eq!(convert(&Native, Format::Json).unwrap(), "native-json");
    }

    #[test]
    fn test_convert_falls_back_to_mapping() {
        let body = convert(&Native, Format::Xml).unwrap();
        assert_eq!(body, "<hash><kind>mapping</kind></hash>");
    }

    #[test]
    fn test_convert_without_any_form_fails() {
        let err = convert(&Opaque, Format::Json).unwrap_err();
        assert!(matches!(
            err,
            BindError::Conversion {
                format: Format::Json
            }
        ));
    }

    #[test]
    fn test_negotiate_sets_content_type() {
        let accept = AcceptPreference::parse(Some("application/xml"));
        let response = negotiate(&accept, &Native).unwrap().unwrap();
        assert_eq!(response.content_type(), "application/xml");
        assert_eq!(response.format, Format::Xml);
    }

    #[test]
    fn test_negotiate_no_acceptable_format() {
        let accept = AcceptPreference::parse(Some("text/html"));
        assert!(negotiate(&accept, &Native).unwrap().is_none());
    }

    #[test]
    fn test_json_encode_mapping() {
        let mut map = Mapping::new();
        map.insert("result".to_string(), json!("success"));
        assert_eq!(
            Format::Json.encode(&map).unwrap(),
            r#"{"result":"success"}"#
        );
    }
}
