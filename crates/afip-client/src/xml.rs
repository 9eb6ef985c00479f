//! # XML ⇄ Value Bridge
//!
//! Minimal decoding of the XML documents the AFIP endpoints speak (login
//! ticket responses, SOAP response bodies) into `serde_json::Value` trees,
//! and element rendering for the request direction. Namespace prefixes are
//! stripped on decode; repeated sibling elements collapse into arrays.

use afip_core::AfipError;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

/// Decode an XML document into a one-entry object `{root_name: content}`.
///
/// Leaf elements become strings, nested elements become objects, repeated
/// sibling names become arrays. Attributes are dropped — none of the AFIP
/// payloads carry data in attributes.
pub fn xml_to_value(xml: &str) -> Result<Value, AfipError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                let content = parse_children(&mut reader)?;
                let mut root = Map::new();
                root.insert(name, content);
                return Ok(Value::Object(root));
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref());
                let mut root = Map::new();
                root.insert(name, Value::String(String::new()));
                return Ok(Value::Object(root));
            }
            Event::Eof => {
                return Err(malformed_reason("document has no root element"));
            }
            // XML declaration, comments, processing instructions.
            _ => {}
        }
    }
}

fn parse_children(reader: &mut Reader<&[u8]>) -> Result<Value, AfipError> {
    let mut children = Map::new();
    let mut text = String::new();

    loop {
        match reader.read_event().map_err(malformed)? {
            Event::Start(e) => {
                let name = local_name(e.name().as_ref());
                let value = parse_children(reader)?;
                insert_child(&mut children, name, value);
            }
            Event::Empty(e) => {
                let name = local_name(e.name().as_ref());
                insert_child(&mut children, name, Value::String(String::new()));
            }
            Event::Text(t) => {
                text.push_str(&t.unescape().map_err(malformed)?);
            }
            Event::CData(t) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(malformed_reason("unexpected end of document"));
            }
            _ => {}
        }
    }

    if children.is_empty() {
        Ok(Value::String(text.trim().to_string()))
    } else {
        Ok(Value::Object(children))
    }
}

/// Repeated sibling names become arrays, in document order.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name, value);
        }
    }
}

fn local_name(raw: &[u8]) -> String {
    let name = String::from_utf8_lossy(raw);
    match name.rsplit(':').next() {
        Some(local) => local.to_string(),
        None => name.into_owned(),
    }
}

/// Render a `Value` tree as nested XML elements (the request direction).
///
/// Objects become child elements, arrays repeat the element name, leaves
/// are escaped text.
pub fn value_to_xml(name: &str, value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            for item in items {
                value_to_xml(name, item, out);
            }
        }
        Value::Object(fields) => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            for (child, v) in fields {
                value_to_xml(child, v, out);
            }
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
        Value::Null => {
            out.push('<');
            out.push_str(name);
            out.push_str("/>");
        }
        leaf => {
            out.push('<');
            out.push_str(name);
            out.push('>');
            let text = match leaf {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            out.push_str(&quick_xml::escape::escape(&text));
            out.push_str("</");
            out.push_str(name);
            out.push('>');
        }
    }
}

fn malformed(e: quick_xml::Error) -> AfipError {
    malformed_reason(&e.to_string())
}

fn malformed_reason(reason: &str) -> AfipError {
    AfipError::WebService {
        context: "xml".into(),
        reason: format!("malformed XML: {reason}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_nested_elements() {
        let xml = r#"<?xml version="1.0"?>
            <loginTicketResponse version="1.0">
              <header>
                <source>CN=wsaa</source>
                <expirationTime>2024-05-01T12:00:00-03:00</expirationTime>
              </header>
              <credentials>
                <token>abc</token>
                <sign>def</sign>
              </credentials>
            </loginTicketResponse>"#;
        let value = xml_to_value(xml).expect("decode");
        assert_eq!(value["loginTicketResponse"]["credentials"]["token"], "abc");
        assert_eq!(
            value["loginTicketResponse"]["header"]["expirationTime"],
            "2024-05-01T12:00:00-03:00"
        );
    }

    #[test]
    fn strips_namespace_prefixes() {
        let xml = r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">
            <soapenv:Body><ns1:reply xmlns:ns1="urn:x"><code>7</code></ns1:reply></soapenv:Body>
            </soapenv:Envelope>"#;
        let value = xml_to_value(xml).expect("decode");
        assert_eq!(value["Envelope"]["Body"]["reply"]["code"], "7");
    }

    #[test]
    fn repeated_siblings_become_arrays() {
        let xml = "<list><item>1</item><item>2</item><item>3</item></list>";
        let value = xml_to_value(xml).expect("decode");
        assert_eq!(value["list"]["item"], json!(["1", "2", "3"]));
    }

    #[test]
    fn unterminated_document_is_rejected() {
        let err = xml_to_value("<open><unclosed>").expect_err("must fail");
        assert!(matches!(err, AfipError::WebService { .. }));
    }

    #[test]
    fn renders_value_trees_with_escaping() {
        let mut out = String::new();
        value_to_xml(
            "Auth",
            &json!({"Token": "a<b", "Cuit": "20294192345"}),
            &mut out,
        );
        assert_eq!(
            out,
            "<Auth><Cuit>20294192345</Cuit><Token>a&lt;b</Token></Auth>"
        );
    }
}
