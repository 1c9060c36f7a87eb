// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 按 `Content-Type` 解析请求体。
//!
//! 解析失败不会报错，请求原样返回。GET 请求不解析。

use log::debug;
use quick_xml::{
    events::{attributes::Attributes, Event},
    Reader,
};
use serde_json::{Map, Value};

use crate::{
    param::{HttpMethod, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON},
    request::Request,
};

/// 请求体的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Json,
    Form,
    Xml,
    Multipart,
    Other,
}

impl BodyKind {
    /// 根据内容类型判断种类，忽略大小写与 `; charset=...` 之类的参数
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase();
        match mime.as_str() {
            CONTENT_TYPE_JSON => BodyKind::Json,
            CONTENT_TYPE_FORM => BodyKind::Form,
            "application/xml" | "text/xml" => BodyKind::Xml,
            "multipart/form-data" => BodyKind::Multipart,
            _ => BodyKind::Other,
        }
    }
}

pub struct ParsedBody;

impl ParsedBody {
    pub fn process(request: Request) -> Request {
        if request.method() == HttpMethod::Get || request.body().is_empty() {
            return request;
        }
        let kind = match request.content_type() {
            Some(content_type) => BodyKind::from_content_type(content_type),
            None => return request,
        };

        let parsed = match kind {
            BodyKind::Json => parse_json(request.body()),
            BodyKind::Form => Some(parse_form(request.body())),
            BodyKind::Xml => parse_xml(request.body()),
            BodyKind::Multipart | BodyKind::Other => {
                debug!("[ID{}]请求体类型{:?}不做解析", request.id(), kind);
                None
            }
        };

        match parsed {
            Some(value) => request.with_parsed_body(value),
            None => request,
        }
    }
}

fn parse_json(body: &[u8]) -> Option<Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) | Ok(value @ Value::Array(_)) => Some(value),
        Ok(_) => None,
        Err(e) => {
            debug!("JSON请求体解析失败：{}", e);
            None
        }
    }
}

fn parse_form(body: &[u8]) -> Value {
    let map: Map<String, Value> = url::form_urlencoded::parse(body)
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    Value::Object(map)
}

/// XML 元素属性在解析结果中的键名
const XML_ATTRIBUTES_KEY: &str = "@attributes";
/// 元素同时带有属性或子元素时，其文本内容的键名
const XML_TEXT_KEY: &str = "#text";

/// 解析过程中尚未闭合的元素
#[derive(Default)]
struct XmlElement {
    name: String,
    attributes: Map<String, Value>,
    children: Map<String, Value>,
    text: String,
}

impl XmlElement {
    fn open(name: &[u8], attributes: Attributes) -> Result<Self, String> {
        let mut element = XmlElement {
            name: String::from_utf8_lossy(name).into_owned(),
            ..Default::default()
        };
        for attr in attributes {
            let attr = attr.map_err(|e| e.to_string())?;
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            element.attributes.insert(
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                Value::String(value.into_owned()),
            );
        }
        Ok(element)
    }

    /// 只有文本的元素折叠为字符串，其余转为对象
    fn into_value(self) -> Value {
        if self.attributes.is_empty() && self.children.is_empty() {
            return Value::String(self.text);
        }
        Value::Object(self.into_object())
    }

    fn into_object(self) -> Map<String, Value> {
        let mut object = self.children;
        if !self.attributes.is_empty() {
            object.insert(XML_ATTRIBUTES_KEY.to_string(), Value::Object(self.attributes));
        }
        if !self.text.is_empty() {
            object.insert(XML_TEXT_KEY.to_string(), Value::String(self.text));
        }
        object
    }

    /// 同名子元素出现多次时合并为数组
    fn push_child(&mut self, name: String, value: Value) {
        match self.children.get_mut(&name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.children.insert(name, value);
            }
        }
    }
}

/// 根元素本身不出现在结果中，结果是根元素的子元素、属性与文本组成的对象
fn parse_xml(body: &[u8]) -> Option<Value> {
    match read_xml(body) {
        Ok(object) => Some(Value::Object(object)),
        Err(e) => {
            debug!("XML请求体解析失败：{}", e);
            None
        }
    }
}

fn read_xml(body: &[u8]) -> Result<Map<String, Value>, String> {
    let mut reader = Reader::from_reader(body);
    let mut stack: Vec<XmlElement> = Vec::new();

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => stack.push(XmlElement::open(e.name().as_ref(), e.attributes())?),
            Event::Empty(e) => {
                let element = XmlElement::open(e.name().as_ref(), e.attributes())?;
                match stack.last_mut() {
                    Some(parent) => {
                        let name = element.name.clone();
                        parent.push_child(name, element.into_value());
                    }
                    None => return Ok(element.into_object()),
                }
            }
            Event::End(_) => {
                let element = stack.pop().ok_or("unexpected closing tag")?;
                match stack.last_mut() {
                    Some(parent) => {
                        let name = element.name.clone();
                        parent.push_child(name, element.into_value());
                    }
                    None => return Ok(element.into_object()),
                }
            }
            Event::Text(e) => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                let text = text.trim();
                match stack.last_mut() {
                    Some(element) => element.text.push_str(text),
                    None if text.is_empty() => {}
                    None => return Err("text outside of root element".to_string()),
                }
            }
            Event::CData(e) => {
                if let Some(element) = stack.last_mut() {
                    element.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::Eof => return Err("missing root element".to_string()),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(content_type: &str, body: &'static str) -> Request {
        Request::new(HttpMethod::Post, "/submit")
            .with_header("Content-Type", content_type)
            .with_body(body)
    }

    #[test]
    fn test_body_kind() {
        assert_eq!(BodyKind::from_content_type("application/json"), BodyKind::Json);
        assert_eq!(
            BodyKind::from_content_type("Application/JSON; charset=utf-8"),
            BodyKind::Json
        );
        assert_eq!(
            BodyKind::from_content_type("application/x-www-form-urlencoded"),
            BodyKind::Form
        );
        assert_eq!(BodyKind::from_content_type("text/xml"), BodyKind::Xml);
        assert_eq!(
            BodyKind::from_content_type("multipart/form-data; boundary=x"),
            BodyKind::Multipart
        );
        assert_eq!(BodyKind::from_content_type("text/plain"), BodyKind::Other);
    }

    #[test]
    fn test_json_object() {
        let request = ParsedBody::process(post("application/json", r#"{"name":"alice","age":3}"#));
        assert_eq!(request.parsed_body(), Some(&json!({"name": "alice", "age": 3})));
    }

    #[test]
    fn test_json_array() {
        let request = ParsedBody::process(post("application/json", "[1,2,3]"));
        assert_eq!(request.parsed_body(), Some(&json!([1, 2, 3])));
    }

    #[test]
    fn test_json_scalar_is_ignored() {
        let request = ParsedBody::process(post("application/json", "42"));
        assert!(request.parsed_body().is_none());
    }

    #[test]
    fn test_invalid_json_is_swallowed() {
        let original = post("application/json", "{not json");
        let request = ParsedBody::process(original.clone());
        assert_eq!(request, original);
    }

    #[test]
    fn test_form() {
        let request = ParsedBody::process(post(
            "application/x-www-form-urlencoded",
            "name=alice+smith&city=%E5%8C%97%E4%BA%AC",
        ));
        assert_eq!(
            request.parsed_body(),
            Some(&json!({"name": "alice smith", "city": "北京"}))
        );
    }

    #[test]
    fn test_get_is_not_parsed() {
        let request = Request::new(HttpMethod::Get, "/")
            .with_header("Content-Type", "application/json")
            .with_body("{\"a\":1}");
        assert!(ParsedBody::process(request).parsed_body().is_none());
    }

    #[test]
    fn test_xml() {
        let request = ParsedBody::process(post(
            "application/xml",
            "<user><name>ann</name><role>admin</role></user>",
        ));
        assert_eq!(
            request.parsed_body(),
            Some(&json!({"name": "ann", "role": "admin"}))
        );
    }

    #[test]
    fn test_xml_attributes_and_repeated_elements() {
        let request = ParsedBody::process(post(
            "text/xml; charset=utf-8",
            r#"<?xml version="1.0"?>
<order id="7">
    <item sku="a1">pen</item>
    <item>book</item>
    <note><![CDATA[fragile & light]]></note>
    <gift/>
</order>"#,
        ));
        assert_eq!(
            request.parsed_body(),
            Some(&json!({
                "@attributes": {"id": "7"},
                "item": [{"@attributes": {"sku": "a1"}, "#text": "pen"}, "book"],
                "note": "fragile & light",
                "gift": ""
            }))
        );
    }

    #[test]
    fn test_malformed_xml_is_swallowed() {
        for body in ["<user><name>ann</user>", "<user><name>ann</name>", "not xml at all"] {
            let original = post("application/xml", body);
            let request = ParsedBody::process(original.clone());
            assert_eq!(request, original);
        }
    }

    #[test]
    fn test_multipart_is_left_alone() {
        let request = ParsedBody::process(post("multipart/form-data; boundary=x", "--x--"));
        assert!(request.parsed_body().is_none());
        assert_eq!(request.body().as_ref(), b"--x--");
    }
}
