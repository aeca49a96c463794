//! Minimal XML-RPC codec
//!
//! Only what the report call needs: encoding a `methodCall` with scalar
//! and struct parameters, and telling a successful `methodResponse`
//! from a `fault`.

use chrono::NaiveDateTime;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Write;

/// An XML-RPC value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Int(i32),
    String(String),
    DateTime(NaiveDateTime),
    Struct(BTreeMap<String, Value>),
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&BTreeMap<String, String>> for Value {
    fn from(map: &BTreeMap<String, String>) -> Self {
        Value::Struct(
            map.iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

/// A `<fault>` returned by the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    pub code: i32,
    pub message: String,
}

/// Why a response body could not be accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseError {
    Fault(Fault),
    Malformed,
}

/// Encode a complete `methodCall` document
pub fn encode_method_call(method: &str, params: &[Value]) -> String {
    let mut out = String::from("<?xml version=\"1.0\"?>\n<methodCall>");
    let _ = write!(out, "<methodName>{}</methodName><params>", escape(method));
    for param in params {
        out.push_str("<param>");
        write_value(&mut out, param);
        out.push_str("</param>");
    }
    out.push_str("</params></methodCall>\n");
    out
}

fn write_value(out: &mut String, value: &Value) {
    out.push_str("<value>");
    match value {
        Value::Boolean(b) => {
            let _ = write!(out, "<boolean>{}</boolean>", u8::from(*b));
        }
        Value::Int(i) => {
            let _ = write!(out, "<int>{}</int>", i);
        }
        Value::String(s) => {
            let _ = write!(out, "<string>{}</string>", escape(s));
        }
        Value::DateTime(dt) => {
            let _ = write!(
                out,
                "<dateTime.iso8601>{}</dateTime.iso8601>",
                dt.format("%Y%m%dT%H:%M:%S")
            );
        }
        Value::Struct(members) => {
            out.push_str("<struct>");
            for (name, member) in members {
                let _ = write!(out, "<member><name>{}</name>", escape(name));
                write_value(out, member);
                out.push_str("</member>");
            }
            out.push_str("</struct>");
        }
    }
    out.push_str("</value>");
}

/// Escape markup characters and drop characters XML 1.0 cannot carry
pub fn escape(text: &str) -> Cow<'_, str> {
    let needs_work = text
        .chars()
        .any(|c| matches!(c, '&' | '<' | '>') || !is_xml_char(c));
    if !needs_work {
        return Cow::Borrowed(text);
    }

    let mut escaped = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            c if is_xml_char(c) => escaped.push(c),
            _ => {}
        }
    }
    Cow::Owned(escaped)
}

/// XML 1.0 `Char`; surrogates cannot occur in a `char`
fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= '\u{20}' && !matches!(c, '\u{FFFE}' | '\u{FFFF}'))
}

/// Accept a `methodResponse` carrying params, reject faults and garbage
pub fn check_response(body: &str) -> Result<(), ResponseError> {
    if !body.contains("<methodResponse") {
        return Err(ResponseError::Malformed);
    }

    if body.contains("<fault>") {
        let code = member_text(body, "faultCode")
            .and_then(|text| text.trim().parse().ok())
            .unwrap_or(0);
        let message = member_text(body, "faultString")
            .map(unescape)
            .unwrap_or_default();
        return Err(ResponseError::Fault(Fault { code, message }));
    }

    if body.contains("<params>") {
        Ok(())
    } else {
        Err(ResponseError::Malformed)
    }
}

/// Text inside the value of struct member `name`, without its type tag
fn member_text<'a>(body: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("<name>{}</name>", name);
    let after_name = &body[body.find(&marker)? + marker.len()..];
    let value_start = after_name.find("<value>")? + "<value>".len();
    let value_end = after_name[value_start..].find("</value>")? + value_start;
    let inner = after_name[value_start..value_end].trim();

    // <int>4</int> / <string>text</string> / bare text
    if let Some(rest) = inner.strip_prefix('<') {
        let tag_end = rest.find('>')?;
        let content = &rest[tag_end + 1..];
        let close = content.rfind("</")?;
        Some(&content[..close])
    } else {
        Some(inner)
    }
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
