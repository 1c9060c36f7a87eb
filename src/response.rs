// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 响应模块
//!
//! `Response` 是路由器传递给处理器与中间件的响应对象。状态码与响应头采用值语义更新
//! （`with_status`、`with_header` 消费自身并返回新响应），响应体则是可追加写入的缓冲区。

use bytes::{BufMut, BytesMut};
use log::warn;

use crate::param::{reason_phrase, HttpVersion};

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    version: HttpVersion,
    status_code: u16,
    information: String,
    headers: Vec<(String, String)>,
    body: BytesMut,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    /// 构造 `200 OK` 的空响应
    pub fn new() -> Self {
        Self {
            version: HttpVersion::V1_1,
            status_code: 200,
            information: "OK".to_string(),
            headers: Vec::new(),
            body: BytesMut::new(),
        }
    }

    pub fn with_status(mut self, code: u16) -> Self {
        self.set_code(code);
        self
    }

    /// 设置响应头；同名响应头（大小写不敏感）会被替换
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// 追加写入响应体后返回自身，便于链式构造
    pub fn with_body(mut self, content: &str) -> Self {
        self.write(content);
        self
    }

    fn set_code(&mut self, code: u16) -> &mut Self {
        self.status_code = code;
        self.information = reason_phrase(code).to_string();
        if self.information.is_empty() {
            warn!("非标准的状态码：{}，原因短语留空", code);
        }
        self
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// 向响应体追加写入文本
    pub fn write(&mut self, content: &str) -> &mut Self {
        self.write_bytes(content.as_bytes())
    }

    pub fn write_bytes(&mut self, content: &[u8]) -> &mut Self {
        self.body.put_slice(content);
        self
    }
}

impl Response {
    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    /// 状态码对应的原因短语
    pub fn information(&self) -> &str {
        &self.information
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// 以 UTF-8（有损）解码的响应体
    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
