// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # HTTP 请求模块
//!
//! `Request` 是一个值语义的请求对象：所有 `with_*` 方法都消费自身并返回新的请求，
//! 中间件可以据此"修改"请求后再交给下一环。它涵盖了：
//! 1. 请求行（Request-Line）的解析（方法、路径、查询字符串、版本）。
//! 2. 请求头（大小写不敏感查询）与请求体。
//! 3. 请求级属性（路由参数绑定在这里）。
//! 4. 由 `ParsedBody` 协作者填充的结构化请求体。

use std::collections::HashMap;

use bytes::Bytes;
use log::error;
use serde_json::Value;

use crate::{
    exception::Exception,
    param::{HttpMethod, HttpVersion, CRLF},
    util::split_query,
};

/// 表示一个完整的 HTTP 请求。
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// 全局请求 ID，用于在多线程环境下追踪日志
    id: u128,
    /// HTTP 请求方法
    method: HttpMethod,
    /// 请求路径（不含查询字符串）
    path: String,
    /// 原始查询字符串
    query: Option<String>,
    /// HTTP 协议版本
    version: HttpVersion,
    /// 请求头，保持到达顺序
    headers: Vec<(String, String)>,
    /// 原始请求体
    body: Bytes,
    /// 请求级属性，路由参数以属性形式绑定
    attributes: HashMap<String, String>,
    /// 结构化请求体（JSON 或表单解析结果）
    parsed_body: Option<Value>,
}

impl Default for Request {
    fn default() -> Self {
        Self::new(HttpMethod::Get, "/")
    }
}

impl Request {
    /// 以方法和请求目标构造请求，目标中的查询字符串会被拆分出来。
    pub fn new(method: HttpMethod, target: &str) -> Self {
        let (path, query) = split_query(target);
        Self {
            id: 0,
            method,
            path: path.to_string(),
            query: query.map(|q| q.to_string()),
            version: HttpVersion::V1_1,
            headers: Vec::new(),
            body: Bytes::new(),
            attributes: HashMap::new(),
            parsed_body: None,
        }
    }

    /// 从原始字节缓冲区尝试构建 `Request` 实例。
    ///
    /// # 逻辑步骤
    /// 1. 以空行切分请求头与请求体，请求头必须是合法的 UTF-8。
    /// 2. 解析请求行：提取方法、目标和协议版本。
    /// 3. 逐行解析请求头。
    /// 4. 按 `Content-Length` 截取请求体（缺失时取剩余全部字节）。
    pub fn try_from(buffer: &[u8], id: u128) -> Result<Self, Exception> {
        let separator = b"\r\n\r\n";
        let (head, rest) = match buffer.windows(separator.len()).position(|w| w == separator) {
            Some(pos) => (&buffer[..pos], &buffer[pos + separator.len()..]),
            None => (buffer, &buffer[buffer.len()..]),
        };

        let head = match std::str::from_utf8(head) {
            Ok(s) => s,
            Err(_) => {
                error!("[ID{}]无法解析HTTP请求", id);
                return Err(Exception::RequestIsNotUtf8);
            }
        };

        let mut lines = head.split(CRLF);
        let request_line = lines.next().unwrap_or("");
        let parts: Vec<&str> = request_line.split_whitespace().collect();
        if parts.len() != 3 {
            error!("[ID{}]HTTP请求行格式不正确：{}", id, request_line);
            return Err(Exception::MalformedRequest);
        }

        let method: HttpMethod = match parts[0].parse() {
            Ok(m) => m,
            Err(e) => {
                error!("[ID{}]不支持的HTTP请求方法：{}", id, parts[0]);
                return Err(e);
            }
        };

        let version = match parts[2].to_uppercase().as_str() {
            "HTTP/1.1" => HttpVersion::V1_1,
            "HTTP/1.0" => HttpVersion::V1_0,
            other => {
                error!("[ID{}]不支持的HTTP协议版本：{}", id, other);
                return Err(Exception::UnsupportedHttpVersion);
            }
        };

        let mut request = Self::new(method, parts[1]);
        request.id = id;
        request.version = version;

        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                request
                    .headers
                    .push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        let body_len = request
            .header("Content-Length")
            .and_then(|v| v.parse::<usize>().ok())
            .map_or(rest.len(), |len| len.min(rest.len()));
        request.body = Bytes::copy_from_slice(&rest[..body_len]);

        Ok(request)
    }
}

// --- 值语义更新 ---

impl Request {
    pub fn with_id(mut self, id: u128) -> Self {
        self.id = id;
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    /// 追加请求头；同名请求头会被替换
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// 设置请求级属性，已存在的同名属性会被覆盖
    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_parsed_body(mut self, parsed: Value) -> Self {
        self.parsed_body = Some(parsed);
        self
    }
}

// --- Getter 访问器实现 ---

impl Request {
    pub fn id(&self) -> u128 {
        self.id
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// 获取请求路径（不含查询参数）
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// 按名称查找请求头（大小写不敏感）
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn user_agent(&self) -> &str {
        self.header("User-Agent").unwrap_or("")
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|v| v.as_str())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    pub fn attributes(&self) -> &HashMap<String, String> {
        &self.attributes
    }

    pub fn parsed_body(&self) -> Option<&Value> {
        self.parsed_body.as_ref()
    }
}
