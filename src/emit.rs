// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 响应发送模块
//!
//! 把最终的 `Response` 序列化为 HTTP/1.1 报文（状态行、响应头、响应体），写入任意输出流。
//! `Content-Length`、`Date` 与 `Server` 由发送器统一生成，处理器设置的同名头会被忽略。
//!
//! `StreamEmitter` 按固定大小分块写出响应体，并遵循 `Content-Range` 只写出指定的字节区间。

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use log::{debug, warn};
use regex::Regex;

use crate::{
    param::{CRLF, SERVER_NAME},
    response::Response,
};

/// 发送器自行生成的响应头
const MANAGED_HEADERS: [&str; 3] = ["Content-Length", "Date", "Server"];

/// 分块发送时每块的默认字节数
pub const DEFAULT_BUFFER_LENGTH: usize = 8192;

lazy_static! {
    static ref CONTENT_RANGE: Option<Regex> =
        Regex::new(r"(?P<unit>\w+)\s+(?P<first>\d+)-(?P<last>\d+)/(?P<length>\d+|\*)").ok();
}

#[derive(Debug, Clone)]
pub struct Emitter {
    server_name: String,
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Emitter {
    pub fn new() -> Self {
        Self {
            server_name: SERVER_NAME.to_string(),
        }
    }

    pub fn with_server_name(mut self, name: &str) -> Self {
        self.server_name = name.to_string();
        self
    }

    /// 将响应写入输出流
    pub fn emit<W: Write>(&self, response: &Response, out: &mut W) -> io::Result<()> {
        let bytes = self.to_bytes(response);
        out.write_all(&bytes)?;
        out.flush()?;
        debug!("响应发送完毕，状态码：{}，长度：{}", response.status_code(), bytes.len());
        Ok(())
    }

    /// 将响应写入进程标准输出
    pub fn emit_stdout(&self, response: &Response) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.emit(response, &mut lock)
    }

    pub fn to_bytes(&self, response: &Response) -> Vec<u8> {
        self.to_bytes_at(response, &Utc::now())
    }

    fn to_bytes_at(&self, response: &Response, date: &DateTime<Utc>) -> Vec<u8> {
        let header = self.head_at(response, response.content_length(), date);
        [header.as_bytes(), response.body()].concat()
    }

    /// 状态行与响应头，`content_length` 为随后实际写出的响应体长度
    fn head_at(&self, response: &Response, content_length: usize, date: &DateTime<Utc>) -> String {
        let mut header = String::new();
        header.push_str(&response.version().to_string());
        header.push(' ');
        header.push_str(&response.status_code().to_string());
        if !response.information().is_empty() {
            header.push(' ');
            header.push_str(response.information());
        }
        header.push_str(CRLF);

        for (name, value) in response.headers() {
            if MANAGED_HEADERS.iter().any(|m| m.eq_ignore_ascii_case(name)) {
                continue;
            }
            header.push_str(&[filter_header(name).as_str(), ": ", value.as_str(), CRLF].concat());
        }
        header.push_str(&["Content-Length: ", content_length.to_string().as_str(), CRLF].concat());
        header.push_str(&["Date: ", format_date(date).as_str(), CRLF].concat());
        header.push_str(&["Server: ", self.server_name.as_str(), CRLF].concat());
        header.push_str(CRLF);
        header
    }
}

/// `Content-Range: <unit> <first>-<last>/<length>`，`length` 为 `*` 时记为 `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRange {
    pub unit: String,
    pub first: usize,
    pub last: usize,
    pub length: Option<usize>,
}

impl ContentRange {
    /// 格式不符时返回 `None`
    pub fn parse(header: &str) -> Option<Self> {
        let captures = CONTENT_RANGE.as_ref()?.captures(header)?;
        let length: Option<usize> = match &captures["length"] {
            "*" => None,
            length => Some(length.parse().ok()?),
        };
        Some(ContentRange {
            unit: captures["unit"].to_string(),
            first: captures["first"].parse().ok()?,
            last: captures["last"].parse().ok()?,
            length,
        })
    }

    pub fn is_bytes(&self) -> bool {
        self.unit == "bytes"
    }

    /// 区间按响应体长度截断；起点越界或起点大于终点时为空
    pub fn slice<'a>(&self, body: &'a [u8]) -> &'a [u8] {
        if self.first > self.last || self.first >= body.len() {
            return &[];
        }
        let last = self.last.min(body.len() - 1);
        &body[self.first..=last]
    }
}

/// 分块发送响应体的发送器
#[derive(Debug, Clone)]
pub struct StreamEmitter {
    emitter: Emitter,
    max_buffer_length: usize,
}

impl Default for StreamEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamEmitter {
    pub fn new() -> Self {
        Self {
            emitter: Emitter::new(),
            max_buffer_length: DEFAULT_BUFFER_LENGTH,
        }
    }

    /// 设置每块的字节数，0 按 1 处理
    pub fn with_buffer_length(mut self, length: usize) -> Self {
        self.max_buffer_length = length.max(1);
        self
    }

    pub fn with_server_name(mut self, name: &str) -> Self {
        self.emitter = self.emitter.with_server_name(name);
        self
    }

    pub fn max_buffer_length(&self) -> usize {
        self.max_buffer_length
    }

    /// 实际要写出的响应体：带有合法的 `bytes` 区间时只取该区间，否则为完整响应体
    pub fn body_range<'a>(&self, response: &'a Response) -> &'a [u8] {
        let header = match response.header("Content-Range") {
            Some(header) => header,
            None => return response.body(),
        };
        match ContentRange::parse(header) {
            Some(range) if range.is_bytes() => {
                let body = range.slice(response.body());
                if body.len() < range.last.saturating_sub(range.first).saturating_add(1) {
                    warn!(
                        "Content-Range {} 超出响应体长度 {}，已截断",
                        header,
                        response.content_length()
                    );
                }
                body
            }
            _ => response.body(),
        }
    }

    /// 先写出状态行与响应头，再把响应体按块写出
    pub fn emit<W: Write>(&self, response: &Response, out: &mut W) -> io::Result<()> {
        let body = self.body_range(response);
        let header = self.emitter.head_at(response, body.len(), &Utc::now());
        out.write_all(header.as_bytes())?;
        for chunk in body.chunks(self.max_buffer_length) {
            out.write_all(chunk)?;
        }
        out.flush()?;
        debug!(
            "响应分块发送完毕，状态码：{}，响应体长度：{}，块大小：{}",
            response.status_code(),
            body.len(),
            self.max_buffer_length
        );
        Ok(())
    }

    pub fn to_bytes(&self, response: &Response) -> Vec<u8> {
        let body = self.body_range(response);
        let header = self.emitter.head_at(response, body.len(), &Utc::now());
        [header.as_bytes(), body].concat()
    }
}

/// 将响应头名称规范化为单词首字母大写形式，例如 `content-type` -> `Content-Type`
pub fn filter_header(name: &str) -> String {
    name.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join("-")
}

fn format_date(date: &DateTime<Utc>) -> String {
    date.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_date() {
        let date = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(format_date(&date), "Fri, 02 Jan 2026 03:04:05 GMT");
    }

    #[test]
    fn test_filter_header() {
        assert_eq!(filter_header("content-type"), "Content-Type");
        assert_eq!(filter_header("x-custom-init"), "X-Custom-Init");
        assert_eq!(filter_header("Set-Cookie"), "Set-Cookie");
    }

    #[test]
    fn test_to_bytes_layout() {
        let response = Response::new()
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body("{}");
        let bytes = Emitter::new().to_bytes(&response);
        let text = String::from_utf8(bytes).unwrap();

        assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.contains("Server: wrouter\r\n"));
        assert!(text.ends_with("\r\n\r\n{}"));
    }

    #[test]
    fn test_managed_headers_are_not_duplicated() {
        let response = Response::new()
            .with_header("Content-Length", "999")
            .with_body("emit-body");
        let text = String::from_utf8(Emitter::new().to_bytes(&response)).unwrap();

        assert_eq!(text.matches("Content-Length").count(), 1);
        assert!(text.contains("Content-Length: 9\r\n"));
    }

    /// 记录每次 `write` 调用的长度
    #[derive(Default)]
    struct ChunkRecorder {
        data: Vec<u8>,
        writes: Vec<usize>,
    }

    impl Write for ChunkRecorder {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            self.writes.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn body_of(bytes: &[u8]) -> String {
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        text.split("\r\n\r\n").nth(1).unwrap().to_string()
    }

    #[test]
    fn test_parse_content_range() {
        assert_eq!(
            ContentRange::parse("bytes 2-4/10"),
            Some(ContentRange {
                unit: "bytes".to_string(),
                first: 2,
                last: 4,
                length: Some(10),
            })
        );
        assert_eq!(ContentRange::parse("bytes 0-9/*").unwrap().length, None);
        assert!(ContentRange::parse("bytes 4-/10").is_none());
        assert!(ContentRange::parse("garbage").is_none());
    }

    #[test]
    fn test_stream_emitter_writes_range() {
        let response = Response::new()
            .with_status(206)
            .with_header("Content-Range", "bytes 2-4/10")
            .with_body("0123456789");
        let bytes = StreamEmitter::new().to_bytes(&response);

        assert_eq!(body_of(&bytes), "234");
        assert!(String::from_utf8(bytes).unwrap().contains("Content-Length: 3\r\n"));
    }

    #[test]
    fn test_stream_emitter_out_of_bounds_range() {
        let emitter = StreamEmitter::new();

        let past_end = Response::new()
            .with_header("Content-Range", "bytes 7-500/10")
            .with_body("0123456789");
        assert_eq!(body_of(&emitter.to_bytes(&past_end)), "789");

        let start_past_end = Response::new()
            .with_header("Content-Range", "bytes 20-30/40")
            .with_body("0123456789");
        let bytes = emitter.to_bytes(&start_past_end);
        assert_eq!(body_of(&bytes), "");
        assert!(String::from_utf8(bytes).unwrap().contains("Content-Length: 0\r\n"));

        let reversed = Response::new()
            .with_header("Content-Range", "bytes 5-2/10")
            .with_body("0123456789");
        assert_eq!(body_of(&emitter.to_bytes(&reversed)), "");
    }

    #[test]
    fn test_stream_emitter_ignores_other_units() {
        let response = Response::new()
            .with_header("Content-Range", "items 2-4/10")
            .with_body("0123456789");
        assert_eq!(body_of(&StreamEmitter::new().to_bytes(&response)), "0123456789");

        let malformed = Response::new()
            .with_header("Content-Range", "bytes two-four/10")
            .with_body("0123456789");
        assert_eq!(body_of(&StreamEmitter::new().to_bytes(&malformed)), "0123456789");
    }

    #[test]
    fn test_stream_emitter_chunks_body() {
        let response = Response::new().with_body("0123456789");
        let mut out = ChunkRecorder::default();

        let emitter = StreamEmitter::new().with_buffer_length(4);
        assert_eq!(emitter.max_buffer_length(), 4);
        emitter.emit(&response, &mut out).unwrap();

        // 第一次写出的是响应头
        assert_eq!(&out.writes[1..], &[4, 4, 2]);
        assert_eq!(body_of(&out.data), "0123456789");
    }

    #[test]
    fn test_stream_emitter_chunks_range() {
        let response = Response::new()
            .with_status(206)
            .with_header("Content-Range", "bytes 1-8/10")
            .with_body("0123456789");
        let mut out = ChunkRecorder::default();

        StreamEmitter::new()
            .with_buffer_length(3)
            .emit(&response, &mut out)
            .unwrap();

        assert_eq!(&out.writes[1..], &[3, 3, 2]);
        assert_eq!(body_of(&out.data), "12345678");
    }

    #[test]
    fn test_emit_writes_to_stream() {
        let response = Response::new()
            .with_header("Content-Type", "text/plain")
            .with_body("emit-body");
        let mut out: Vec<u8> = Vec::new();

        Emitter::new()
            .with_server_name("test-server")
            .emit(&response, &mut out)
            .unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Server: test-server\r\n"));
        assert!(text.ends_with("emit-body"));
    }
}
