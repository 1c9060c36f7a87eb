// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # Exception 模块
//!
//! 该模块定义了路由器在注册、分发以及外围协作（请求解析、配置加载、路由清单）中可能出现的异常情况。
//!
//! ## 设计意图
//! - **错误分类**：注册期错误（不支持的方法、未知中间件）立即返回给调用方；
//!   分发期的"未找到路由"等情况由路由器就地转换为 HTTP 响应，不会出现在这里。
//! - **硬失败**：处理器返回非法结果属于编程错误，以 `InvalidHandlerResult` 原样抛给调用方。

use std::error::Error;
use std::fmt;

/// 路由器处理过程中发生的异常类型。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exception {
    /// 客户端发送的请求字节流无法解析为合法的 UTF-8 字符串。
    RequestIsNotUtf8,
    /// 请求行格式错误，例如缺少方法、路径或协议版本。
    MalformedRequest,
    /// 使用了不在受支持列表中的 HTTP 方法。注册路由时立即返回。
    UnsupportedHttpMethod(String),
    /// 客户端使用了服务器不支持的 HTTP 协议版本。
    UnsupportedHttpVersion,
    /// 处理器没有返回合法的响应。属于调用方的编程错误，不会被吞掉。
    InvalidHandlerResult(String),
    /// 路由清单引用了未在注册表中登记的中间件。
    UnknownMiddleware(String),
    /// 配置文件无法打开或读取。
    ConfigUnreadable(String),
    /// 配置内容不合法。
    ConfigInvalid(String),
    /// 路由清单无法解析。
    ManifestInvalid(String),
}

use Exception::*;

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestIsNotUtf8 => write!(f, "Request bytes can't be parsed in UTF-8"),
            MalformedRequest => write!(f, "Malformed request line"),
            UnsupportedHttpMethod(m) => write!(f, "HTTP method not supported: {}", m),
            UnsupportedHttpVersion => write!(f, "Unsupported HTTP version"),
            InvalidHandlerResult(msg) => {
                write!(f, "Handler did not return a valid response: {}", msg)
            }
            UnknownMiddleware(name) => write!(f, "Unknown middleware: {}", name),
            ConfigUnreadable(msg) => write!(f, "Config file unreadable: {}", msg),
            ConfigInvalid(msg) => write!(f, "Invalid config: {}", msg),
            ManifestInvalid(msg) => write!(f, "Invalid route manifest: {}", msg),
        }
    }
}

impl Error for Exception {}
