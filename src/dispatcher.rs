// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 处理器与分发器
//!
//! `Handler` 是路由终点的统一抽象，普通闭包通过 `IntoHandlerResult` 自动适配：
//! 返回 `Response`、`Option<Response>` 或 `Result<_, E>` 均可。
//! `Dispatcher` 把一个处理器、种子响应与路由参数捆绑在一起，在中间件链的末端调用。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::{
    exception::Exception, middleware::RequestHandler, request::Request, response::Response,
};

/// 路由参数：参数名 -> 实际段文本
pub type Params = HashMap<String, String>;

/// 处理器的返回值。`Ok(None)` 表示处理器没有给出响应，由种子响应代替。
pub type HandlerResult = Result<Option<Response>, Exception>;

pub trait Handler: Send + Sync {
    fn call(&self, request: Request, response: Response) -> HandlerResult;
}

/// 闭包返回值到 `HandlerResult` 的转换
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for Response {
    fn into_handler_result(self) -> HandlerResult {
        Ok(Some(self))
    }
}

impl IntoHandlerResult for Option<Response> {
    fn into_handler_result(self) -> HandlerResult {
        Ok(self)
    }
}

impl<E: fmt::Display> IntoHandlerResult for Result<Response, E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map(Some)
            .map_err(|e| Exception::InvalidHandlerResult(e.to_string()))
    }
}

impl<E: fmt::Display> IntoHandlerResult for Result<Option<Response>, E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(|e| Exception::InvalidHandlerResult(e.to_string()))
    }
}

impl<F, R> Handler for F
where
    F: Fn(Request, Response) -> R + Send + Sync,
    R: IntoHandlerResult,
{
    fn call(&self, request: Request, response: Response) -> HandlerResult {
        self(request, response).into_handler_result()
    }
}

/// 路由终点。清单中引用了未登记的处理器名时，路由仍会注册，但在分发时得到 500。
#[derive(Clone)]
pub enum Endpoint {
    Handler(Arc<dyn Handler>),
    Unresolved(String),
}

impl Endpoint {
    pub fn handler(handler: impl Handler + 'static) -> Self {
        Endpoint::Handler(Arc::new(handler))
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Endpoint::Handler(_))
    }
}

impl PartialEq for Endpoint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Endpoint::Handler(a), Endpoint::Handler(b)) => Arc::ptr_eq(a, b),
            (Endpoint::Unresolved(a), Endpoint::Unresolved(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Handler(_) => write!(f, "Endpoint::Handler(..)"),
            Endpoint::Unresolved(name) => write!(f, "Endpoint::Unresolved({})", name),
        }
    }
}

pub struct Dispatcher {
    handler: Arc<dyn Handler>,
    response: Response,
    params: Params,
}

impl Dispatcher {
    pub fn new(handler: Arc<dyn Handler>, response: Response, params: Params) -> Self {
        Self {
            handler,
            response,
            params,
        }
    }

    /// 调用处理器。
    ///
    /// 路由参数只补齐请求上尚不存在的属性，中间件已经写入的同名属性保持不变。
    /// 路由器在进入中间件之前已经绑定过一次参数，这里的补齐只在中间件换成了一个全新的请求时起作用。
    pub fn handle(&self, request: Request) -> HandlerResult {
        let mut request = request;
        for (name, value) in &self.params {
            if !request.has_attribute(name) {
                request = request.with_attribute(name, value);
            }
        }
        debug!("[ID{}]调用路由处理器：{}", request.id(), request.path());
        self.handler.call(request, self.response.clone())
    }

    pub fn response(&self) -> &Response {
        &self.response
    }

    pub fn params(&self) -> &Params {
        &self.params
    }
}

/// 中间件链的末端：处理器没有给出响应时退回种子响应
pub struct TerminalHandler {
    dispatcher: Dispatcher,
}

impl TerminalHandler {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }
}

impl RequestHandler for TerminalHandler {
    fn handle(&self, request: Request) -> Result<Response, Exception> {
        match self.dispatcher.handle(request)? {
            Some(response) => Ok(response),
            None => Ok(self.dispatcher.response().clone()),
        }
    }
}
