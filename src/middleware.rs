// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 中间件链
//!
//! 中间件按洋葱模型执行：第一个注册的中间件在最外层，它拿到请求后可以
//! 1. 修改请求再调用 `next`；
//! 2. 调用 `next` 后修改返回的响应；
//! 3. 不调用 `next`，直接返回自己的响应（短路）。
//!
//! 链由 `build_chain` 从内向外折叠而成，末端是包装了 `Dispatcher` 的 `TerminalHandler`。

use std::sync::Arc;
use std::time::Instant;

use log::info;

use crate::{exception::Exception, request::Request, response::Response};

/// 链上的"下一环"
pub trait RequestHandler {
    fn handle(&self, request: Request) -> Result<Response, Exception>;
}

impl<F> RequestHandler for F
where
    F: Fn(Request) -> Result<Response, Exception>,
{
    fn handle(&self, request: Request) -> Result<Response, Exception> {
        self(request)
    }
}

pub trait Middleware: Send + Sync {
    fn process(&self, request: Request, next: &dyn RequestHandler) -> Result<Response, Exception>;
}

impl<F> Middleware for F
where
    F: Fn(Request, &dyn RequestHandler) -> Result<Response, Exception> + Send + Sync,
{
    fn process(&self, request: Request, next: &dyn RequestHandler) -> Result<Response, Exception> {
        self(request, next)
    }
}

/// 链中的一环：持有一个中间件和它的下一环
pub struct MiddlewareDispatcher<'a> {
    middleware: Arc<dyn Middleware>,
    next: Box<dyn RequestHandler + 'a>,
}

impl<'a> MiddlewareDispatcher<'a> {
    pub fn new(middleware: Arc<dyn Middleware>, next: Box<dyn RequestHandler + 'a>) -> Self {
        Self { middleware, next }
    }
}

impl RequestHandler for MiddlewareDispatcher<'_> {
    fn handle(&self, request: Request) -> Result<Response, Exception> {
        self.middleware.process(request, self.next.as_ref())
    }
}

/// 从末端开始逆序包装，使第一个中间件成为最外层
pub fn build_chain<'a>(
    middlewares: &[Arc<dyn Middleware>],
    terminal: Box<dyn RequestHandler + 'a>,
) -> Box<dyn RequestHandler + 'a> {
    middlewares.iter().rev().fold(terminal, |next, middleware| {
        Box::new(MiddlewareDispatcher::new(Arc::clone(middleware), next))
    })
}

/// 记录每个请求的方法、路径、状态码与耗时
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestLogger;

impl Middleware for RequestLogger {
    fn process(&self, request: Request, next: &dyn RequestHandler) -> Result<Response, Exception> {
        let start_time = Instant::now();
        let id = request.id();
        let method = request.method();
        let path = request.path().to_string();

        let response = next.handle(request)?;
        info!(
            "[ID{}] {}, {}, {}, {}, {}ms",
            id,
            method,
            path,
            response.status_code(),
            response.information(),
            start_time.elapsed().as_millis()
        );
        Ok(response)
    }
}

/// 为响应补上缺失的默认响应头，处理器已设置的同名头不会被覆盖
#[derive(Debug, Clone, Default)]
pub struct DefaultHeaders {
    headers: Vec<(String, String)>,
}

impl DefaultHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

impl Middleware for DefaultHeaders {
    fn process(&self, request: Request, next: &dyn RequestHandler) -> Result<Response, Exception> {
        let mut response = next.handle(request)?;
        for (name, value) in &self.headers {
            if !response.has_header(name) {
                response.set_header(name, value);
            }
        }
        Ok(response)
    }
}
