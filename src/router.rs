// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由器
//!
//! `Router` 为每个 HTTP 方法维护一棵 `RouteTree`，负责：
//! - 路由注册（含分组前缀与分组中间件的继承）；
//! - 请求分发：查找路由、绑定路径参数、构建中间件链并调用处理器；
//! - 错误装饰：状态码不是 200 的响应会追加 `{"status":..,"message":..}` JSON 体。
//!
//! 注册需要 `&mut self`，分发只需要 `&self`，注册完成后可以用 `Arc<Router>` 在线程间共享。

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;

use log::{debug, error, warn};
use serde_derive::Serialize;

use crate::{
    body::ParsedBody,
    config::Config,
    dispatcher::{Dispatcher, Endpoint, Handler, TerminalHandler},
    exception::Exception,
    middleware::{build_chain, Middleware, RequestHandler},
    param::{HttpMethod, CONTENT_TYPE_JSON},
    request::Request,
    response::Response,
    tree::{RouteTree, TreeOptions},
    util::{join_prefix, normalize_path, trim_slashes},
};

/// 已注册路由的描述，用于列表展示
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    pub method: HttpMethod,
    pub path: String,
}

/// 非 200 响应追加的 JSON 体，字段顺序即输出顺序
#[derive(Serialize)]
struct ErrorBody<'a> {
    status: u16,
    message: &'a str,
}

pub struct Router {
    trees: HashMap<HttpMethod, RouteTree>,
    options: TreeOptions,
    routes: Vec<RouteInfo>,
    group: Option<String>,
    group_middlewares: Vec<Arc<dyn Middleware>>,
    request: Request,
    response: Response,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            trees: HashMap::new(),
            options,
            routes: Vec::new(),
            group: None,
            group_middlewares: Vec::new(),
            request: Request::default(),
            response: Response::new(),
        }
    }

    /// 以给定的种子响应与请求构造路由器，请求体会先经过 `ParsedBody` 解析
    pub fn with_parts(response: Response, request: Request) -> Self {
        let mut router = Self::new();
        router.response = response;
        router.request = ParsedBody::process(request);
        router
    }

    pub fn from_config(config: &Config) -> Self {
        Self::with_options(TreeOptions {
            static_index: config.static_index(),
            cache_capacity: NonZeroUsize::new(config.cache_size()),
        })
    }
}

// --- 路由注册 ---

impl Router {
    /// 在分组上下文中注册路由。
    ///
    /// 分组可以嵌套：前缀依次拼接，外层分组的中间件排在内层之前。
    /// 回调返回后恢复进入分组之前的前缀与中间件。
    pub fn group<F>(
        &mut self,
        prefix: &str,
        callback: F,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self
    where
        F: FnOnce(&mut Router),
    {
        let previous_group = self.group.clone();
        let previous_middlewares = self.group_middlewares.clone();

        let prefix = trim_slashes(prefix);
        let combined = match previous_group.as_deref() {
            Some(outer) if !prefix.is_empty() => format!("{}/{}", outer, prefix),
            Some(outer) => outer.to_string(),
            None => prefix.to_string(),
        };
        self.group = if combined.is_empty() { None } else { Some(combined) };
        self.group_middlewares.extend(middlewares);

        callback(self);

        self.group = previous_group;
        self.group_middlewares = previous_middlewares;
        self
    }

    /// 当前生效的分组前缀（已去除首尾斜杠）
    pub fn current_group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    /// 以字符串形式的方法名注册路由，方法名大小写不敏感
    pub fn map(
        &mut self,
        method: &str,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, Exception> {
        let method: HttpMethod = match method.parse() {
            Ok(m) => m,
            Err(e) => {
                error!("注册路由{}时使用了不支持的HTTP方法：{}", path, method);
                return Err(e);
            }
        };
        Ok(self.map_endpoint(method, path, Endpoint::handler(handler), middlewares))
    }

    pub fn map_endpoint(
        &mut self,
        method: HttpMethod,
        path: &str,
        endpoint: Endpoint,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        let full_path = match self.group.as_deref() {
            Some(group) => join_prefix(group, path),
            None => path.to_string(),
        };
        let mut stack = self.group_middlewares.clone();
        stack.extend(middlewares);

        let options = self.options;
        self.trees
            .entry(method)
            .or_insert_with(|| RouteTree::with_options(options))
            .add_route(&full_path, endpoint, stack);

        let info = RouteInfo {
            method,
            path: normalize_path(&full_path),
        };
        if !self.routes.contains(&info) {
            self.routes.push(info);
        }
        debug!("注册路由：{} {}", method, full_path);
        self
    }

    pub fn get(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Get, path, Endpoint::handler(handler), middlewares)
    }

    pub fn post(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Post, path, Endpoint::handler(handler), middlewares)
    }

    pub fn put(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Put, path, Endpoint::handler(handler), middlewares)
    }

    pub fn delete(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Delete, path, Endpoint::handler(handler), middlewares)
    }

    pub fn patch(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Patch, path, Endpoint::handler(handler), middlewares)
    }

    pub fn head(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Head, path, Endpoint::handler(handler), middlewares)
    }

    pub fn options(
        &mut self,
        path: &str,
        handler: impl Handler + 'static,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) -> &mut Self {
        self.map_endpoint(HttpMethod::Options, path, Endpoint::handler(handler), middlewares)
    }

    /// 按注册顺序列出全部路由
    pub fn routes(&self) -> Vec<RouteInfo> {
        self.routes.clone()
    }

    pub fn tree(&self, method: HttpMethod) -> Option<&RouteTree> {
        self.trees.get(&method)
    }
}

// --- 请求与响应 ---

impl Router {
    /// 替换绑定的请求，之后的 `dispatcher` 调用使用新的请求
    pub fn set_request(&mut self, request: Request) -> &mut Self {
        self.request = request;
        self
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn set_response(&mut self, response: Response) -> &mut Self {
        self.response = response;
        self
    }

    pub fn response(&self) -> &Response {
        &self.response
    }
}

// --- 分发 ---

impl Router {
    /// 以绑定的请求分发到 `path`，请求方法决定使用哪一棵树
    pub fn dispatcher(&self, path: &str) -> Result<Response, Exception> {
        self.dispatch_path(self.request.clone(), path)
    }

    /// 分发一个独立的请求，路径取自请求本身
    pub fn dispatch(&self, request: Request) -> Result<Response, Exception> {
        let path = request.path().to_string();
        self.dispatch_path(request, &path)
    }

    fn dispatch_path(&self, request: Request, path: &str) -> Result<Response, Exception> {
        let response = self.resolve(request, path)?;
        Ok(decorate(response))
    }

    fn resolve(&self, request: Request, path: &str) -> Result<Response, Exception> {
        let id = request.id();
        let method = request.method();

        let matched = match self.trees.get(&method).and_then(|tree| tree.find_route(path)) {
            Some(matched) => matched,
            None => {
                warn!("[ID{}]未找到路由：{} {}，返回404", id, method, path);
                return Ok(self.response.clone().with_status(404));
            }
        };

        let handler = match matched.handler {
            Endpoint::Handler(handler) => handler,
            Endpoint::Unresolved(name) => {
                error!("[ID{}]路由{} {}的处理器{}不可调用，返回500", id, method, path, name);
                return Ok(self.response.clone().with_status(500));
            }
        };

        let mut request = request;
        for (name, value) in &matched.params {
            request = request.with_attribute(name, value);
        }

        let dispatcher = Dispatcher::new(handler, self.response.clone(), matched.params);
        let chain = build_chain(&matched.middlewares, Box::new(TerminalHandler::new(dispatcher)));
        chain.handle(request)
    }
}

/// 状态码不是 200 时，设置 JSON 内容类型并追加错误描述
fn decorate(response: Response) -> Response {
    if response.status_code() == 200 {
        return response;
    }
    let error_body = ErrorBody {
        status: response.status_code(),
        message: response.information(),
    };
    let json = match serde_json::to_string(&error_body) {
        Ok(json) => json,
        Err(e) => {
            error!("无法序列化错误响应体：{}", e);
            return response;
        }
    };
    let mut response = response.with_header("Content-Type", CONTENT_TYPE_JSON);
    response.write(&json);
    response
}
