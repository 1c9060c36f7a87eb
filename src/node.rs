// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 路由前缀树的节点。
//!
//! 节点只是数据容器：字面量子节点按段文本索引，每个节点至多一个参数子节点。
//! 插入与匹配的逻辑都在 `RouteTree` 中。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{dispatcher::Endpoint, middleware::Middleware};

/// 一条路由上挂载的中间件，按执行顺序排列（分组中间件在前）
pub type MiddlewareStack = Arc<[Arc<dyn Middleware>]>;

pub struct RouteNode {
    /// 字面量子节点
    pub(crate) children: HashMap<String, RouteNode>,
    /// 参数子节点，段以 `:` 开头时进入
    pub(crate) param_child: Option<Box<RouteNode>>,
    /// 参数子节点绑定的参数名（不含 `:`）
    pub(crate) param_name: Option<String>,
    /// 是否为某条已注册路由的终点
    pub(crate) is_terminal: bool,
    pub(crate) handler: Option<Endpoint>,
    pub(crate) middlewares: MiddlewareStack,
}

impl Default for RouteNode {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteNode {
    pub fn new() -> Self {
        Self {
            children: HashMap::new(),
            param_child: None,
            param_name: None,
            is_terminal: false,
            handler: None,
            middlewares: Arc::from(Vec::new()),
        }
    }

    pub fn child(&self, segment: &str) -> Option<&RouteNode> {
        self.children.get(segment)
    }

    pub fn children(&self) -> &HashMap<String, RouteNode> {
        &self.children
    }

    pub fn param_child(&self) -> Option<&RouteNode> {
        self.param_child.as_deref()
    }

    pub fn param_name(&self) -> Option<&str> {
        self.param_name.as_deref()
    }

    pub fn is_terminal(&self) -> bool {
        self.is_terminal
    }

    pub fn handler(&self) -> Option<&Endpoint> {
        self.handler.as_ref()
    }

    pub fn middlewares(&self) -> &MiddlewareStack {
        &self.middlewares
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("children", &self.children)
            .field("param_name", &self.param_name)
            .field("param_child", &self.param_child)
            .field("is_terminal", &self.is_terminal)
            .field("handler", &self.handler)
            .field("middlewares", &self.middlewares.len())
            .finish()
    }
}
