// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由前缀树
//!
//! 每个 HTTP 方法各有一棵 `RouteTree`。查找按以下顺序进行：
//! 1. 静态索引：不含参数段的路径在注册时直接登记，命中即返回。
//! 2. 查找缓存：最近成功的前缀树下降结果（LRU，命中刷新新近度）。
//! 3. 前缀树下降：每一层优先走字面量子节点，否则走参数子节点并捕获该段。
//!
//! 两种缓存都只是派生数据，任何一次注册都会清空查找缓存。

use std::collections::HashMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use crate::{
    cache::LookupCache,
    dispatcher::{Endpoint, Params},
    middleware::Middleware,
    node::{MiddlewareStack, RouteNode},
    util::{normalize_path, segments},
};

/// 默认的查找缓存容量
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// 一次成功查找的结果
#[derive(Clone)]
pub struct RouteMatch {
    pub handler: Endpoint,
    pub middlewares: MiddlewareStack,
    pub params: Params,
}

impl PartialEq for RouteMatch {
    fn eq(&self, other: &Self) -> bool {
        self.handler == other.handler
            && self.params == other.params
            && self.middlewares.len() == other.middlewares.len()
            && self
                .middlewares
                .iter()
                .zip(other.middlewares.iter())
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

impl fmt::Debug for RouteMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch")
            .field("handler", &self.handler)
            .field("middlewares", &self.middlewares.len())
            .field("params", &self.params)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// 是否为静态路径维护精确匹配索引
    pub static_index: bool,
    /// 查找缓存容量，`None` 表示不缓存
    pub cache_capacity: Option<NonZeroUsize>,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            static_index: true,
            cache_capacity: NonZeroUsize::new(DEFAULT_CACHE_CAPACITY),
        }
    }
}

pub struct RouteTree {
    root: RouteNode,
    static_index: Option<HashMap<String, RouteMatch>>,
    lookup_cache: Option<Mutex<LookupCache>>,
    len: usize,
}

impl Default for RouteTree {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteTree {
    pub fn new() -> Self {
        Self::with_options(TreeOptions::default())
    }

    pub fn with_options(options: TreeOptions) -> Self {
        Self {
            root: RouteNode::new(),
            static_index: options.static_index.then(HashMap::new),
            lookup_cache: options
                .cache_capacity
                .map(|capacity| Mutex::new(LookupCache::from_capacity(capacity))),
            len: 0,
        }
    }

    /// 注册路由。同一路径重复注册时，后注册的处理器与中间件生效。
    pub fn add_route(
        &mut self,
        path: &str,
        handler: Endpoint,
        middlewares: Vec<Arc<dyn Middleware>>,
    ) {
        let mut node = &mut self.root;
        let mut is_static = true;

        for segment in segments(path) {
            match segment.strip_prefix(':') {
                Some(name) => {
                    is_static = false;
                    if node.param_name.is_none() {
                        node.param_name = Some(name.to_string());
                    } else if node.param_name.as_deref() != Some(name) {
                        let existing = node.param_name.as_deref().unwrap_or_default();
                        warn!(
                            "路由{}中的参数名:{}与已注册的:{}冲突，沿用:{}",
                            path, name, existing, existing
                        );
                    }
                    node = node
                        .param_child
                        .get_or_insert_with(|| Box::new(RouteNode::new()))
                        .as_mut();
                }
                None => {
                    node = node
                        .children
                        .entry(segment.to_string())
                        .or_insert_with(RouteNode::new);
                }
            }
        }

        if !node.is_terminal {
            self.len += 1;
        }
        node.is_terminal = true;
        node.handler = Some(handler.clone());
        node.middlewares = Arc::from(middlewares);
        let stack = Arc::clone(&node.middlewares);

        let normalized = normalize_path(path);
        if is_static {
            if let Some(index) = self.static_index.as_mut() {
                index.insert(
                    normalized.clone(),
                    RouteMatch {
                        handler,
                        middlewares: stack,
                        params: Params::new(),
                    },
                );
            }
        }

        if let Some(cache) = &self.lookup_cache {
            lock_cache(cache).clear();
        }
        debug!("路由已注册：{}", normalized);
    }

    /// 查找路由，未匹配时返回 `None`
    pub fn find_route(&self, path: &str) -> Option<RouteMatch> {
        let normalized = normalize_path(path);

        if let Some(index) = &self.static_index {
            if let Some(matched) = index.get(&normalized) {
                return Some(matched.clone());
            }
        }

        if let Some(cache) = &self.lookup_cache {
            if let Some(matched) = lock_cache(cache).find(&normalized) {
                return Some(matched.clone());
            }
        }

        let matched = self.descend(&normalized)?;

        if let Some(cache) = &self.lookup_cache {
            lock_cache(cache).push(&normalized, matched.clone());
        }
        Some(matched)
    }

    fn descend(&self, path: &str) -> Option<RouteMatch> {
        let mut node = &self.root;
        let mut params = Params::new();

        for segment in segments(path) {
            if let Some(child) = node.children.get(segment) {
                node = child;
                continue;
            }
            match (node.param_child.as_deref(), node.param_name.as_ref()) {
                (Some(child), Some(name)) => {
                    params.insert(name.clone(), segment.to_string());
                    node = child;
                }
                _ => return None,
            }
        }

        if !node.is_terminal {
            return None;
        }
        Some(RouteMatch {
            handler: node.handler.clone()?,
            middlewares: Arc::clone(&node.middlewares),
            params,
        })
    }

    /// 已注册的路由条数
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn root(&self) -> &RouteNode {
        &self.root
    }

    /// 查找缓存中的条目数，未启用缓存时为 0
    pub fn cached_len(&self) -> usize {
        self.lookup_cache
            .as_ref()
            .map_or(0, |cache| lock_cache(cache).len())
    }
}

fn lock_cache(cache: &Mutex<LookupCache>) -> MutexGuard<'_, LookupCache> {
    match cache.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("路由查找缓存的锁已中毒，继续使用其中的数据");
            poisoned.into_inner()
        }
    }
}
