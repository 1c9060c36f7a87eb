// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由清单
//!
//! 路由可以在 TOML 清单中声明：每条路由给出方法、路径、处理器名与中间件名，
//! 名称在注册时通过 `HandlerRegistry` 解析为实际的处理器与中间件。
//!
//! ```toml
//! [[routes]]
//! method = "GET"
//! path = "/health"
//! handler = "health"
//!
//! [[groups]]
//! prefix = "admin"
//! middlewares = ["auth"]
//!
//! [[groups.routes]]
//! method = "GET"
//! path = "/stats"
//! handler = "stats"
//! ```

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use log::{error, info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::{
    dispatcher::{Endpoint, Handler},
    exception::Exception,
    middleware::Middleware,
    param::HttpMethod,
    router::Router,
};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RouteDescriptor {
    pub method: String,
    pub path: String,
    pub handler: String,
    #[serde(default)]
    pub middlewares: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct GroupDescriptor {
    pub prefix: String,
    #[serde(default)]
    pub middlewares: Vec<String>,
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteManifest {
    #[serde(default)]
    pub routes: Vec<RouteDescriptor>,
    #[serde(default)]
    pub groups: Vec<GroupDescriptor>,
}

/// 名称到处理器、中间件的映射
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn Handler>>,
    middlewares: HashMap<String, Arc<dyn Middleware>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handler(&mut self, name: &str, handler: impl Handler + 'static) -> &mut Self {
        self.handlers.insert(name.to_string(), Arc::new(handler));
        self
    }

    pub fn middleware(&mut self, name: &str, middleware: impl Middleware + 'static) -> &mut Self {
        self.middlewares
            .insert(name.to_string(), Arc::new(middleware));
        self
    }

    pub fn get_handler(&self, name: &str) -> Option<Arc<dyn Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn get_middleware(&self, name: &str) -> Option<Arc<dyn Middleware>> {
        self.middlewares.get(name).cloned()
    }

    /// 未登记的处理器名解析为 `Endpoint::Unresolved`，分发时得到 500
    fn endpoint(&self, name: &str) -> Endpoint {
        match self.get_handler(name) {
            Some(handler) => Endpoint::Handler(handler),
            None => {
                warn!("清单中的处理器{}未登记，该路由将返回500", name);
                Endpoint::Unresolved(name.to_string())
            }
        }
    }

    fn middleware_list(&self, names: &[String]) -> Result<Vec<Arc<dyn Middleware>>, Exception> {
        names
            .iter()
            .map(|name| match self.get_middleware(name) {
                Some(middleware) => Ok(middleware),
                None => {
                    error!("清单中的中间件{}未登记", name);
                    Err(Exception::UnknownMiddleware(name.clone()))
                }
            })
            .collect()
    }
}

impl RouteManifest {
    pub fn from_toml_str(content: &str) -> Result<Self, Exception> {
        toml::from_str(content).map_err(|e| Exception::ManifestInvalid(e.to_string()))
    }

    pub fn from_file(filename: &str) -> Result<Self, Exception> {
        let content = match fs::read_to_string(filename) {
            Ok(content) => content,
            Err(e) => {
                error!("无法读取路由清单{}：{}", filename, e);
                return Err(Exception::ManifestInvalid(format!("{}: {}", filename, e)));
            }
        };
        Self::from_toml_str(&content)
    }

    pub fn len(&self) -> usize {
        self.routes.len() + self.groups.iter().map(|g| g.routes.len()).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 把清单中的全部路由注册到路由器，返回注册的条数。
    ///
    /// 所有名称先行解析，任何一个方法或中间件无效都不会注册任何路由。
    pub fn register(&self, router: &mut Router, registry: &HandlerRegistry) -> Result<usize, Exception> {
        let routes = self
            .routes
            .iter()
            .map(|route| ResolvedRoute::resolve(route, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let mut groups = Vec::with_capacity(self.groups.len());
        for group in &self.groups {
            let middlewares = registry.middleware_list(&group.middlewares)?;
            let group_routes = group
                .routes
                .iter()
                .map(|route| ResolvedRoute::resolve(route, registry))
                .collect::<Result<Vec<_>, _>>()?;
            groups.push((group.prefix.as_str(), middlewares, group_routes));
        }

        for route in routes {
            route.register(router);
        }
        for (prefix, middlewares, group_routes) in groups {
            router.group(
                prefix,
                move |r| {
                    for route in group_routes {
                        route.register(r);
                    }
                },
                middlewares,
            );
        }

        let count = self.len();
        info!("路由清单注册完成，共{}条路由", count);
        Ok(count)
    }
}

struct ResolvedRoute {
    method: HttpMethod,
    path: String,
    endpoint: Endpoint,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl ResolvedRoute {
    fn resolve(route: &RouteDescriptor, registry: &HandlerRegistry) -> Result<Self, Exception> {
        let method: HttpMethod = match route.method.parse() {
            Ok(m) => m,
            Err(e) => {
                error!("清单中的路由{}使用了不支持的HTTP方法：{}", route.path, route.method);
                return Err(e);
            }
        };
        Ok(Self {
            method,
            path: route.path.clone(),
            endpoint: registry.endpoint(&route.handler),
            middlewares: registry.middleware_list(&route.middlewares)?,
        })
    }

    fn register(self, router: &mut Router) {
        router.map_endpoint(self.method, &self.path, self.endpoint, self.middlewares);
    }
}
