// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

#[cfg(test)]
mod manifest_tests {
    //! # 路由清单测试
    //!
    //! 清单写入临时文件后加载，验证名称解析、分组展开以及未登记处理器的 500 行为。

    use std::io::Write;

    use tempfile::NamedTempFile;
    use wrouter::{
        Config, DefaultHeaders, Exception, HandlerRegistry, HttpMethod, Request, RequestLogger,
        Response, RouteManifest, Router,
    };

    const MANIFEST: &str = r#"
[[routes]]
method = "GET"
path = "/health"
handler = "health"
middlewares = ["json"]

[[routes]]
method = "delete"
path = "/items/:id"
handler = "remove"

[[groups]]
prefix = "/admin/"
middlewares = ["logger"]

[[groups.routes]]
method = "GET"
path = "/reports/:year"
handler = "reports"
"#;

    fn write_manifest(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .handler("health", |_request: Request, response: Response| {
                response.with_body("OK")
            })
            .handler("remove", |request: Request, response: Response| {
                response.with_body(&format!("removed-{}", request.attribute("id").unwrap_or("")))
            })
            .middleware("logger", RequestLogger)
            .middleware(
                "json",
                DefaultHeaders::new().header("Content-Type", "application/json"),
            );
        registry
    }

    #[test]
    fn test_load_and_register_from_file() {
        let file = write_manifest(MANIFEST);
        let manifest = RouteManifest::from_file(file.path().to_str().unwrap()).unwrap();
        let mut router = Router::new();

        let count = manifest.register(&mut router, &registry()).unwrap();
        assert_eq!(count, 3);

        let paths: Vec<String> = router.routes().into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["/health", "/items/:id", "/admin/reports/:year"]);

        let response = router.dispatch(Request::new(HttpMethod::Get, "/health")).unwrap();
        assert_eq!(response.body_string(), "OK");
        assert_eq!(response.header("Content-Type"), Some("application/json"));

        let response = router
            .dispatch(Request::new(HttpMethod::Delete, "/items/9"))
            .unwrap();
        assert_eq!(response.body_string(), "removed-9");
    }

    #[test]
    fn test_unregistered_handler_yields_500() {
        let manifest = RouteManifest::from_toml_str(MANIFEST).unwrap();
        let mut router = Router::new();
        manifest.register(&mut router, &registry()).unwrap();

        let response = router
            .dispatch(Request::new(HttpMethod::Get, "/admin/reports/2026"))
            .unwrap();
        assert_eq!(response.status_code(), 500);
        assert_eq!(
            response.body_string(),
            r#"{"status":500,"message":"Internal Server Error"}"#
        );
    }

    #[test]
    fn test_unknown_middleware_is_error() {
        let manifest = RouteManifest::from_toml_str(
            r#"
[[routes]]
method = "GET"
path = "/x"
handler = "health"
middlewares = ["missing"]
"#,
        )
        .unwrap();
        let mut router = Router::new();

        assert_eq!(
            manifest.register(&mut router, &registry()),
            Err(Exception::UnknownMiddleware("missing".to_string()))
        );
        assert!(router.routes().is_empty());
    }

    #[test]
    fn test_missing_manifest_file() {
        match RouteManifest::from_file("/definitely/not/routes.toml") {
            Err(Exception::ManifestInvalid(_)) => {}
            _ => panic!("Expected ManifestInvalid error"),
        }
    }

    #[test]
    fn test_config_points_to_manifest() {
        let manifest_file = write_manifest(MANIFEST);
        let config_file = write_manifest(&format!(
            "port = 7879\nlocal = true\ncache_size = 8\nroutes_file = \"{}\"",
            manifest_file.path().to_str().unwrap()
        ));

        let config = Config::from_toml(config_file.path().to_str().unwrap()).unwrap();
        let manifest = RouteManifest::from_file(config.routes_file().unwrap()).unwrap();
        let mut router = Router::from_config(&config);
        manifest.register(&mut router, &registry()).unwrap();

        let response = router
            .dispatch(Request::new(HttpMethod::Delete, "/items/1"))
            .unwrap();
        assert_eq!(response.body_string(), "removed-1");
        assert_eq!(router.tree(HttpMethod::Delete).unwrap().cached_len(), 1);
    }
}
