// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! # 路由器演示服务
//!
//! 基于 Tokio 运行时的多线程 HTTP 服务，用来承载 `wrouter` 路由器：
//! - 启动时注册演示路由，并按配置加载 TOML 路由清单
//! - 每个连接：解析请求 -> 解析请求体 -> 路由分发 -> 发送响应
//! - 后台管理控制台（CLI 指令交互）

use std::{
    net::{Ipv4Addr, SocketAddrV4},
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};

use log::{debug, error, info, warn};
use serde_json::json;
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    runtime::Builder,
};

use wrouter::{
    param::SERVER_NAME, Config, DefaultHeaders, Emitter, Exception, HandlerRegistry, Middleware,
    ParsedBody, Request, RequestHandler, RequestLogger, Response, RouteManifest, Router,
    StreamEmitter,
};

/// # 程序入口点
///
/// 初始化日志与配置，注册路由，然后在按配置定制的运行时上启动主事件循环。
fn main() {
    // 1. 初始化日志系统：通过外部 YAML 配置级别与输出目的地
    if let Err(e) = log4rs::init_file("config/log4rs.yaml", Default::default()) {
        eprintln!("无法初始化日志系统：{}", e);
    }

    // 2. 环境配置加载
    let config = match Config::from_toml("config/development.toml") {
        Ok(config) => config,
        Err(e) => {
            warn!("{}，使用默认配置", e);
            Config::new()
        }
    };
    info!("配置文件已载入");

    // 3. 路由注册：注册阶段结束后路由器只读，在所有连接间共享
    let router = match build_router(&config) {
        Ok(router) => Arc::new(router),
        Err(e) => {
            error!("路由注册失败：{}", e);
            return;
        }
    };
    info!("路由注册完成，共{}条路由", router.routes().len());

    // 4. 异步运行时定制：根据配置文件分配工作线程数
    let runtime = match Builder::new_multi_thread()
        .worker_threads(config.worker_threads())
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("无法创建异步运行时：{}", e);
            return;
        }
    };

    runtime.block_on(serve(config, router));
}

/// 注册演示路由，并在配置了清单文件时加载清单
fn build_router(config: &Config) -> Result<Router, Exception> {
    let mut router = Router::from_config(config);

    let common: Vec<Arc<dyn Middleware>> = vec![
        Arc::new(RequestLogger),
        Arc::new(DefaultHeaders::new().header("X-Powered-By", SERVER_NAME)),
    ];

    router.group(
        "",
        |r| {
            r.get(
                "/users/:id",
                |request: Request, response: Response| {
                    response.with_body(&format!("user-{}", request.attribute("id").unwrap_or("")))
                },
                vec![],
            );
            r.get(
                "/hello/word",
                |_request: Request, response: Response| response.with_body("Hello Word"),
                vec![],
            );
            r.get(
                "/test/middleware",
                |_request: Request, response: Response| response.with_body("middleware passed"),
                vec![require_token()],
            );
            r.get(
                "/products/:id/details/:new",
                |request: Request, response: Response| {
                    let body = json!({
                        "id": request.attribute("id"),
                        "new": request.attribute("new"),
                    });
                    response
                        .with_header("Content-Type", "application/json")
                        .with_body(&body.to_string())
                },
                vec![],
            );
            r.group(
                "api",
                |r| {
                    r.get(
                        "/ping",
                        |_request: Request, response: Response| response.with_body("pong"),
                        vec![],
                    );
                    r.post(
                        "/echo",
                        |request: Request, response: Response| match request.parsed_body() {
                            Some(body) => response
                                .with_header("Content-Type", "application/json")
                                .with_body(&body.to_string()),
                            None => response.with_status(422),
                        },
                        vec![],
                    );
                },
                vec![],
            );
        },
        common,
    );

    if let Some(routes_file) = config.routes_file() {
        let manifest = RouteManifest::from_file(routes_file)?;
        let count = manifest.register(&mut router, &registry())?;
        info!("已从{}加载{}条路由", routes_file, count);
    }

    Ok(router)
}

/// 清单中可以引用的处理器与中间件
fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .handler("health", |_request: Request, response: Response| {
            response.with_body("OK")
        })
        .handler("time", |_request: Request, response: Response| {
            response.with_body(&chrono::Utc::now().to_rfc3339())
        })
        .middleware("logger", RequestLogger)
        .middleware(
            "json",
            DefaultHeaders::new().header("Content-Type", "application/json"),
        );
    registry
}

/// 缺少 `X-Token` 请求头时直接返回 401，不再调用后续处理
fn require_token() -> Arc<dyn Middleware> {
    Arc::new(
        |request: Request, next: &dyn RequestHandler| -> Result<Response, Exception> {
            if request.header("X-Token").is_none() {
                warn!("[ID{}]请求缺少X-Token，返回401", request.id());
                return Ok(Response::new().with_status(401));
            }
            next.handle(request)
        },
    )
}

/// 监听端口并持续接收连接
async fn serve(config: Config, router: Arc<Router>) {
    // 支持全地址监听 (0.0.0.0) 或本地回环监听 (127.0.0.1)
    let port: u16 = config.port();
    let address = match config.local() {
        true => Ipv4Addr::new(127, 0, 0, 1),
        false => Ipv4Addr::new(0, 0, 0, 0),
    };
    info!("服务端将在{}:{}上监听Socket连接", address, port);
    let socket = SocketAddrV4::new(address, port);

    let listener = match TcpListener::bind(socket).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("无法绑定端口：{}，错误：{}", port, e);
            return;
        }
    };
    info!("端口{}绑定完成", port);

    // shutdown_flag: 停机标志
    // active_connection: 当前并发连接数
    let shutdown_flag = Arc::new(Mutex::new(false));
    let active_connection = Arc::new(Mutex::new(0u32));

    // 后台管理控制台，不阻塞监听循环
    tokio::spawn({
        let shutdown_flag = Arc::clone(&shutdown_flag);
        let active_connection = Arc::clone(&active_connection);
        let router = Arc::clone(&router);
        async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin);
            let mut input = String::new();
            loop {
                input.clear();
                match reader.read_line(&mut input).await {
                    Ok(0) | Err(_) => break,
                    Ok(_) => {}
                }
                match input.trim() {
                    "stop" => {
                        *lock(&shutdown_flag) = true;
                        println!("停机指令已激活，服务器将在处理完下一个请求后关闭...");
                        break;
                    }
                    "help" => {
                        println!("== wrouter Help ==");
                        println!("stop   - 发出停机信号");
                        println!("status - 查看当前服务器运行状态");
                        println!("routes - 列出已注册的路由");
                        println!("help   - 显示此帮助信息");
                        println!("==================");
                    }
                    "status" => {
                        let active_count = *lock(&active_connection);
                        println!("== wrouter 状态 ==");
                        println!("当前活跃连接数: {}", active_count);
                        println!("已注册路由数: {}", router.routes().len());
                        println!("==================");
                    }
                    "routes" => {
                        println!("== 已注册路由 ==");
                        for route in router.routes() {
                            println!("{:<8}{}", route.method.as_str(), route.path);
                        }
                        println!("================");
                    }
                    cmd => {
                        println!("无效的命令：{}", cmd);
                    }
                }
            }
        }
    });

    let read_buffer_size = config.read_buffer_size();
    let mut id: u128 = 0;

    // 主事件循环
    loop {
        if *lock(&shutdown_flag) {
            info!("主循环接收到停机指令，正在退出...");
            break;
        }

        let (mut stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("接受TCP连接失败：{}", e);
                continue;
            }
        };
        debug!("[ID{}]TCP连接已建立：{}", id, addr);

        let active_connection = Arc::clone(&active_connection);
        let router = Arc::clone(&router);

        tokio::spawn(async move {
            *lock(&active_connection) += 1;
            handle_connection(&mut stream, id, &router, read_buffer_size).await;
            *lock(&active_connection) -= 1;
        });
        id += 1;
    }
}

/// # 连接处理器
///
/// 读取并解析请求，交给路由器分发，最后发送响应。
async fn handle_connection(stream: &mut TcpStream, id: u128, router: &Router, buffer_size: usize) {
    let mut buffer = vec![0; buffer_size];
    let n = match stream.read(&mut buffer).await {
        Ok(0) => return,
        Ok(n) => n,
        Err(e) => {
            error!("[ID{}]读取TCPStream时遇到错误: {}", id, e);
            return;
        }
    };
    debug!("[ID{}]HTTP请求接收完毕", id);

    let start_time = Instant::now();
    let emitter = Emitter::new();

    // 1. 协议解析
    let request = match Request::try_from(&buffer[..n], id) {
        Ok(request) => ParsedBody::process(request),
        Err(e) => {
            error!("[ID{}]解析HTTP请求失败: {}", id, e);
            let response = Response::new().with_status(400).with_body("Bad Request");
            let _ = stream.write_all(&emitter.to_bytes(&response)).await;
            return;
        }
    };

    // 2. 路由分发，处理器的硬失败转换为 500
    let response = match router.dispatch(request) {
        Ok(response) => response,
        Err(e) => {
            error!("[ID{}]处理请求时发生异常: {}", id, e);
            Response::new()
                .with_status(500)
                .with_body("Internal Server Error")
        }
    };
    debug!(
        "[ID{}]HTTP响应构建完成，服务端用时{}ms。",
        id,
        start_time.elapsed().as_millis()
    );

    // 3. 发送响应，带有 Content-Range 时只发送对应区间
    let response_bytes = StreamEmitter::new().to_bytes(&response);
    debug!("[ID{}]发送响应，长度: {}", id, response_bytes.len());
    if let Err(e) = stream.write_all(&response_bytes).await {
        error!("[ID{}]发送响应失败: {}", id, e);
        return;
    }
    let _ = stream.flush().await;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("共享状态的锁已中毒，继续使用其中的数据");
            poisoned.into_inner()
        }
    }
}
