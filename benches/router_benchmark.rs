use std::num::NonZeroUsize;
use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wrouter::{
    DefaultHeaders, Endpoint, Exception, HttpMethod, Middleware, Request, RequestHandler,
    Response, RouteTree, Router, TreeOptions,
};

fn endpoint() -> Endpoint {
    Endpoint::handler(|_request: Request, response: Response| response)
}

/// 构造一棵包含静态路由与参数路由的树
fn populated_tree(options: TreeOptions) -> RouteTree {
    let mut tree = RouteTree::with_options(options);
    for i in 0..100 {
        tree.add_route(&format!("/static/{}/page", i), endpoint(), vec![]);
        tree.add_route(&format!("/resource{}/:id/items/:item", i), endpoint(), vec![]);
    }
    tree
}

fn static_lookup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_lookup");

    let with_index = populated_tree(TreeOptions::default());
    let without_index = populated_tree(TreeOptions {
        static_index: false,
        cache_capacity: None,
    });

    group.bench_function("static_index", |b| {
        b.iter(|| with_index.find_route(black_box("/static/57/page")));
    });
    group.bench_function("trie_descent", |b| {
        b.iter(|| without_index.find_route(black_box("/static/57/page")));
    });

    group.finish();
}

fn param_lookup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("param_lookup");

    let cached = populated_tree(TreeOptions::default());
    let uncached = populated_tree(TreeOptions {
        static_index: true,
        cache_capacity: None,
    });

    group.bench_function("warm_cache", |b| {
        cached.find_route("/resource42/7/items/9");
        b.iter(|| cached.find_route(black_box("/resource42/7/items/9")));
    });
    group.bench_function("no_cache", |b| {
        b.iter(|| uncached.find_route(black_box("/resource42/7/items/9")));
    });

    group.finish();
}

fn cache_capacity_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("cache_capacity");

    // 循环访问 64 个不同的路径，容量不足时每次都会淘汰
    let paths: Vec<String> = (0..64)
        .map(|i| format!("/resource{}/{}/items/{}", i, i, i))
        .collect();

    for capacity in [8usize, 64, 256].iter() {
        let tree = populated_tree(TreeOptions {
            static_index: true,
            cache_capacity: NonZeroUsize::new(*capacity),
        });
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &paths, |b, paths| {
            b.iter(|| {
                for path in paths {
                    black_box(tree.find_route(path));
                }
            });
        });
    }

    group.finish();
}

fn dispatch_chain_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch_chain");

    for depth in [0usize, 1, 4, 16].iter() {
        let mut middlewares: Vec<Arc<dyn Middleware>> = Vec::new();
        for i in 0..*depth {
            if i % 2 == 0 {
                middlewares.push(Arc::new(
                    |request: Request, next: &dyn RequestHandler| -> Result<Response, Exception> {
                        next.handle(request)
                    },
                ));
            } else {
                middlewares.push(Arc::new(DefaultHeaders::new().header("X-Depth", "1")));
            }
        }

        let mut router = Router::new();
        router.get(
            "/users/:id",
            |request: Request, response: Response| {
                response.with_body(request.attribute("id").unwrap_or(""))
            },
            middlewares,
        );

        group.bench_with_input(BenchmarkId::from_parameter(depth), &router, |b, router| {
            b.iter(|| {
                router
                    .dispatch(black_box(Request::new(HttpMethod::Get, "/users/123")))
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn not_found_benchmark(c: &mut Criterion) {
    let mut router = Router::new();
    router.get("/users/:id", |_request: Request, response: Response| response, vec![]);

    c.bench_function("dispatch_not_found", |b| {
        b.iter(|| {
            router
                .dispatch(black_box(Request::new(HttpMethod::Get, "/missing/path")))
                .unwrap()
        });
    });
}

criterion_group!(
    benches,
    static_lookup_benchmark,
    param_lookup_benchmark,
    cache_capacity_benchmark,
    dispatch_chain_benchmark,
    not_found_benchmark
);
criterion_main!(benches);
