use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use wrouter::{Emitter, ParsedBody, Request, Response};

fn request_parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("request_parse");

    let requests = [
        (
            "simple",
            b"GET / HTTP/1.1\r\nHost: localhost:7878\r\nUser-Agent: Test\r\n\r\n".as_slice(),
        ),
        (
            "with_query",
            b"GET /users/123/orders/9?expand=items&limit=20 HTTP/1.1\r\nHost: localhost\r\n\r\n"
                .as_slice(),
        ),
        (
            "many_headers",
            b"GET /products/1/details/new HTTP/1.1\r\n\
              Host: localhost:7878\r\n\
              User-Agent: Mozilla/5.0 (Windows NT 10.0; Win64; x64)\r\n\
              Accept: application/json\r\n\
              Accept-Language: en-US,en;q=0.9\r\n\
              Connection: keep-alive\r\n\
              X-Token: secret\r\n\
              \r\n"
                .as_slice(),
        ),
        (
            "post_json",
            b"POST /api/echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 27\r\n\r\n{\"name\":\"alice\",\"age\":30}\n"
                .as_slice(),
        ),
    ];

    for (name, request) in requests.iter() {
        group.bench_with_input(BenchmarkId::from_parameter(name), request, |b, request| {
            b.iter(|| {
                let _ = Request::try_from(black_box(request), 0).unwrap();
            });
        });
    }

    group.finish();
}

fn body_parse_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("body_parse");

    let bodies = [
        ("json", "application/json", r#"{"name":"alice","tags":["a","b","c"],"age":30}"#),
        (
            "form",
            "application/x-www-form-urlencoded",
            "name=alice+smith&city=beijing&tags=a%2Cb%2Cc",
        ),
        ("xml", "application/xml", "<user><name>alice</name></user>"),
    ];

    for (name, content_type, body) in bodies.iter() {
        let request = Request::try_from(
            format!(
                "POST /submit HTTP/1.1\r\nContent-Type: {}\r\nContent-Length: {}\r\n\r\n{}",
                content_type,
                body.len(),
                body
            )
            .as_bytes(),
            0,
        )
        .unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(name), &request, |b, request| {
            b.iter(|| ParsedBody::process(black_box(request.clone())));
        });
    }

    group.finish();
}

fn emit_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit");
    let emitter = Emitter::new();

    for size in [0usize, 1024, 64 * 1024].iter() {
        let response = Response::new()
            .with_header("Content-Type", "text/plain")
            .with_body(&"x".repeat(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &response, |b, response| {
            b.iter(|| emitter.to_bytes(black_box(response)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    request_parse_benchmark,
    body_parse_benchmark,
    emit_benchmark
);
criterion_main!(benches);
