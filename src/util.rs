// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

//! 路径规范化工具。
//!
//! 注册与查找共用同一套规则：按 `/` 切分，丢弃空段（来自首尾斜杠或重复斜杠）。
//! 因此 `/hello/`、`/hello`、`//hello` 与 `hello` 被视为同一路径。

/// 将路径切分为非空段
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// 规范化路径：以单个 `/` 开头，段之间单个 `/` 分隔，无尾部斜杠。根路径为 `/`。
pub fn normalize_path(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in segments(path) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// 去除首尾的 `/`
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// 拼接分组前缀与路由路径。前缀为空时原样返回路径。
pub fn join_prefix(prefix: &str, path: &str) -> String {
    let prefix = trim_slashes(prefix);
    if prefix.is_empty() {
        return path.to_string();
    }
    let path = trim_slashes(path);
    if path.is_empty() {
        format!("/{}", prefix)
    } else {
        format!("/{}/{}", prefix, path)
    }
}

/// 拆分请求目标中的路径与查询字符串
pub fn split_query(target: &str) -> (&str, Option<&str>) {
    match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    }
}
