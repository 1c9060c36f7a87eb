// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::tree::RouteMatch;

/// 路由查找缓存：规范化路径 -> 已解析的匹配结果。
///
/// 仅存放经由前缀树下降成功得到的结果，永远不是权威数据。
pub struct LookupCache {
    cache: LruCache<String, RouteMatch>,
}

impl LookupCache {
    // 根据容量构造
    pub fn from_capacity(capacity: NonZeroUsize) -> Self {
        Self {
            cache: LruCache::new(capacity),
        }
    }

    // 放入，超出容量时淘汰最久未使用的条目
    pub fn push(&mut self, path: &str, matched: RouteMatch) {
        self.cache.put(path.to_string(), matched);
    }

    // 查询，命中时刷新该条目的新近度
    pub fn find(&mut self, path: &str) -> Option<&RouteMatch> {
        self.cache.get(path)
    }

    pub fn clear(&mut self) {
        self.cache.clear();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cache.cap().get()
    }
}
