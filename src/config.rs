// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use serde_derive::Deserialize;
use serde_derive::Serialize;

use log::{error, warn};
use std::fs::File;
use std::io::prelude::*;

use crate::exception::Exception;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    port: u16,
    local: bool,
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_cache_size")]
    cache_size: usize,
    #[serde(default = "default_static_index")]
    static_index: bool,
    #[serde(default = "default_read_buffer_size")]
    read_buffer_size: usize,
    #[serde(default)]
    routes_file: Option<String>,
}

fn default_cache_size() -> usize {
    256
}

fn default_static_index() -> bool {
    true
}

fn default_read_buffer_size() -> usize {
    4096
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            port: 7878,
            local: true,
            worker_threads: num_cpus::get(),
            cache_size: default_cache_size(),
            static_index: default_static_index(),
            read_buffer_size: default_read_buffer_size(),
            routes_file: None,
        }
    }

    /// 从 TOML 文件加载配置。
    ///
    /// 文件无法读取时返回错误；内容无法解析时记录日志并使用默认配置。
    pub fn from_toml(filename: &str) -> Result<Self, Exception> {
        let mut file = match File::open(filename) {
            Ok(f) => f,
            Err(e) => {
                error!("无法打开配置文件{}：{}", filename, e);
                return Err(Exception::ConfigUnreadable(format!("{}: {}", filename, e)));
            }
        };
        let mut str_val = String::new();
        if let Err(e) = file.read_to_string(&mut str_val) {
            error!("读取配置文件{}时出错：{}", filename, e);
            return Err(Exception::ConfigUnreadable(format!("{}: {}", filename, e)));
        }

        let config = Self::from_toml_str(&str_val);
        config.validate()?;
        Ok(config)
    }

    /// 检查无法自动修正的配置项
    pub fn validate(&self) -> Result<(), Exception> {
        if self.port == 0 {
            error!("配置中的端口号不能为0");
            return Err(Exception::ConfigInvalid("port must not be 0".to_string()));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Self {
        let mut raw_config: Config = match toml::from_str(content) {
            Ok(t) => t,
            Err(e) => {
                error!("无法成功从配置文件构建配置对象，使用默认配置：{}", e);
                Config::new()
            }
        };
        if raw_config.worker_threads == 0 {
            raw_config.worker_threads = num_cpus::get();
        }
        if raw_config.cache_size == 0 {
            warn!("cache_size被设置为0，路由查找缓存将被禁用。");
        }
        if raw_config.read_buffer_size == 0 {
            warn!("read_buffer_size不能为0，该值将被改为{}。", default_read_buffer_size());
            raw_config.read_buffer_size = default_read_buffer_size();
        }
        raw_config
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    /// 路由查找缓存容量，0 表示禁用
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    pub fn static_index(&self) -> bool {
        self.static_index
    }

    pub fn read_buffer_size(&self) -> usize {
        self.read_buffer_size
    }

    pub fn routes_file(&self) -> Option<&str> {
        self.routes_file.as_deref()
    }

    pub fn set_cache_size(&mut self, cache_size: usize) -> &mut Self {
        self.cache_size = cache_size;
        self
    }

    pub fn set_routes_file(&mut self, routes_file: &str) -> &mut Self {
        self.routes_file = Some(routes_file.to_string());
        self
    }
}
