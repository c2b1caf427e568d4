// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::engines::traits::{EngineError, FetchRequest, FetchResponse, HttpFetcher};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Instant;
use tracing::debug;

/// 基于 reqwest 的 HTTP 抓取器
///
/// 客户端在进程内复用，超时按请求设置
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    /// 创建抓取器
    ///
    /// # 参数
    ///
    /// * `user_agent` - 默认 User-Agent，可被请求头覆盖
    pub fn new(user_agent: &str) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }

    fn header_map(headers: &HashMap<String, String>) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in headers {
            if let (Ok(k), Ok(v)) = (
                HeaderName::from_bytes(k.as_bytes()),
                HeaderValue::from_str(v),
            ) {
                map.insert(k, v);
            }
        }
        map
    }

    async fn send(
        &self,
        request: &FetchRequest,
        builder: reqwest::RequestBuilder,
    ) -> Result<FetchResponse, EngineError> {
        let start = Instant::now();
        let response = builder
            .headers(Self::header_map(&request.headers))
            .timeout(request.timeout)
            .send()
            .await
            .map_err(|e| EngineError::FetchFailed {
                url: request.url.clone(),
                reason: e.to_string(),
            })?;

        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let content = response.text().await.map_err(|e| EngineError::FetchFailed {
            url: request.url.clone(),
            reason: e.to_string(),
        })?;

        let response_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            "{} -> {} ({} bytes, {}ms)",
            request.url,
            status_code,
            content.len(),
            response_time_ms
        );

        Ok(FetchResponse {
            status_code,
            content,
            final_url,
            response_time_ms,
        })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    /// 执行 GET 请求
    ///
    /// 非 2xx 状态不在这里转换为错误，由调用方决定
    async fn get(&self, request: &FetchRequest) -> Result<FetchResponse, EngineError> {
        self.send(request, self.client.get(&request.url)).await
    }

    async fn post_json(
        &self,
        request: &FetchRequest,
        body: &Value,
    ) -> Result<FetchResponse, EngineError> {
        self.send(request, self.client.post(&request.url).json(body))
            .await
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
