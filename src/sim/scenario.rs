//! 场景描述（scenario.json）
//!
//! 一个场景固定一条连接：协议、窗口、超时、信道参数以及应用层要发送的消息。

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::proto::Protocol;

use super::SimTime;

/// 读取或校验场景时的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read scenario file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed scenario json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{field} must be a probability in [0, 1], got {value}")]
    InvalidProbability { field: &'static str, value: f64 },

    #[error("invalid {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("scenario has no messages to send")]
    EmptyWorkload,
}

fn default_window_size() -> u64 {
    4
}

fn default_ssthresh() -> u64 {
    8
}

fn default_timeout_ms() -> u64 {
    40
}

fn default_message_count() -> u64 {
    20
}

fn default_send_interval_ms() -> u64 {
    1
}

fn default_delay_ms() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioSpec {
    pub protocol: Protocol,
    /// 发送窗口（包个数）；0 表示不做流控
    #[serde(default = "default_window_size")]
    pub window_size: u64,
    /// TCP 模式下慢启动阈值的初值
    #[serde(default = "default_ssthresh")]
    pub ssthresh: u64,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub channel: ChannelSpec,
    #[serde(default)]
    pub seed: u64,
    /// 显式给出的消息列表；为空时按 `message_count` 生成 `msg-0, msg-1, ...`
    #[serde(default)]
    pub messages: Vec<String>,
    #[serde(default = "default_message_count")]
    pub message_count: u64,
    #[serde(default = "default_send_interval_ms")]
    pub send_interval_ms: u64,
    /// 仿真截止时间；不填则跑到事件队列为空
    #[serde(default)]
    pub until_ms: Option<u64>,
}

/// 不可靠信道参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelSpec {
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    /// 在 `delay_ms` 之上叠加的均匀随机时延上限；非零时会产生乱序
    #[serde(default)]
    pub jitter_ms: u64,
    #[serde(default)]
    pub loss: f64,
    #[serde(default)]
    pub corrupt: f64,
    #[serde(default)]
    pub duplicate: f64,
}

impl Default for ChannelSpec {
    fn default() -> Self {
        Self {
            delay_ms: default_delay_ms(),
            jitter_ms: 0,
            loss: 0.0,
            corrupt: 0.0,
            duplicate: 0.0,
        }
    }
}

impl ScenarioSpec {
    /// 以给定协议和默认参数构造一个场景
    pub fn new(protocol: Protocol) -> Self {
        Self {
            protocol,
            window_size: default_window_size(),
            ssthresh: default_ssthresh(),
            timeout_ms: default_timeout_ms(),
            channel: ChannelSpec::default(),
            seed: 0,
            messages: Vec::new(),
            message_count: default_message_count(),
            send_interval_ms: default_send_interval_ms(),
            until_ms: None,
        }
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let spec: ScenarioSpec = serde_json::from_str(raw)?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("channel.loss", self.channel.loss),
            ("channel.corrupt", self.channel.corrupt),
            ("channel.duplicate", self.channel.duplicate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { field, value });
            }
        }
        // 丢包率为 1 时永远无法完成，仿真会一直重传
        if self.channel.loss >= 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "channel.loss",
                reason: "a channel that drops every packet never makes progress".into(),
            });
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "timeout_ms",
                reason: "retransmission timeout must be positive".into(),
            });
        }
        if self.protocol == Protocol::Tcp && self.window_size != 0 && self.ssthresh == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ssthresh",
                reason: "slow-start threshold must be positive".into(),
            });
        }
        if self.messages.is_empty() && self.message_count == 0 {
            return Err(ConfigError::EmptyWorkload);
        }
        Ok(())
    }

    /// 应用层要发送的消息（按发送顺序）
    pub fn workload(&self) -> Vec<String> {
        if !self.messages.is_empty() {
            return self.messages.clone();
        }
        (0..self.message_count).map(|i| format!("msg-{i}")).collect()
    }

    pub fn timeout(&self) -> SimTime {
        SimTime::from_millis(self.timeout_ms)
    }

    pub fn send_interval(&self) -> SimTime {
        SimTime::from_millis(self.send_interval_ms)
    }

    pub fn until(&self) -> SimTime {
        self.until_ms.map(SimTime::from_millis).unwrap_or(SimTime::MAX)
    }
}
