//! 传输层/协议模块
//!
//! 可靠传输的两端状态机。一条连接在建立时选定协议，之后不再改变：
//! - GBN：累计 ACK，超时整窗重传，接收端不缓存乱序包
//! - TCP（简化版）：累计 ACK，乱序缓存，3 dupACK 快速重传，慢启动式窗口增长

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod receiver;
pub mod sender;
pub mod timer;
pub mod window;

pub use receiver::ReceiverEndpoint;
pub use sender::{SenderConfig, SenderEndpoint};
pub use timer::RetransmitTimer;
pub use window::{ReorderBuffer, SendWindow};

/// 可靠传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    /// Go-Back-N
    Gbn,
    /// 简化 TCP
    Tcp,
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gbn" | "go-back-n" => Ok(Protocol::Gbn),
            "tcp" => Ok(Protocol::Tcp),
            other => Err(format!("unknown protocol {other:?}, expected gbn or tcp")),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Gbn => f.write_str("gbn"),
            Protocol::Tcp => f.write_str("tcp"),
        }
    }
}
