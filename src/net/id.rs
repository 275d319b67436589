//! 端点标识
//!
//! 一条连接只有两端：发送端与接收端。

use serde::{Deserialize, Serialize};

/// 连接中的一端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Sender,
    Receiver,
}

impl Side {
    /// 对端
    pub fn peer(self) -> Side {
        match self {
            Side::Sender => Side::Receiver,
            Side::Receiver => Side::Sender,
        }
    }
}
