//! 应用层接收端

use tracing::warn;

use crate::net::Message;
use crate::sim::SimTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub at: SimTime,
    pub msg: Message,
}

/// 记录所有交付的消息。给出期望序列时，逐条比对顺序。
#[derive(Debug, Clone, Default)]
pub struct AppSink {
    delivered: Vec<Delivery>,
    expected: Option<Vec<Message>>,
    violations: u64,
}

impl AppSink {
    pub fn expecting(expected: Vec<Message>) -> Self {
        Self {
            expected: Some(expected),
            ..Self::default()
        }
    }

    pub fn set_expected(&mut self, expected: Vec<Message>) {
        self.expected = Some(expected);
    }

    pub fn accept(&mut self, at: SimTime, msg: Message) {
        if let Some(expected) = &self.expected {
            let idx = self.delivered.len();
            if expected.get(idx) != Some(&msg) {
                warn!(idx, got = %msg, "交付顺序与发送顺序不一致");
                self.violations += 1;
            }
        }
        self.delivered.push(Delivery { at, msg });
    }

    pub fn deliveries(&self) -> &[Delivery] {
        &self.delivered
    }

    pub fn messages(&self) -> Vec<Message> {
        self.delivered.iter().map(|d| d.msg.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.delivered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty()
    }

    /// 重复、缺失或错序的交付次数
    pub fn violations(&self) -> u64 {
        self.violations
    }

    pub fn last_delivery(&self) -> Option<SimTime> {
        self.delivered.last().map(|d| d.at)
    }
}
