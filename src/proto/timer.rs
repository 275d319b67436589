//! 重传定时器
//!
//! 每个发送端独占一个定时器，`armed` 标志保证任何时刻至多一个在跑：
//! 已启动时再 start 不做任何事，未启动时 stop 也不做任何事。

use tracing::trace;

use crate::net::NetApi;
use crate::sim::SimTime;

#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    timeout: SimTime,
    armed: bool,
}

impl RetransmitTimer {
    pub fn new(timeout: SimTime) -> Self {
        Self {
            timeout,
            armed: false,
        }
    }

    pub fn timeout(&self) -> SimTime {
        self.timeout
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn start(&mut self, api: &mut dyn NetApi) {
        if self.armed {
            return;
        }
        self.armed = true;
        trace!(timeout = %self.timeout, "⏱️  启动重传定时器");
        api.arm_timer(self.timeout);
    }

    pub fn stop(&mut self, api: &mut dyn NetApi) {
        if !self.armed {
            return;
        }
        self.armed = false;
        trace!("停止重传定时器");
        api.cancel_timer();
    }

    /// 从现在起重新计时
    pub fn restart(&mut self, api: &mut dyn NetApi) {
        self.stop(api);
        self.start(api);
    }

    /// 定时器到期：到期即失效，不需要 cancel
    pub fn on_expired(&mut self) {
        self.armed = false;
    }
}
