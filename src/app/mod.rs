//! 应用层
//!
//! 消息的来源与去处。来源决定消息的顺序，传输层只决定每条消息何时进入网络；
//! 去处记录交付结果，并检查是否与发送顺序一致。

mod sink;
mod source;

pub use sink::{AppSink, Delivery};
pub use source::{AppSend, AppSource};
