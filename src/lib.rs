//! 不可靠信道上的可靠、有序交付：Go-Back-N 与简化 TCP 两种协议，
//! 跑在一个离散事件仿真器上。
//!
//! - [`proto`]：发送端/接收端状态机（核心）
//! - [`net`]  ：包、信道、定时器与连接装配
//! - [`sim`]  ：仿真器与场景描述
//! - [`app`]  ：应用层消息源与接收端
//! - [`viz`]  ：结构化事件记录

pub mod app;
pub mod net;
pub mod proto;
pub mod sim;
pub mod viz;

#[cfg(test)]
mod test;
