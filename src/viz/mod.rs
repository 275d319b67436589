//! 可视化事件记录（用于离线回放）
//!
//! 结构化的 JSON 事件，而不是解析文本日志：每条事件带仿真时间、所在端与事件内容，
//! 第一条是 `meta`，描述协议与信道参数。

mod types;

pub use types::{VizCause, VizDiscard, VizEvent, VizEventKind, VizLogger, VizTamper};
