//! 数据包类型
//!
//! `Message` 是应用层不透明的载荷；`Packet` 在其外面包上序号、确认号和校验和。
//! 校验和只覆盖载荷，序号/确认号被篡改时靠两者的镜像关系发现（见 [`Packet::is_tampered`]）。

use std::fmt;

/// 序号（也是确认号）的类型
pub type Seq = u64;

/// ACK 包携带的固定载荷
pub const ACK_PAYLOAD: &[u8] = b"ACK";

/// 应用层消息：一段不可变的字节
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Message(Vec<u8>);

impl Message {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self(data.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<Vec<u8>> for Message {
    fn from(v: Vec<u8>) -> Self {
        Self(v)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// 载荷字节之和（回绕加法）
pub fn checksum_of(payload: &[u8]) -> u32 {
    payload
        .iter()
        .fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
}

/// 信道对包的篡改方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tamper {
    /// 改写载荷中下标为 `index` 的字节（越界时取模）
    Payload { index: usize },
    /// 序号 +1
    SeqBump,
    /// 确认号 +1
    AckBump,
}

/// 网络数据包
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    payload: Message,
    seq: Seq,
    ack: Seq,
    checksum: u32,
}

impl Packet {
    /// 按当前载荷计算校验和并构造
    pub fn new(payload: Message, seq: Seq, ack: Seq) -> Self {
        let checksum = checksum_of(payload.as_bytes());
        Self {
            payload,
            seq,
            ack,
            checksum,
        }
    }

    /// 数据包：确认号镜像序号
    pub fn data(seq: Seq, payload: Message) -> Self {
        Self::new(payload, seq, seq)
    }

    /// 累计 ACK：`value` 是接收端下一个期望的序号
    pub fn ack(value: Seq) -> Self {
        Self::new(Message::new(ACK_PAYLOAD), value, value)
    }

    pub fn seq(&self) -> Seq {
        self.seq
    }

    pub fn ack_num(&self) -> Seq {
        self.ack
    }

    pub fn checksum(&self) -> u32 {
        self.checksum
    }

    pub fn payload(&self) -> &Message {
        &self.payload
    }

    pub fn into_payload(self) -> Message {
        self.payload
    }

    /// 重新计算载荷校验和并与存储值比较，不一致即损坏
    pub fn is_corrupt(&self) -> bool {
        checksum_of(self.payload.as_bytes()) != self.checksum
    }

    /// 序号与确认号不再互为镜像：头部被篡改，校验和发现不了
    pub fn is_tampered(&self) -> bool {
        self.seq != self.ack
    }

    /// 校验和与头部交叉检查都通过
    pub fn is_intact(&self) -> bool {
        !self.is_corrupt() && !self.is_tampered()
    }

    /// 信道注入损坏；不重算校验和。空载荷无法改写，退化为序号 +1。
    pub fn tamper(&mut self, how: Tamper) -> Tamper {
        match how {
            Tamper::Payload { index } => {
                if self.payload.is_empty() {
                    return self.tamper(Tamper::SeqBump);
                }
                let i = index % self.payload.0.len();
                self.payload.0[i] = self.payload.0[i].wrapping_add(1);
            }
            Tamper::SeqBump => self.seq = self.seq.wrapping_add(1),
            Tamper::AckBump => self.ack = self.ack.wrapping_add(1),
        }
        how
    }
}
