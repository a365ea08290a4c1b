use time::Duration;

use crate::value_objects::{ParticipantName, Timestamp};

/// 房间内的在线参与者，以名字为唯一键。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub name: ParticipantName,
    /// 最近一次心跳时间
    pub last_status: Timestamp,
}

impl Participant {
    pub fn join(name: ParticipantName, now: Timestamp) -> Self {
        Self {
            name,
            last_status: now,
        }
    }

    pub fn heartbeat(&mut self, now: Timestamp) {
        self.last_status = now;
    }

    /// 最近一次心跳早于 `cutoff` 即视为过期
    pub fn is_stale(&self, cutoff: Timestamp) -> bool {
        self.last_status < cutoff
    }
}

/// 计算过期判定的截止时间：`now - threshold`。
pub fn staleness_cutoff(now: Timestamp, threshold: Duration) -> Timestamp {
    now - threshold
}
