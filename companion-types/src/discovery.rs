//! Broadcast discovery payload shapes. Accessory to the core wire protocol.

use serde::{Deserialize, Serialize};

/// The UDP probe a client broadcasts: `{"cmd":"autodiscover"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverProbe {
    cmd: DiscoverProbeTag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum DiscoverProbeTag {
    #[serde(rename = "autodiscover")]
    Autodiscover,
}

impl Default for DiscoverProbe {
    fn default() -> Self {
        Self {
            cmd: DiscoverProbeTag::Autodiscover,
        }
    }
}

/// A server's reply to a [`DiscoverProbe`]: `{"MachineType", "addr", "IsBusy"}`.
/// Replies missing any of these keys are discarded by the caller before a
/// `DiscoverReply` is even constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoverReply {
    #[serde(rename = "MachineType")]
    pub machine_type: String,
    pub addr: String,
    #[serde(rename = "IsBusy")]
    pub is_busy: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_serializes_to_fixed_shape() {
        let probe = DiscoverProbe::default();
        assert_eq!(
            serde_json::to_value(probe).unwrap(),
            serde_json::json!({"cmd": "autodiscover"})
        );
    }

    #[test]
    fn reply_round_trips_through_json() {
        let json = r#"{"MachineType":"PC","addr":"192.168.1.5","IsBusy":false}"#;
        let reply: DiscoverReply = serde_json::from_str(json).unwrap();
        assert_eq!(reply.machine_type, "PC");
        assert_eq!(reply.addr, "192.168.1.5");
        assert!(!reply.is_busy);
    }

    #[test]
    fn reply_missing_a_required_key_fails_to_parse() {
        let json = r#"{"MachineType":"PC","addr":"192.168.1.5"}"#;
        assert!(serde_json::from_str::<DiscoverReply>(json).is_err());
    }
}
