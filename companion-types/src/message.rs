//! Frame message types.

/// The 1-byte frame type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    KeepAlive = 0,
    ConnectionAccepted = 1,
    ConnectionRefused = 2,
    DataUpdate = 3,
    LocalMapUpdate = 4,
    Command = 5,
    CommandResult = 6,
}

impl MessageType {
    pub fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::KeepAlive,
            1 => Self::ConnectionAccepted,
            2 => Self::ConnectionRefused,
            3 => Self::DataUpdate,
            4 => Self::LocalMapUpdate,
            5 => Self::Command,
            6 => Self::CommandResult,
            _ => return None,
        })
    }

    pub fn tag(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_known_tag() {
        for tag in 0..=6u8 {
            let ty = MessageType::from_tag(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert!(MessageType::from_tag(7).is_none());
    }
}
