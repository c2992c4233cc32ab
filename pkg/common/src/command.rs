use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A single mutation accepted by a shard's state machine.
///
/// This is the only thing that ever crosses the consensus log: the wire shape
/// is load-bearing for anyone who has already persisted entries in it, so the
/// tag and field names are not renamed casually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum Command {
    #[serde(rename = "PUT")]
    Put {
        key: String,
        #[serde(with = "bytes_as_string")]
        value: Bytes,
    },
    #[serde(rename = "DELETE")]
    Delete { key: String },
}

impl Command {
    pub fn key(&self) -> &str {
        match self {
            Command::Put { key, .. } => key,
            Command::Delete { key } => key,
        }
    }

    /// Panics if a `Put` value is not valid UTF-8. Every value reaching a
    /// `Command` originates at an HTTP handler that built it from a
    /// `String`, so this invariant holds for every command this process
    /// ever constructs itself.
    pub fn encode(&self) -> Bytes {
        Bytes::from(serde_json::to_vec(self).expect("command value must be valid UTF-8"))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Values travel internally as opaque bytes but the wire format (and every
/// existing persisted log) speaks UTF-8 strings, so we pin the conversion here
/// instead of scattering `String::from_utf8` calls through the state machine.
mod bytes_as_string {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Bytes, ser: S) -> Result<S::Ok, S::Error> {
        let s = std::str::from_utf8(value).map_err(serde::ser::Error::custom)?;
        ser.serialize_str(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(de)?;
        Ok(Bytes::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_round_trips_through_json() {
        let cmd = Command::Put {
            key: "foo".to_string(),
            value: Bytes::from_static(b"bar"),
        };
        let encoded = cmd.encode();
        assert_eq!(Command::decode(&encoded).unwrap(), cmd);
    }

    #[test]
    fn delete_has_no_value_field_on_the_wire() {
        let cmd = Command::Delete {
            key: "foo".to_string(),
        };
        let encoded = cmd.encode();
        let v: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert!(v.get("value").is_none());
        assert_eq!(v["op"], "DELETE");
    }

    #[test]
    fn malformed_command_fails_to_decode() {
        assert!(Command::decode(b"not json").is_err());
        assert!(Command::decode(br#"{"op":"FROBNICATE","key":"x"}"#).is_err());
    }
}
