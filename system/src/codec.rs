use crate::error::CodecError;
use crate::message::ChannelEvent;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode_event(event: &ChannelEvent) -> Result<Vec<u8>, CodecError> {
    Ok(bincode::serialize(event)?)
}

pub fn decode_event(bytes: &[u8]) -> Result<ChannelEvent, CodecError> {
    Ok(bincode::deserialize::<ChannelEvent>(bytes)?)
}

pub fn encode_payload<T: Serialize>(payload: &T) -> Result<String, CodecError> {
    Ok(serde_json::to_string(payload)?)
}

pub fn decode_payload<T: DeserializeOwned>(payload: &str) -> Result<T, CodecError> {
    Ok(serde_json::from_str::<T>(payload)?)
}
