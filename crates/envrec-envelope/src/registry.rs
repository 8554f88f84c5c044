use std::any::Any;
use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use tracing::trace;

use crate::error::PayloadDecodeError;

/// A message type with a fixed `dataType` identifier.
pub trait KnownMessage: prost::Message + Default + Serialize + Send + Sync + 'static {
    /// The `dataType` envelopes carry for this message.
    const DATA_TYPE: i32;
    /// Fully qualified message name.
    const NAME: &'static str;
}

/// A payload decoded by a registered decoder.
pub trait DecodedMessage: fmt::Debug + Send + Sync + 'static {
    /// Fully qualified message name.
    fn message_name(&self) -> &'static str;
    /// Field values as JSON.
    fn to_json(&self) -> serde_json::Value;
    fn as_any(&self) -> &dyn Any;
}

impl<T: KnownMessage> DecodedMessage for T {
    fn message_name(&self) -> &'static str {
        T::NAME
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl dyn DecodedMessage {
    /// Borrow the concrete message if it is a `T`.
    pub fn downcast_ref<T: DecodedMessage>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Function turning payload bytes into a decoded message.
pub type PayloadDecoder = fn(&[u8]) -> Result<Box<dyn DecodedMessage>, prost::DecodeError>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct RegisteredDecoder {
    pub name: &'static str,
    pub decode: PayloadDecoder,
}

impl fmt::Debug for RegisteredDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredDecoder")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// `dataType`-keyed table of payload decoders.
///
/// Filled once at startup, then shared read-only by the decoding pipeline.
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<i32, RegisteredDecoder>,
}

impl DecoderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(dataType, name, decoder)` entries.
    ///
    /// Later entries replace earlier ones with the same `dataType`.
    pub fn from_table(entries: &[(i32, &'static str, PayloadDecoder)]) -> Self {
        let mut registry = Self::new();
        for &(data_type, name, decode) in entries {
            registry.register_fn(data_type, name, decode);
        }
        registry
    }

    /// Register `T` under [`KnownMessage::DATA_TYPE`].
    pub fn register<T: KnownMessage>(&mut self) -> &mut Self {
        self.register_fn(T::DATA_TYPE, T::NAME, decode_known::<T>)
    }

    /// Register an arbitrary decoder for `data_type`.
    pub fn register_fn(
        &mut self,
        data_type: i32,
        name: &'static str,
        decode: PayloadDecoder,
    ) -> &mut Self {
        if let Some(previous) = self
            .decoders
            .insert(data_type, RegisteredDecoder { name, decode })
        {
            trace!(data_type, previous = previous.name, name, "decoder replaced");
        }
        self
    }

    /// Decode `payload` with the decoder registered for `data_type`.
    ///
    /// `Ok(None)` means no decoder is registered; that is not an error.
    pub fn dispatch(
        &self,
        data_type: i32,
        payload: &[u8],
    ) -> Result<Option<Box<dyn DecodedMessage>>, PayloadDecodeError> {
        let Some(entry) = self.decoders.get(&data_type) else {
            return Ok(None);
        };

        (entry.decode)(payload)
            .map(Some)
            .map_err(|source| PayloadDecodeError {
                data_type,
                message: entry.name,
                source,
            })
    }

    /// Look up the entry for `data_type`.
    pub fn get(&self, data_type: i32) -> Option<&RegisteredDecoder> {
        self.decoders.get(&data_type)
    }

    /// Check if a decoder is registered for `data_type`.
    pub fn contains(&self, data_type: i32) -> bool {
        self.decoders.contains_key(&data_type)
    }

    /// Registered `dataType`s in ascending order.
    pub fn data_types(&self) -> Vec<i32> {
        let mut data_types: Vec<i32> = self.decoders.keys().copied().collect();
        data_types.sort_unstable();
        data_types
    }

    /// Registered `(dataType, name)` pairs in ascending order.
    pub fn entries(&self) -> Vec<(i32, &'static str)> {
        self.data_types()
            .into_iter()
            .filter_map(|id| self.decoders.get(&id).map(|entry| (id, entry.name)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }
}

/// Decoder used by [`DecoderRegistry::register`].
pub fn decode_known<T: KnownMessage>(
    payload: &[u8],
) -> Result<Box<dyn DecodedMessage>, prost::DecodeError> {
    let message = T::decode(payload)?;
    Ok(Box::new(message))
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::*;
    use crate::messages::{GeodeticWgs84Reading, TestMessage2};

    #[test]
    fn dispatch_known_type_decodes_equal_message() {
        let mut registry = DecoderRegistry::new();
        registry.register::<GeodeticWgs84Reading>();

        let original = GeodeticWgs84Reading {
            latitude: 57.7089,
            longitude: 11.9746,
        };
        let decoded = registry
            .dispatch(19, &original.encode_to_vec())
            .unwrap()
            .expect("registered type should decode");

        assert_eq!(decoded.message_name(), "opendlv.proxy.GeodeticWgs84Reading");
        assert_eq!(
            decoded.downcast_ref::<GeodeticWgs84Reading>(),
            Some(&original)
        );
        assert!(decoded.downcast_ref::<TestMessage2>().is_none());
    }

    #[test]
    fn dispatch_unknown_type_is_not_an_error() {
        let mut registry = DecoderRegistry::new();
        registry.register::<GeodeticWgs84Reading>();

        assert!(registry.dispatch(999_999, b"anything").unwrap().is_none());
    }

    #[test]
    fn dispatch_failure_names_type_and_message() {
        let mut registry = DecoderRegistry::new();
        registry.register::<GeodeticWgs84Reading>();

        let err = registry.dispatch(19, &[0x09, 0x00]).unwrap_err();
        assert_eq!(err.data_type, 19);
        assert_eq!(err.message, GeodeticWgs84Reading::NAME);
        assert!(err.to_string().contains("dataType 19"));
    }

    #[test]
    fn from_table_and_listing() {
        fn decode_as_test_message(
            payload: &[u8],
        ) -> Result<Box<dyn DecodedMessage>, prost::DecodeError> {
            decode_known::<TestMessage2>(payload)
        }

        let registry = DecoderRegistry::from_table(&[
            (
                1002,
                TestMessage2::NAME,
                decode_as_test_message as PayloadDecoder,
            ),
            (
                19,
                GeodeticWgs84Reading::NAME,
                decode_known::<GeodeticWgs84Reading> as PayloadDecoder,
            ),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(1002));
        assert!(!registry.contains(1005));
        assert_eq!(registry.data_types(), vec![19, 1002]);
        assert_eq!(
            registry.entries(),
            vec![
                (19, GeodeticWgs84Reading::NAME),
                (1002, TestMessage2::NAME)
            ]
        );
        assert_eq!(registry.get(1002).unwrap().name, TestMessage2::NAME);
    }

    #[test]
    fn later_registration_replaces_earlier() {
        let mut registry = DecoderRegistry::new();
        registry
            .register_fn(7, "first", decode_known::<TestMessage2>)
            .register_fn(7, "second", decode_known::<GeodeticWgs84Reading>);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(7).unwrap().name, "second");
    }

    #[test]
    fn decoded_message_serializes_to_json() {
        let mut registry = DecoderRegistry::new();
        registry.register::<TestMessage2>();

        let payload = TestMessage2 { field1: 12 }.encode_to_vec();
        let decoded = registry.dispatch(1002, &payload).unwrap().unwrap();

        assert_eq!(decoded.to_json(), serde_json::json!({ "field1": 12 }));
    }

    #[test]
    fn registry_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DecoderRegistry>();
    }
}
