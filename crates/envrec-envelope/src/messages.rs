//! Payload messages commonly found in recordings.
//!
//! Field tags and wire types follow the `.odvd` message definitions these
//! types come from: signed integers are zigzag-encoded, 8- and 16-bit
//! integers travel as 32-bit varints.

use prost::Message;
use serde::Serialize;

use crate::registry::{DecoderRegistry, KnownMessage};

/// WGS84 position fix from a GNSS receiver.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct GeodeticWgs84Reading {
    #[prost(double, tag = "1")]
    pub latitude: f64,
    #[prost(double, tag = "3")]
    pub longitude: f64,
}

impl KnownMessage for GeodeticWgs84Reading {
    const DATA_TYPE: i32 = 19;
    const NAME: &'static str = "opendlv.proxy.GeodeticWgs84Reading";
}

#[derive(Clone, PartialEq, Message, Serialize)]
pub struct TestMessage2 {
    #[prost(uint32, tag = "1")]
    pub field1: u32,
}

impl KnownMessage for TestMessage2 {
    const DATA_TYPE: i32 = 1002;
    const NAME: &'static str = "odcore.testdata.TestMessage2";
}

/// One field of every scalar kind.
#[derive(Clone, PartialEq, Message, Serialize)]
pub struct TestMessage5 {
    #[prost(uint32, tag = "1")]
    pub field1: u32,
    #[prost(sint32, tag = "2")]
    pub field2: i32,
    #[prost(uint32, tag = "3")]
    pub field3: u32,
    #[prost(sint32, tag = "4")]
    pub field4: i32,
    #[prost(uint32, tag = "5")]
    pub field5: u32,
    #[prost(sint32, tag = "6")]
    pub field6: i32,
    #[prost(uint64, tag = "7")]
    pub field7: u64,
    #[prost(sint64, tag = "8")]
    pub field8: i64,
    #[prost(float, tag = "9")]
    pub field9: f32,
    #[prost(double, tag = "10")]
    pub field10: f64,
    #[prost(string, tag = "11")]
    pub field11: String,
}

impl KnownMessage for TestMessage5 {
    const DATA_TYPE: i32 = 1005;
    const NAME: &'static str = "odcore.testdata.TestMessage5";
}

/// Registry with every message in this module.
pub fn standard_registry() -> DecoderRegistry {
    let mut registry = DecoderRegistry::new();
    registry
        .register::<GeodeticWgs84Reading>()
        .register::<TestMessage2>()
        .register::<TestMessage5>();
    registry
}
