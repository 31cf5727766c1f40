//! Conversion of typed producer values into canonicalizable payloads.
//!
//! `serde_json::to_value` turns non-finite floats into `null`, which would
//! silently change what gets hashed. `to_payload` walks the value with a
//! probing serializer first and rejects anything outside the permitted type
//! set: non-finite numbers, and map keys that are not strings.

use std::fmt;

use serde::ser::{self, Impossible, Serialize};
use serde_json::Value;

use certus_contracts::error::{CertusError, CertusResult};

/// Convert `value` into a JSON payload accepted by the canonicalizer.
pub fn to_payload<T: Serialize + ?Sized>(value: &T) -> CertusResult<Value> {
    let mut probe = Probe::default();
    value.serialize(&mut probe).map_err(|e| CertusError::UnserializableValue {
        path: e.path,
        reason: e.reason,
    })?;

    serde_json::to_value(value).map_err(|e| CertusError::UnserializableValue {
        path: "root".to_string(),
        reason: e.to_string(),
    })
}

#[derive(Debug)]
struct ProbeError {
    path: String,
    reason: String,
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

impl std::error::Error for ProbeError {}

impl ser::Error for ProbeError {
    fn custom<M: fmt::Display>(msg: M) -> Self {
        Self {
            path: "root".to_string(),
            reason: msg.to_string(),
        }
    }
}

#[derive(Default)]
struct Probe {
    segments: Vec<String>,
}

impl Probe {
    fn fail(&self, reason: &str) -> ProbeError {
        let path = if self.segments.is_empty() {
            "root".to_string()
        } else {
            format!("root.{}", self.segments.join("."))
        };
        ProbeError {
            path,
            reason: reason.to_string(),
        }
    }

    fn check_float(&self, f: f64) -> Result<(), ProbeError> {
        if f.is_finite() {
            Ok(())
        } else {
            Err(self.fail("non-finite number"))
        }
    }

    fn nested<T: Serialize + ?Sized>(&mut self, segment: String, value: &T) -> Result<(), ProbeError> {
        self.segments.push(segment);
        let result = value.serialize(&mut *self);
        self.segments.pop();
        result
    }
}

/// Compound state: the element index, or the key awaiting its value.
struct Compound<'a> {
    probe: &'a mut Probe,
    index: usize,
    key: Option<String>,
}

impl<'a> Compound<'a> {
    fn new(probe: &'a mut Probe) -> Self {
        Self { probe, index: 0, key: None }
    }

    fn element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        let segment = format!("[{}]", self.index);
        self.index += 1;
        self.probe.nested(segment, value)
    }
}

impl<'a> ser::Serializer for &'a mut Probe {
    type Ok = ();
    type Error = ProbeError;
    type SerializeSeq = Compound<'a>;
    type SerializeTuple = Compound<'a>;
    type SerializeTupleStruct = Compound<'a>;
    type SerializeTupleVariant = Compound<'a>;
    type SerializeMap = Compound<'a>;
    type SerializeStruct = Compound<'a>;
    type SerializeStructVariant = Compound<'a>;

    fn serialize_bool(self, _v: bool) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_i8(self, _v: i8) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_i16(self, _v: i16) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_i32(self, _v: i32) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_i64(self, _v: i64) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_u8(self, _v: u8) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_u16(self, _v: u16) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_u32(self, _v: u32) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_u64(self, _v: u64) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> Result<(), ProbeError> {
        self.check_float(f64::from(v))
    }
    fn serialize_f64(self, v: f64) -> Result<(), ProbeError> {
        self.check_float(v)
    }
    fn serialize_char(self, _v: char) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_str(self, _v: &str) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_bytes(self, _v: &[u8]) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<(), ProbeError> {
        value.serialize(self)
    }
    fn serialize_unit(self) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_unit_struct(self, _name: &'static str) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
    ) -> Result<(), ProbeError> {
        Ok(())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        value.serialize(self)
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        self.nested(variant.to_string(), value)
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_tuple(self, _len: usize) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Compound<'a>, ProbeError> {
        Ok(Compound::new(self))
    }
}

impl ser::SerializeSeq for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        self.element(value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeTuple for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        self.element(value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        self.element(value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        self.element(value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeMap for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), ProbeError> {
        match key.serialize(KeyProbe) {
            Ok(k) => {
                self.key = Some(k);
                Ok(())
            }
            Err(_) => Err(self.probe.fail("map keys must be strings")),
        }
    }
    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), ProbeError> {
        let key = self.key.take().unwrap_or_default();
        self.probe.nested(key, value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeStruct for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        self.probe.nested(key.to_string(), value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for Compound<'_> {
    type Ok = ();
    type Error = ProbeError;
    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), ProbeError> {
        self.probe.nested(key.to_string(), value)
    }
    fn end(self) -> Result<(), ProbeError> {
        Ok(())
    }
}

/// Accepts string-like map keys and rejects everything else.
struct KeyProbe;

macro_rules! reject_key {
    ($($method:ident($($arg:ty),*);)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<String, ProbeError> {
                Err(ser::Error::custom("map keys must be strings"))
            }
        )*
    };
}

impl ser::Serializer for KeyProbe {
    type Ok = String;
    type Error = ProbeError;
    type SerializeSeq = Impossible<String, ProbeError>;
    type SerializeTuple = Impossible<String, ProbeError>;
    type SerializeTupleStruct = Impossible<String, ProbeError>;
    type SerializeTupleVariant = Impossible<String, ProbeError>;
    type SerializeMap = Impossible<String, ProbeError>;
    type SerializeStruct = Impossible<String, ProbeError>;
    type SerializeStructVariant = Impossible<String, ProbeError>;

    fn serialize_str(self, v: &str) -> Result<String, ProbeError> {
        Ok(v.to_string())
    }
    fn serialize_char(self, v: char) -> Result<String, ProbeError> {
        Ok(v.to_string())
    }
    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<String, ProbeError> {
        Ok(variant.to_string())
    }
    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        value: &T,
    ) -> Result<String, ProbeError> {
        value.serialize(self)
    }

    reject_key! {
        serialize_bool(bool);
        serialize_i8(i8);
        serialize_i16(i16);
        serialize_i32(i32);
        serialize_i64(i64);
        serialize_u8(u8);
        serialize_u16(u16);
        serialize_u32(u32);
        serialize_u64(u64);
        serialize_f32(f32);
        serialize_f64(f64);
        serialize_bytes(&[u8]);
        serialize_none();
        serialize_unit();
        serialize_unit_struct(&'static str);
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<String, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<String, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStruct, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, ProbeError> {
        Err(ser::Error::custom("map keys must be strings"))
    }
}
