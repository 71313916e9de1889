//! AMF3 value encoding (call arguments) and decoding (responses).

use bytes::{BufMut, BytesMut};
use chrono::{TimeZone, Utc};
use std::collections::{BTreeMap, HashMap};

use super::cursor::Cursor;
use super::refs::{DecodeBudget, RefTable, Slot, NODE_COST};
use super::{AmfError, AmfValue, MAX_DEPTH};
use crate::checksum::CallArgument;

pub const UNDEFINED: u8 = 0x00;
pub const NULL: u8 = 0x01;
pub const FALSE: u8 = 0x02;
pub const TRUE: u8 = 0x03;
pub const INTEGER: u8 = 0x04;
pub const DOUBLE: u8 = 0x05;
pub const STRING: u8 = 0x06;
pub const XML_DOC: u8 = 0x07;
pub const DATE: u8 = 0x08;
pub const ARRAY: u8 = 0x09;
pub const OBJECT: u8 = 0x0a;
pub const XML: u8 = 0x0b;
pub const BYTE_ARRAY: u8 = 0x0c;
pub const VECTOR_INT: u8 = 0x0d;
pub const VECTOR_UINT: u8 = 0x0e;
pub const VECTOR_DOUBLE: u8 = 0x0f;
pub const VECTOR_OBJECT: u8 = 0x10;
pub const DICTIONARY: u8 = 0x11;

/// AMF3 integers are 29-bit signed.
pub const INT_MIN: i64 = -(1 << 28);
pub const INT_MAX: i64 = (1 << 28) - 1;

const U29_MAX: u32 = 0x1fff_ffff;

/// Encoded as dynamic members of an anonymous object.
const TICKET_FIELD: &str = "Ticket";
const ANY_ATTRIBUTE_FIELD: &str = "anyAttribute";

pub fn write_u29(dst: &mut BytesMut, n: u32) -> Result<(), AmfError> {
    match n {
        0..=0x7f => dst.put_u8(n as u8),
        0x80..=0x3fff => {
            dst.put_u8(((n >> 7) & 0x7f) as u8 | 0x80);
            dst.put_u8((n & 0x7f) as u8);
        }
        0x4000..=0x1f_ffff => {
            dst.put_u8(((n >> 14) & 0x7f) as u8 | 0x80);
            dst.put_u8(((n >> 7) & 0x7f) as u8 | 0x80);
            dst.put_u8((n & 0x7f) as u8);
        }
        0x20_0000..=U29_MAX => {
            dst.put_u8(((n >> 22) & 0x7f) as u8 | 0x80);
            dst.put_u8(((n >> 15) & 0x7f) as u8 | 0x80);
            dst.put_u8(((n >> 8) & 0x7f) as u8 | 0x80);
            dst.put_u8((n & 0xff) as u8);
        }
        _ => return Err(AmfError::TooLong(n as usize)),
    }
    Ok(())
}

pub(crate) fn read_u29(cur: &mut Cursor<'_>) -> Result<u32, AmfError> {
    let mut result: u32 = 0;
    for _ in 0..3 {
        let byte = cur.read_u8()?;
        if byte & 0x80 == 0 {
            return Ok((result << 7) | byte as u32);
        }
        result = (result << 7) | (byte & 0x7f) as u32;
    }
    let byte = cur.read_u8()?;
    Ok((result << 8) | byte as u32)
}

fn inline_len(len: usize) -> Result<u32, AmfError> {
    let len = u32::try_from(len).map_err(|_| AmfError::TooLong(len))?;
    if len > (U29_MAX >> 1) {
        return Err(AmfError::TooLong(len as usize));
    }
    Ok((len << 1) | 1)
}

/// Writes call arguments as AMF3. One writer per envelope header or message
/// body: the string and traits reference tables live as long as the writer.
#[derive(Default)]
pub struct Amf3Writer {
    strings: HashMap<String, u32>,
    traits: HashMap<String, u32>,
}

impl Amf3Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_value(&mut self, dst: &mut BytesMut, value: &CallArgument) -> Result<(), AmfError> {
        match value {
            CallArgument::Null => dst.put_u8(NULL),
            CallArgument::Bool(false) => dst.put_u8(FALSE),
            CallArgument::Bool(true) => dst.put_u8(TRUE),
            CallArgument::Integer(n) => self.write_integer(dst, *n)?,
            CallArgument::Double(d) => {
                dst.put_u8(DOUBLE);
                dst.put_f64(*d);
            }
            CallArgument::Text(s) => {
                dst.put_u8(STRING);
                self.write_string(dst, s)?;
            }
            CallArgument::Bytes(bytes) => {
                dst.put_u8(BYTE_ARRAY);
                write_u29(dst, inline_len(bytes.len())?)?;
                dst.put_slice(bytes);
            }
            CallArgument::Date(date) => {
                dst.put_u8(DATE);
                write_u29(dst, 1)?;
                dst.put_f64(date.timestamp_millis() as f64);
            }
            CallArgument::Sequence(items) => {
                dst.put_u8(ARRAY);
                write_u29(dst, inline_len(items.len())?)?;
                // empty associative part
                self.write_string(dst, "")?;
                for item in items {
                    self.write_value(dst, item)?;
                }
            }
            CallArgument::Mapping(map) => {
                dst.put_u8(ARRAY);
                write_u29(dst, 1)?;
                for (key, item) in map {
                    if key.is_empty() {
                        return Err(AmfError::EmptyKey);
                    }
                    self.write_string(dst, key)?;
                    self.write_value(dst, item)?;
                }
                self.write_string(dst, "")?;
            }
            CallArgument::Ticket(header) => {
                dst.put_u8(OBJECT);
                self.write_anonymous_traits(dst)?;
                self.write_string(dst, TICKET_FIELD)?;
                dst.put_u8(STRING);
                self.write_string(dst, header.value())?;
                self.write_string(dst, ANY_ATTRIBUTE_FIELD)?;
                dst.put_u8(NULL);
                self.write_string(dst, "")?;
            }
        }
        Ok(())
    }

    fn write_integer(&mut self, dst: &mut BytesMut, n: i64) -> Result<(), AmfError> {
        if (INT_MIN..=INT_MAX).contains(&n) {
            dst.put_u8(INTEGER);
            write_u29(dst, (n as u32) & U29_MAX)
        } else {
            dst.put_u8(DOUBLE);
            dst.put_f64(n as f64);
            Ok(())
        }
    }

    /// String body without marker; used for values, keys and class names.
    fn write_string(&mut self, dst: &mut BytesMut, s: &str) -> Result<(), AmfError> {
        if s.is_empty() {
            return write_u29(dst, 1);
        }
        if let Some(index) = self.strings.get(s) {
            return write_u29(dst, index << 1);
        }
        let index = self.strings.len() as u32;
        self.strings.insert(s.to_owned(), index);
        write_u29(dst, inline_len(s.len())?)?;
        dst.put_slice(s.as_bytes());
        Ok(())
    }

    /// Dynamic, no sealed members, empty class name.
    fn write_anonymous_traits(&mut self, dst: &mut BytesMut) -> Result<(), AmfError> {
        if let Some(index) = self.traits.get("") {
            return write_u29(dst, (index << 2) | 0b01);
        }
        let index = self.traits.len() as u32;
        self.traits.insert(String::new(), index);
        write_u29(dst, 0b1011)?;
        self.write_string(dst, "")
    }
}

#[derive(Debug, Clone)]
struct Traits {
    class_name: String,
    sealed: Vec<String>,
    dynamic: bool,
    externalizable: bool,
}

/// Decoding context for one AMF3 section. Objects are registered in the
/// reference table before their members are read, so a member that points
/// back at its own container resolves to `Null`. Everything read, references
/// included, is charged against one `DecodeBudget`.
#[derive(Default)]
pub struct Amf3Reader {
    strings: Vec<String>,
    objects: RefTable,
    traits: Vec<Traits>,
    pub(crate) budget: DecodeBudget,
}

impl Amf3Reader {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read_value(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        if depth > MAX_DEPTH {
            return Err(AmfError::TooDeep);
        }
        self.budget.charge(NODE_COST)?;
        let marker = cur.read_u8()?;
        match marker {
            UNDEFINED => Ok(AmfValue::Undefined),
            NULL => Ok(AmfValue::Null),
            FALSE => Ok(AmfValue::Bool(false)),
            TRUE => Ok(AmfValue::Bool(true)),
            INTEGER => {
                let raw = read_u29(cur)?;
                let n = if raw & 0x1000_0000 != 0 {
                    raw as i64 - 0x2000_0000
                } else {
                    raw as i64
                };
                Ok(AmfValue::Integer(n))
            }
            DOUBLE => Ok(AmfValue::Double(cur.read_f64()?)),
            STRING => Ok(AmfValue::String(self.read_string(cur)?)),
            XML_DOC | XML => self.read_xml(cur),
            DATE => self.read_date(cur),
            ARRAY => self.read_array(cur, depth),
            OBJECT => self.read_object(cur, depth),
            BYTE_ARRAY => self.read_byte_array(cur),
            VECTOR_INT | VECTOR_UINT | VECTOR_DOUBLE => self.read_number_vector(cur, marker),
            VECTOR_OBJECT => self.read_object_vector(cur, depth),
            DICTIONARY => self.read_dictionary(cur, depth),
            other => Err(AmfError::UnknownMarker { format: "AMF3", marker: other }),
        }
    }

    pub(crate) fn read_string(&mut self, cur: &mut Cursor<'_>) -> Result<String, AmfError> {
        let header = read_u29(cur)?;
        if header & 1 == 0 {
            let index = (header >> 1) as usize;
            let s = self
                .strings
                .get(index)
                .ok_or(AmfError::BadReference { kind: "string", index })?;
            self.budget.charge(s.len())?;
            return Ok(s.clone());
        }
        let len = (header >> 1) as usize;
        if len == 0 {
            return Ok(String::new());
        }
        self.budget.charge(len)?;
        let s = cur.read_utf8(len)?;
        self.strings.push(s.clone());
        Ok(s)
    }

    /// Reads the U29 header shared by all complex values. `Ok(Err(value))` is a
    /// resolved back-reference, `Ok(Ok(n))` the inline payload bits.
    fn read_header(&mut self, cur: &mut Cursor<'_>) -> Result<Result<u32, AmfValue>, AmfError> {
        let header = read_u29(cur)?;
        if header & 1 == 0 {
            let index = (header >> 1) as usize;
            let value = self.objects.resolve(index, "object", &mut self.budget)?;
            return Ok(Err(value));
        }
        Ok(Ok(header >> 1))
    }

    fn reserve(&mut self) -> Slot {
        self.objects.reserve(&self.budget)
    }

    fn settle(&mut self, slot: Slot, value: AmfValue) -> AmfValue {
        self.objects.settle(slot, value, &self.budget)
    }

    fn read_xml(&mut self, cur: &mut Cursor<'_>) -> Result<AmfValue, AmfError> {
        let len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        self.budget.charge(len)?;
        let value = AmfValue::Xml(cur.read_utf8(len)?);
        Ok(self.objects.push(value, len))
    }

    fn read_date(&mut self, cur: &mut Cursor<'_>) -> Result<AmfValue, AmfError> {
        if let Err(value) = self.read_header(cur)? {
            return Ok(value);
        }
        let millis = cur.read_f64()?;
        let value = AmfValue::Date(millis_to_date(millis)?);
        Ok(self.objects.push(value, 0))
    }

    fn read_byte_array(&mut self, cur: &mut Cursor<'_>) -> Result<AmfValue, AmfError> {
        let len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        self.budget.charge(len)?;
        let value = AmfValue::ByteArray(cur.read_bytes(len)?.to_vec());
        Ok(self.objects.push(value, len))
    }

    fn read_array(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        let dense_len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        let slot = self.reserve();

        let mut assoc = BTreeMap::new();
        loop {
            let key = self.read_string(cur)?;
            if key.is_empty() {
                break;
            }
            let value = self.read_value(cur, depth + 1)?;
            assoc.insert(key, value);
        }

        let mut dense = Vec::with_capacity(dense_len.min(1024));
        for _ in 0..dense_len {
            dense.push(self.read_value(cur, depth + 1)?);
        }

        let value = if assoc.is_empty() {
            AmfValue::Array(dense)
        } else {
            for (index, item) in dense.into_iter().enumerate() {
                assoc.insert(index.to_string(), item);
            }
            AmfValue::Object { class_name: None, fields: assoc }
        };
        Ok(self.settle(slot, value))
    }

    fn read_traits(&mut self, cur: &mut Cursor<'_>, header: u32) -> Result<Traits, AmfError> {
        // header has the object reference bit already shifted out
        if header & 1 == 0 {
            let index = (header >> 1) as usize;
            return self
                .traits
                .get(index)
                .cloned()
                .ok_or(AmfError::BadReference { kind: "traits", index });
        }
        let externalizable = header & 0b10 != 0;
        let dynamic = header & 0b100 != 0;
        let sealed_count = (header >> 3) as usize;
        let class_name = self.read_string(cur)?;
        let mut sealed = Vec::with_capacity(sealed_count.min(256));
        for _ in 0..sealed_count {
            sealed.push(self.read_string(cur)?);
        }
        let traits = Traits { class_name, sealed, dynamic, externalizable };
        self.traits.push(traits.clone());
        Ok(traits)
    }

    fn read_object(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        let header = match self.read_header(cur)? {
            Ok(header) => header,
            Err(value) => return Ok(value),
        };
        let traits = self.read_traits(cur, header)?;
        let slot = self.reserve();

        if traits.externalizable {
            let value = match traits.class_name.as_str() {
                // wrappers around a single value
                "flex.messaging.io.ArrayCollection" | "flex.messaging.io.ObjectProxy" => {
                    self.read_value(cur, depth + 1)?
                }
                _ => return Err(AmfError::Externalizable(traits.class_name)),
            };
            return Ok(self.settle(slot, value));
        }

        let mut fields = BTreeMap::new();
        for name in &traits.sealed {
            let value = self.read_value(cur, depth + 1)?;
            fields.insert(name.clone(), value);
        }
        if traits.dynamic {
            loop {
                let key = self.read_string(cur)?;
                if key.is_empty() {
                    break;
                }
                let value = self.read_value(cur, depth + 1)?;
                fields.insert(key, value);
            }
        }

        let class_name = if traits.class_name.is_empty() {
            None
        } else {
            Some(traits.class_name)
        };
        Ok(self.settle(slot, AmfValue::Object { class_name, fields }))
    }

    fn read_number_vector(&mut self, cur: &mut Cursor<'_>, marker: u8) -> Result<AmfValue, AmfError> {
        let len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        let _fixed = cur.read_u8()?;
        let cost = len.saturating_mul(NODE_COST);
        self.budget.charge(cost)?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            let item = match marker {
                VECTOR_INT => AmfValue::Integer(cur.read_i32()? as i64),
                VECTOR_UINT => AmfValue::Integer(cur.read_u32()? as i64),
                _ => AmfValue::Double(cur.read_f64()?),
            };
            items.push(item);
        }
        Ok(self.objects.push(AmfValue::Array(items), cost))
    }

    fn read_object_vector(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        let len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        let slot = self.reserve();
        let _fixed = cur.read_u8()?;
        let _type_name = self.read_string(cur)?;
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(self.read_value(cur, depth + 1)?);
        }
        Ok(self.settle(slot, AmfValue::Array(items)))
    }

    fn read_dictionary(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        let len = match self.read_header(cur)? {
            Ok(len) => len as usize,
            Err(value) => return Ok(value),
        };
        let slot = self.reserve();
        let _weak_keys = cur.read_u8()?;
        let mut pairs = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            let key = self.read_value(cur, depth + 1)?;
            let value = self.read_value(cur, depth + 1)?;
            pairs.push((key, value));
        }
        Ok(self.settle(slot, AmfValue::Dictionary(pairs)))
    }
}

pub(crate) fn millis_to_date(millis: f64) -> Result<chrono::DateTime<Utc>, AmfError> {
    if !millis.is_finite() {
        return Err(AmfError::InvalidDate(millis));
    }
    Utc.timestamp_millis_opt(millis as i64)
        .single()
        .ok_or(AmfError::InvalidDate(millis))
}
