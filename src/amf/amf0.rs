//! AMF0 decoding. Responses mostly carry a single AVM+ switch into AMF3, but
//! plain AMF0 bodies still show up on error/status messages.

use std::collections::BTreeMap;

use super::amf3::{millis_to_date, Amf3Reader};
use super::cursor::Cursor;
use super::refs::{RefTable, Slot, NODE_COST};
use super::{AmfError, AmfValue, MAX_DEPTH};

pub const NUMBER: u8 = 0x00;
pub const BOOLEAN: u8 = 0x01;
pub const STRING: u8 = 0x02;
pub const OBJECT: u8 = 0x03;
pub const NULL: u8 = 0x05;
pub const UNDEFINED: u8 = 0x06;
pub const REFERENCE: u8 = 0x07;
pub const ECMA_ARRAY: u8 = 0x08;
pub const OBJECT_END: u8 = 0x09;
pub const STRICT_ARRAY: u8 = 0x0a;
pub const DATE: u8 = 0x0b;
pub const LONG_STRING: u8 = 0x0c;
pub const UNSUPPORTED: u8 = 0x0d;
pub const XML_DOC: u8 = 0x0f;
pub const TYPED_OBJECT: u8 = 0x10;
pub const AVMPLUS: u8 = 0x11;

/// Decoding context for one envelope header or message body. AMF3 sections
/// reached through the AVM+ marker share one AMF3 context, and both formats
/// draw on the AMF3 context's decode budget.
#[derive(Default)]
pub struct Amf0Reader {
    references: RefTable,
    amf3: Amf3Reader,
}

impl Amf0Reader {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn read_value(&mut self, cur: &mut Cursor<'_>, depth: usize) -> Result<AmfValue, AmfError> {
        if depth > MAX_DEPTH {
            return Err(AmfError::TooDeep);
        }
        self.amf3.budget.charge(NODE_COST)?;
        let marker = cur.read_u8()?;
        match marker {
            NUMBER => Ok(AmfValue::Double(cur.read_f64()?)),
            BOOLEAN => Ok(AmfValue::Bool(cur.read_u8()? != 0)),
            STRING => Ok(AmfValue::String(self.read_short_string(cur)?)),
            LONG_STRING => {
                let len = cur.read_u32()? as usize;
                self.amf3.budget.charge(len)?;
                Ok(AmfValue::String(cur.read_utf8(len)?))
            }
            XML_DOC => {
                let len = cur.read_u32()? as usize;
                self.amf3.budget.charge(len)?;
                Ok(AmfValue::Xml(cur.read_utf8(len)?))
            }
            NULL => Ok(AmfValue::Null),
            UNDEFINED | UNSUPPORTED => Ok(AmfValue::Undefined),
            OBJECT => self.read_object(cur, None, depth),
            TYPED_OBJECT => {
                let class_name = self.read_short_string(cur)?;
                self.read_object(cur, Some(class_name), depth)
            }
            ECMA_ARRAY => {
                // the count is advisory; the member list is terminated like an object
                let _count = cur.read_u32()?;
                self.read_object(cur, None, depth)
            }
            STRICT_ARRAY => {
                let len = cur.read_u32()? as usize;
                let slot = self.reserve();
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.read_value(cur, depth + 1)?);
                }
                Ok(self.settle(slot, AmfValue::Array(items)))
            }
            DATE => {
                let millis = cur.read_f64()?;
                let _timezone = cur.read_i16()?;
                Ok(AmfValue::Date(millis_to_date(millis)?))
            }
            REFERENCE => {
                let index = cur.read_u16()? as usize;
                self.references.resolve(index, "AMF0 object", &mut self.amf3.budget)
            }
            AVMPLUS => self.amf3.read_value(cur, depth + 1),
            other => Err(AmfError::UnknownMarker { format: "AMF0", marker: other }),
        }
    }

    fn reserve(&mut self) -> Slot {
        self.references.reserve(&self.amf3.budget)
    }

    fn settle(&mut self, slot: Slot, value: AmfValue) -> AmfValue {
        self.references.settle(slot, value, &self.amf3.budget)
    }

    fn read_short_string(&mut self, cur: &mut Cursor<'_>) -> Result<String, AmfError> {
        let s = cur.read_short_utf8()?;
        self.amf3.budget.charge(s.len())?;
        Ok(s)
    }

    fn read_object(
        &mut self,
        cur: &mut Cursor<'_>,
        class_name: Option<String>,
        depth: usize,
    ) -> Result<AmfValue, AmfError> {
        let slot = self.reserve();
        let mut fields = BTreeMap::new();
        loop {
            let key = self.read_short_string(cur)?;
            if key.is_empty() {
                match cur.read_u8()? {
                    OBJECT_END => break,
                    other => return Err(AmfError::UnknownMarker { format: "AMF0", marker: other }),
                }
            }
            let value = self.read_value(cur, depth + 1)?;
            fields.insert(key, value);
        }
        Ok(self.settle(slot, AmfValue::Object { class_name, fields }))
    }
}
