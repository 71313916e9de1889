use super::AmfError;

/// Big-endian reader over a borrowed buffer.
pub(crate) struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], AmfError> {
        let end = self.pos.checked_add(len).ok_or(AmfError::UnexpectedEof)?;
        let slice = self.buf.get(self.pos..end).ok_or(AmfError::UnexpectedEof)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], AmfError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, AmfError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, AmfError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, AmfError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, AmfError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, AmfError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, AmfError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    pub fn read_utf8(&mut self, len: usize) -> Result<String, AmfError> {
        let raw = self.read_bytes(len)?;
        std::str::from_utf8(raw)
            .map(str::to_owned)
            .map_err(|_| AmfError::InvalidUtf8)
    }

    /// u16 length-prefixed UTF-8 (AMF0 short string, envelope names).
    pub fn read_short_utf8(&mut self) -> Result<String, AmfError> {
        let len = self.read_u16()? as usize;
        self.read_utf8(len)
    }
}
