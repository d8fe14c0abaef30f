// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Byte-order aware field access on fixed-size records

use bsp_lite_model::{ByteOrder, DecompileError, Result, Vector3D};

/// Primitive field encodings found in lump records
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
}

impl FieldType {
    /// Width in bytes
    pub const fn size(self) -> usize {
        match self {
            FieldType::U8 => 1,
            FieldType::I16 | FieldType::U16 => 2,
            FieldType::I32 | FieldType::U32 | FieldType::F32 => 4,
        }
    }
}

/// A typed field at a fixed offset inside a record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    pub offset: usize,
    pub ty: FieldType,
}

impl Field {
    pub const fn new(offset: usize, ty: FieldType) -> Self {
        Self { offset, ty }
    }

    pub const fn u8(offset: usize) -> Self {
        Self::new(offset, FieldType::U8)
    }

    pub const fn i16(offset: usize) -> Self {
        Self::new(offset, FieldType::I16)
    }

    pub const fn u16(offset: usize) -> Self {
        Self::new(offset, FieldType::U16)
    }

    pub const fn i32(offset: usize) -> Self {
        Self::new(offset, FieldType::I32)
    }

    pub const fn u32(offset: usize) -> Self {
        Self::new(offset, FieldType::U32)
    }

    pub const fn end(&self) -> usize {
        self.offset + self.ty.size()
    }
}

/// Read-only view of one record (or a whole header)
#[derive(Clone, Copy)]
pub struct RecordReader<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, order }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    fn bytes<const N: usize>(&self, offset: usize) -> Result<[u8; N]> {
        self.data
            .get(offset..offset + N)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| {
                DecompileError::malformed(
                    "record",
                    format!("read of {} bytes at {} past end ({})", N, offset, self.data.len()),
                )
            })
    }

    pub fn u8(&self, offset: usize) -> Result<u8> {
        Ok(self.bytes::<1>(offset)?[0])
    }

    pub fn u16(&self, offset: usize) -> Result<u16> {
        let b = self.bytes::<2>(offset)?;
        Ok(match self.order {
            ByteOrder::LittleEndian => u16::from_le_bytes(b),
            ByteOrder::BigEndian => u16::from_be_bytes(b),
        })
    }

    pub fn i16(&self, offset: usize) -> Result<i16> {
        Ok(self.u16(offset)? as i16)
    }

    pub fn u32(&self, offset: usize) -> Result<u32> {
        let b = self.bytes::<4>(offset)?;
        Ok(match self.order {
            ByteOrder::LittleEndian => u32::from_le_bytes(b),
            ByteOrder::BigEndian => u32::from_be_bytes(b),
        })
    }

    pub fn i32(&self, offset: usize) -> Result<i32> {
        Ok(self.u32(offset)? as i32)
    }

    pub fn f32(&self, offset: usize) -> Result<f32> {
        Ok(f32::from_bits(self.u32(offset)?))
    }

    /// Three consecutive floats
    pub fn vec3(&self, offset: usize) -> Result<Vector3D> {
        Ok(Vector3D::from_f32([
            self.f32(offset)?,
            self.f32(offset + 4)?,
            self.f32(offset + 8)?,
        ]))
    }

    /// Three consecutive 16-bit integers (compressed bounds)
    pub fn vec3_i16(&self, offset: usize) -> Result<Vector3D> {
        Ok(Vector3D::new(
            self.i16(offset)? as f64,
            self.i16(offset + 2)? as f64,
            self.i16(offset + 4)? as f64,
        ))
    }

    /// Three consecutive 32-bit integers
    pub fn vec3_i32(&self, offset: usize) -> Result<Vector3D> {
        Ok(Vector3D::new(
            self.i32(offset)? as f64,
            self.i32(offset + 4)? as f64,
            self.i32(offset + 8)? as f64,
        ))
    }

    /// Integer value of a layout field, sign-extended
    pub fn int(&self, field: Field) -> Result<i64> {
        Ok(match field.ty {
            FieldType::U8 => self.u8(field.offset)? as i64,
            FieldType::I16 => self.i16(field.offset)? as i64,
            FieldType::U16 => self.u16(field.offset)? as i64,
            FieldType::I32 => self.i32(field.offset)? as i64,
            FieldType::U32 => self.u32(field.offset)? as i64,
            FieldType::F32 => self.f32(field.offset)? as i64,
        })
    }

    /// Optional field; absent fields read as `None`
    pub fn opt_int(&self, field: Option<Field>) -> Result<Option<i64>> {
        field.map(|f| self.int(f)).transpose()
    }

    /// NUL-terminated fixed-width name
    pub fn name(&self, offset: usize, width: usize) -> Result<String> {
        let raw = self.data.get(offset..offset + width).ok_or_else(|| {
            DecompileError::malformed("record", format!("name at {} past end", offset))
        })?;
        let end = memchr::memchr(0, raw).unwrap_or(raw.len());
        Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
    }
}

/// Writer for re-encoding records into their binary layout
pub struct RecordWriter<'a> {
    data: &'a mut [u8],
    order: ByteOrder,
}

impl<'a> RecordWriter<'a> {
    pub fn new(data: &'a mut [u8], order: ByteOrder) -> Self {
        Self { data, order }
    }

    fn put<const N: usize>(&mut self, offset: usize, le: [u8; N], be: [u8; N]) -> Result<()> {
        let slot = self.data.get_mut(offset..offset + N).ok_or_else(|| {
            DecompileError::malformed("record", format!("write at {} past end", offset))
        })?;
        slot.copy_from_slice(match self.order {
            ByteOrder::LittleEndian => &le,
            ByteOrder::BigEndian => &be,
        });
        Ok(())
    }

    /// Store an integer into a layout field, truncating to its width
    pub fn int(&mut self, field: Field, value: i64) -> Result<()> {
        match field.ty {
            FieldType::U8 => self.put(field.offset, [value as u8], [value as u8]),
            FieldType::I16 | FieldType::U16 => {
                let v = value as u16;
                self.put(field.offset, v.to_le_bytes(), v.to_be_bytes())
            }
            FieldType::I32 | FieldType::U32 => {
                let v = value as u32;
                self.put(field.offset, v.to_le_bytes(), v.to_be_bytes())
            }
            FieldType::F32 => self.f32(field.offset, value as f32),
        }
    }

    pub fn opt_int(&mut self, field: Option<Field>, value: Option<i64>) -> Result<()> {
        match (field, value) {
            (Some(f), Some(v)) => self.int(f, v),
            _ => Ok(()),
        }
    }

    pub fn f32(&mut self, offset: usize, value: f32) -> Result<()> {
        let bits = value.to_bits();
        self.put(offset, bits.to_le_bytes(), bits.to_be_bytes())
    }

    pub fn vec3(&mut self, offset: usize, value: &Vector3D) -> Result<()> {
        for i in 0..3 {
            self.f32(offset + i * 4, value[i] as f32)?;
        }
        Ok(())
    }
}
