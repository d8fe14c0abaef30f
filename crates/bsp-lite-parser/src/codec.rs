// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lump decoding and encoding
//!
//! `count = len / stride`, every record decoded at fixed offsets in the
//! detected byte order.

use crate::layout::RecordLayout;
use crate::reader::{RecordReader, RecordWriter};
use crate::records::{EncodeRecord, LumpRecord};
use bsp_lite_model::{ByteOrder, DecompileError, FormatVersion, Result};

/// Stride of `T` in `version`, rejecting unknown and zero strides
pub fn stride<T: LumpRecord>(version: FormatVersion) -> Result<usize> {
    T::layout(version)
        .map(|l| l.stride())
        .filter(|&s| s > 0)
        .ok_or_else(|| DecompileError::unsupported_record(T::KIND.to_string(), version.to_string()))
}

/// Decode every record of a lump
///
/// # Arguments
/// * `data` - Raw lump bytes
/// * `version` - Format version selecting the layout
/// * `order` - Byte order of the file
///
/// # Returns
/// The records, or an error if the layout is unknown or the length is not a
/// multiple of the stride
pub fn decode<T: LumpRecord>(data: &[u8], version: FormatVersion, order: ByteOrder) -> Result<Vec<T>> {
    let layout = T::layout(version)
        .ok_or_else(|| DecompileError::unsupported_record(T::KIND.to_string(), version.to_string()))?;
    let stride = layout.stride();
    if stride == 0 {
        return Err(DecompileError::unsupported_record(
            T::KIND.to_string(),
            version.to_string(),
        ));
    }
    if data.len() % stride != 0 {
        return Err(DecompileError::malformed(
            T::KIND.to_string(),
            format!("length {} is not a multiple of {}", data.len(), stride),
        ));
    }

    let count = data.len() / stride;
    let mut records = Vec::new();
    records.try_reserve_exact(count).map_err(|e| {
        DecompileError::resource_exhausted(format!("{} x {}: {}", count, T::KIND, e))
    })?;
    for chunk in data.chunks_exact(stride) {
        records.push(T::read(&RecordReader::new(chunk, order), &layout)?);
    }
    Ok(records)
}

/// Encode records back into lump bytes
pub fn encode<T: EncodeRecord>(records: &[T], version: FormatVersion, order: ByteOrder) -> Result<Vec<u8>> {
    let layout = T::layout(version)
        .ok_or_else(|| DecompileError::unsupported_record(T::KIND.to_string(), version.to_string()))?;
    let stride = layout.stride();
    let mut data = vec![0u8; stride * records.len()];
    for (record, chunk) in records.iter().zip(data.chunks_exact_mut(stride)) {
        record.write(&mut RecordWriter::new(chunk, order), &layout)?;
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::*;
    use bsp_lite_model::{Plane, Vector3D};

    fn le_bytes(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_decode_quake2_brushes() {
        let data = le_bytes(&[0, 6, 1, 6, 5, 0x0800_0001]);
        let brushes: Vec<Brush> = decode(&data, FormatVersion::Quake2, ByteOrder::LittleEndian).unwrap();
        assert_eq!(brushes.len(), 2);
        assert_eq!(brushes[1].first_side, Some(6));
        assert_eq!(brushes[1].num_sides(), 5);
        assert_eq!(brushes[1].contents, Some(0x0800_0001));
    }

    #[test]
    fn test_decode_big_endian_planes() {
        let mut data = Vec::new();
        for f in [0.0f32, 0.0, 1.0, 64.0] {
            data.extend_from_slice(&f.to_be_bytes());
        }
        let planes: Vec<Plane> = decode(&data, FormatVersion::Quake3, ByteOrder::BigEndian).unwrap();
        assert_eq!(planes[0], Plane::new(Vector3D::new(0.0, 0.0, 1.0), 64.0));
    }

    #[test]
    fn test_odd_length_is_malformed() {
        let data = vec![0u8; 13];
        let err = decode::<Brush>(&data, FormatVersion::Quake2, ByteOrder::LittleEndian).unwrap_err();
        assert!(matches!(err, DecompileError::MalformedLump { .. }));
    }

    #[test]
    fn test_unknown_layout_is_error() {
        let err = decode::<Brush>(&[], FormatVersion::Quake, ByteOrder::LittleEndian).unwrap_err();
        assert!(matches!(err, DecompileError::UnsupportedRecord { .. }));
        assert!(stride::<Brush>(FormatVersion::HalfLife).is_err());
        assert_eq!(stride::<Brush>(FormatVersion::CallOfDuty).unwrap(), 4);
    }

    #[test]
    fn test_brush_side_round_trip() {
        // planenum, texinfo pairs including a negative texinfo
        let data: Vec<u8> = [12u16, 3, 13, 0xFFFF, 200, 7]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let sides: Vec<BrushSide> = decode(&data, FormatVersion::Quake2, ByteOrder::LittleEndian).unwrap();
        assert_eq!(sides[1].texture, Some(-1));
        let out = encode(&sides, FormatVersion::Quake2, ByteOrder::LittleEndian).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_source_brush_side_round_trip() {
        let mut data = Vec::new();
        for (plane, texinfo, disp, bevel, thin) in [(4u16, 2i16, -1i16, 0u8, 0u8), (9, 0, 3, 1, 1)] {
            data.extend_from_slice(&plane.to_le_bytes());
            data.extend_from_slice(&texinfo.to_le_bytes());
            data.extend_from_slice(&disp.to_le_bytes());
            data.push(bevel);
            data.push(thin);
        }
        let sides: Vec<BrushSide> = decode(&data, FormatVersion::Source21, ByteOrder::LittleEndian).unwrap();
        assert!(!sides[0].is_bevel());
        assert!(sides[1].is_bevel());
        assert_eq!(sides[0].displacement_index(), None);
        assert_eq!(sides[1].displacement_index(), Some(3));
        assert_eq!(encode(&sides, FormatVersion::Source21, ByteOrder::LittleEndian).unwrap(), data);
    }

    #[test]
    fn test_brush_and_edge_round_trip() {
        let brushes = le_bytes(&[0, 6, 1, 6, 6, 0x20]);
        let decoded: Vec<Brush> = decode(&brushes, FormatVersion::Source20, ByteOrder::LittleEndian).unwrap();
        assert_eq!(encode(&decoded, FormatVersion::Source20, ByteOrder::LittleEndian).unwrap(), brushes);

        let edges: Vec<u8> = [0u16, 1, 1, 2, 2, 0].iter().flat_map(|v| v.to_be_bytes()).collect();
        let decoded: Vec<Edge> = decode(&edges, FormatVersion::Quake2, ByteOrder::BigEndian).unwrap();
        assert_eq!(decoded[1], Edge { v0: 1, v1: 2 });
        assert_eq!(encode(&decoded, FormatVersion::Quake2, ByteOrder::BigEndian).unwrap(), edges);
    }

    #[test]
    fn test_call_of_duty_axial_union() {
        let mut data = Vec::new();
        data.extend_from_slice(&(-32.0f32).to_le_bytes());
        data.extend_from_slice(&5i32.to_le_bytes());
        let sides: Vec<BrushSide> = decode(&data, FormatVersion::CallOfDuty, ByteOrder::LittleEndian).unwrap();
        assert_eq!(sides[0].axial_distance(), -32.0);
        assert_eq!(encode(&sides, FormatVersion::CallOfDuty, ByteOrder::LittleEndian).unwrap(), data);
    }
}
