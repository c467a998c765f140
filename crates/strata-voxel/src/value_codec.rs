//! Value array codec.
//!
//! Every layout is an `i32` element count followed by raw little-endian
//! samples. Only the sample width and the legacy half-scale correction
//! differ between versions.

use strata_archive::{ArchiveReader, ArchiveWriter, CountPrefix};

use crate::{CodecError, Value, Value8, ValueConfigFlag, ValueLayout, ValueWidth};

/// Writes `values` at the given storage width.
pub fn encode(
    writer: &mut ArchiveWriter,
    values: &[Value],
    width: ValueWidth,
) -> Result<(), CodecError> {
    match width {
        ValueWidth::Sixteen => writer.write_array(values, CountPrefix::I32)?,
        ValueWidth::Eight => {
            let narrowed: Vec<Value8> = values.iter().map(|v| v.to_value8()).collect();
            writer.write_array(&narrowed, CountPrefix::I32)?;
        }
    }
    Ok(())
}

/// Reads `values` stored under `layout`.
///
/// The declared count must fit the remaining bytes; otherwise the reader is
/// errored and nothing is returned.
pub fn decode(reader: &mut ArchiveReader<'_>, layout: ValueLayout) -> Result<Vec<Value>, CodecError> {
    let values = match layout {
        ValueLayout::Legacy16Doubled => {
            tracing::warn!("decoding half-scale legacy values");
            let raw: Vec<i16> = reader.read_array(CountPrefix::I32)?;
            decode_legacy_16(&raw)
        }
        ValueLayout::Legacy16 | ValueLayout::Flagged(ValueWidth::Sixteen) => {
            reader.read_array(CountPrefix::I32)?
        }
        ValueLayout::Flagged(ValueWidth::Eight) => reader
            .read_array::<Value8>(CountPrefix::I32)?
            .into_iter()
            .map(Value8::to_value)
            .collect(),
    };
    Ok(values)
}

/// Reads a flagged value array, failing on a flag with both or neither
/// width bit.
pub fn decode_flagged(
    reader: &mut ArchiveReader<'_>,
    flag: ValueConfigFlag,
) -> Result<Vec<Value>, CodecError> {
    let width = flag.width().inspect_err(|_| reader.set_error())?;
    decode(reader, ValueLayout::Flagged(width))
}

/// Applies the half-scale correction: each raw sample is doubled, then
/// clamped onto the storage range.
pub fn decode_legacy_16(raw: &[i16]) -> Vec<Value> {
    raw.iter()
        .map(|&sample| Value::clamp_to_storage(2 * i32::from(sample)))
        .collect()
}
