//! Material array codec.
//!
//! An `i32` record count is followed by the records. Under
//! [`MaterialConfigFlag::CURRENT`] each record is the raw six-byte
//! [`Material`]; under any other flag only the enabled channels are written,
//! in this order:
//!
//! | Channel | Present when |
//! |---------|--------------|
//! | index | `DISABLE_INDEX` clear |
//! | r | `ENABLE_VOXEL_COLORS` and `ENABLE_RGBA` (else r = index) |
//! | g, b | `ENABLE_VOXEL_COLORS` |
//! | actor_id | `ENABLE_VOXEL_SPAWNED_ACTORS` |
//! | grass_id | `ENABLE_VOXEL_GRASS` |

use strata_archive::{ArchiveError, ArchiveReader, ArchiveWriter, CountPrefix};

use crate::{CodecError, Material, MaterialConfigFlag, MaterialLayout};

/// Writes `materials` under `flag`.
pub fn encode(
    writer: &mut ArchiveWriter,
    materials: &[Material],
    flag: MaterialConfigFlag,
) -> Result<(), CodecError> {
    if flag.is_raw_layout() {
        writer.write_array(materials, CountPrefix::I32)?;
        return Ok(());
    }

    writer.write_count(materials.len(), CountPrefix::I32)?;
    let mut record = Vec::with_capacity(Material::CHANNELS);
    for material in materials {
        record.clear();
        write_record(material, flag, &mut record);
        writer.write_bytes(&record);
    }
    Ok(())
}

/// Reads materials stored under `layout`, at most `max_count` of them.
///
/// Fails, with the reader errored, if the declared count exceeds `max_count`
/// or does not fit the remaining bytes. No record is read in that case.
pub fn decode(
    reader: &mut ArchiveReader<'_>,
    layout: MaterialLayout,
    max_count: usize,
) -> Result<Vec<Material>, CodecError> {
    let flag = match layout {
        MaterialLayout::Raw(flag) => flag,
        MaterialLayout::Legacy(flag) => {
            tracing::warn!(flag = flag.bits(), "decoding unversioned material layout");
            flag
        }
        MaterialLayout::Migrate(flag) => {
            tracing::debug!(flag = flag.bits(), "migrating materials from another channel layout");
            flag
        }
    };

    let count = reader.read_count(CountPrefix::I32)?;
    if count > max_count {
        reader.set_error();
        return Err(CodecError::TooManyRecords {
            count: count as u64,
            max: max_count as u64,
        });
    }
    if flag.is_raw_layout() {
        return Ok(reader.read_elements(count)?);
    }

    let record_size = flag.record_size();
    let byte_len = count
        .checked_mul(record_size)
        .filter(|&len| len <= reader.remaining());
    let Some(byte_len) = byte_len else {
        reader.set_error();
        return Err(ArchiveError::UnexpectedEof {
            needed: (count as u64).saturating_mul(record_size as u64),
            remaining: reader.remaining() as u64,
        }
        .into());
    };

    let bytes = reader.read_bytes(byte_len)?;
    if record_size == 0 {
        return Ok(vec![Material::default(); count]);
    }
    Ok(bytes
        .chunks_exact(record_size)
        .map(|record| read_record(record, flag))
        .collect())
}

fn write_record(material: &Material, flag: MaterialConfigFlag, out: &mut Vec<u8>) {
    if !flag.contains(MaterialConfigFlag::DISABLE_INDEX) {
        out.push(material.index);
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_COLORS) {
        if flag.contains(MaterialConfigFlag::ENABLE_RGBA) {
            out.push(material.r);
        }
        out.push(material.g);
        out.push(material.b);
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_SPAWNED_ACTORS) {
        out.push(material.actor_id);
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_GRASS) {
        out.push(material.grass_id);
    }
}

/// Rebuilds one record. `record` holds exactly `flag.record_size()` bytes.
fn read_record(record: &[u8], flag: MaterialConfigFlag) -> Material {
    let mut bytes = record.iter().copied();
    let mut next = || bytes.next().unwrap_or_default();
    let mut material = Material::default();

    if !flag.contains(MaterialConfigFlag::DISABLE_INDEX) {
        material.index = next();
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_COLORS) {
        material.r = if flag.contains(MaterialConfigFlag::ENABLE_RGBA) {
            next()
        } else {
            material.index
        };
        material.g = next();
        material.b = next();
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_SPAWNED_ACTORS) {
        material.actor_id = next();
    }
    if flag.contains(MaterialConfigFlag::ENABLE_VOXEL_GRASS) {
        material.grass_id = next();
    }
    material
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_materials(count: usize) -> Vec<Material> {
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        (0..count)
            .map(|_| Material {
                index: rng.random(),
                r: rng.random(),
                g: rng.random(),
                b: rng.random(),
                actor_id: rng.random(),
                grass_id: rng.random(),
            })
            .collect()
    }

    fn encode_to_bytes(materials: &[Material], flag: MaterialConfigFlag) -> Vec<u8> {
        let mut writer = ArchiveWriter::new();
        encode(&mut writer, materials, flag).unwrap();
        writer.into_bytes()
    }

    #[test]
    fn test_raw_layout_roundtrip() {
        let materials = random_materials(50);
        let bytes = encode_to_bytes(&materials, MaterialConfigFlag::CURRENT);
        assert_eq!(bytes.len(), 4 + 50 * 6);

        let mut reader = ArchiveReader::new(&bytes);
        let decoded = decode(&mut reader, MaterialLayout::Raw(MaterialConfigFlag::CURRENT), 50).unwrap();
        assert_eq!(decoded, materials);
    }

    #[test]
    fn test_raw_and_conditional_agree_for_current_flag() {
        let materials = random_materials(8);
        let bytes = encode_to_bytes(&materials, MaterialConfigFlag::CURRENT);
        let mut record = Vec::new();
        for material in &materials {
            write_record(material, MaterialConfigFlag::CURRENT, &mut record);
        }
        assert_eq!(&bytes[4..], &record[..]);
    }

    #[test]
    fn test_legacy_index_only_layout() {
        let mut writer = ArchiveWriter::new();
        writer.write_i32(3);
        writer.write_bytes(&[7, 8, 9]);
        let bytes = writer.into_bytes();

        let mut reader = ArchiveReader::new(&bytes);
        let decoded = decode(&mut reader, MaterialLayout::Legacy(MaterialConfigFlag::empty()), 3).unwrap();
        let indices: Vec<u8> = decoded.iter().map(|m| m.index).collect();
        assert_eq!(indices, vec![7, 8, 9]);
        assert!(decoded.iter().all(|m| m.g == 0 && m.grass_id == 0));
    }

    #[test]
    fn test_colors_without_rgba_mirror_index_into_red() {
        let flag = MaterialConfigFlag::ENABLE_VOXEL_COLORS | MaterialConfigFlag::ENABLE_VOXEL_GRASS;
        let mut writer = ArchiveWriter::new();
        writer.write_i32(1);
        writer.write_bytes(&[5, 60, 70, 3]);
        let bytes = writer.into_bytes();

        let mut reader = ArchiveReader::new(&bytes);
        let decoded = decode(&mut reader, MaterialLayout::Migrate(flag), 1).unwrap();
        assert_eq!(
            decoded,
            vec![Material {
                index: 5,
                r: 5,
                g: 60,
                b: 70,
                actor_id: 0,
                grass_id: 3,
            }]
        );
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_migration_keeps_enabled_channels() {
        let flag = MaterialConfigFlag::DISABLE_INDEX
            | MaterialConfigFlag::ENABLE_VOXEL_COLORS
            | MaterialConfigFlag::ENABLE_RGBA;
        let materials = random_materials(20);
        let bytes = encode_to_bytes(&materials, flag);
        assert_eq!(bytes.len(), 4 + 20 * 3);

        let mut reader = ArchiveReader::new(&bytes);
        let decoded = decode(&mut reader, MaterialLayout::Migrate(flag), 20).unwrap();
        for (original, decoded) in materials.iter().zip(&decoded) {
            assert_eq!(decoded.color()[..3], original.color()[..3]);
            assert_eq!(decoded.index, 0, "index channel was disabled");
        }
    }

    #[test]
    fn test_count_past_end_reads_nothing() {
        let mut writer = ArchiveWriter::new();
        writer.write_i32(4);
        writer.write_bytes(&[1, 2, 3]);
        let bytes = writer.into_bytes();

        let mut reader = ArchiveReader::new(&bytes);
        let result = decode(&mut reader, MaterialLayout::Legacy(MaterialConfigFlag::empty()), 4);
        assert!(matches!(
            result,
            Err(CodecError::Archive(ArchiveError::UnexpectedEof {
                needed: 4,
                remaining: 3
            }))
        ));
        assert!(reader.is_error());
        assert_eq!(reader.position(), 4, "no record bytes consumed");
    }

    #[test]
    fn test_zero_width_records_are_bounded_by_max_count() {
        // Index disabled and no other channel: every record is zero bytes long.
        let mut writer = ArchiveWriter::new();
        writer.write_i32(i32::MAX);
        let bytes = writer.into_bytes();

        let mut reader = ArchiveReader::new(&bytes);
        let result = decode(
            &mut reader,
            MaterialLayout::Migrate(MaterialConfigFlag::DISABLE_INDEX),
            16,
        );
        assert_eq!(
            result,
            Err(CodecError::TooManyRecords {
                count: i32::MAX as u64,
                max: 16
            }),
            "a count above the grid size must be rejected before allocating"
        );
        assert!(reader.is_error());

        let mut writer = ArchiveWriter::new();
        writer.write_i32(16);
        let bytes = writer.into_bytes();
        let mut reader = ArchiveReader::new(&bytes);
        let decoded =
            decode(&mut reader, MaterialLayout::Migrate(MaterialConfigFlag::DISABLE_INDEX), 16)
                .unwrap();
        assert_eq!(decoded, vec![Material::default(); 16]);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_empty_array() {
        let bytes = encode_to_bytes(&[], MaterialConfigFlag::CURRENT);
        let mut reader = ArchiveReader::new(&bytes);
        assert!(
            decode(&mut reader, MaterialLayout::Raw(MaterialConfigFlag::CURRENT), 0)
                .unwrap()
                .is_empty()
        );
    }
}
