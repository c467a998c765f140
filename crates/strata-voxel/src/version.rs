//! Data-asset format milestones and the decode layouts they imply.

use crate::{CodecError, FormatConfig, MaterialConfigFlag, ValueConfigFlag, ValueWidth};

strata_archive::format_version! {
    /// Milestones of the voxel data-asset format. Append only.
    pub enum DataAssetVersion ("data asset") {
        BeforeCustomVersionWasAdded = 0,
        PlaceableItemsInSave = 1,
        AssetItemsImportValueMaterials = 2,
        DataAssetScale = 3,
        RemoveVoxelGrass = 4,
        DataAssetTransform = 5,
        RemoveEnableVoxelSpawnedActorsEnableVoxelGrass = 6,
        FoliagePaint = 7,
        ValueConfigFlagAndSaveGUIDs = 8,
        SingleValues = 9,
        NoVoxelMaterialInHeightmapAssets = 10,
        FixMissingMaterialsInHeightmapAssets = 11,
        AddUserFlagsToSaves = 12,
        StoreSpawnerMatricesRelativeToComponent = 13,
        StoreMaterialChannelsIndividuallyAndRemoveFoliage = 14,
    }
}

/// How a stored value array must be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueLayout {
    /// 16-bit samples written at half scale; each is doubled and clamped.
    Legacy16Doubled,
    /// 16-bit samples from before the width flag was stored.
    Legacy16,
    /// Samples in the width named by the stored flag.
    Flagged(ValueWidth),
}

/// How a stored material array must be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterialLayout {
    /// Per-record conditional fields from before versioning existed.
    Legacy(MaterialConfigFlag),
    /// Stored flag equals the current one.
    Raw(MaterialConfigFlag),
    /// Stored under a different channel configuration; rebuilt per record.
    Migrate(MaterialConfigFlag),
}

impl DataAssetVersion {
    /// Picks the value decode path. The flag is only consulted from
    /// `ValueConfigFlagAndSaveGUIDs` on, older files never stored one.
    pub fn value_layout(self, stored_flag: ValueConfigFlag) -> Result<ValueLayout, CodecError> {
        if self < Self::RemoveEnableVoxelSpawnedActorsEnableVoxelGrass {
            Ok(ValueLayout::Legacy16Doubled)
        } else if self < Self::ValueConfigFlagAndSaveGUIDs {
            Ok(ValueLayout::Legacy16)
        } else {
            stored_flag.width().map(ValueLayout::Flagged)
        }
    }

    /// Picks the material decode path for data stored under `stored_flag`.
    pub fn material_layout(
        self,
        stored_flag: MaterialConfigFlag,
        format: &FormatConfig,
    ) -> MaterialLayout {
        if self == Self::BeforeCustomVersionWasAdded {
            MaterialLayout::Legacy(stored_flag)
        } else if stored_flag == format.material_flag {
            MaterialLayout::Raw(stored_flag)
        } else {
            MaterialLayout::Migrate(stored_flag)
        }
    }
}
