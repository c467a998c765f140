//! Heightmap asset format milestones.

use strata_voxel::{FormatConfig, MaterialConfigFlag, MaterialLayout};

strata_archive::format_version! {
    /// Milestones of the heightmap asset format. The first fifteen match
    /// `DataAssetVersion`. Append only.
    pub enum HeightmapVersion ("heightmap") {
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
        /// Counts and dimensions widen to 64 bits.
        UseTArray64 = 15,
        /// The range pyramid is stored instead of rebuilt on load.
        SerializeHeightRangeMips = 16,
    }
}

impl HeightmapVersion {
    /// Material decode path, same rules as data assets.
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

    /// Whether counts and dimensions are 64-bit.
    pub fn uses_64_bit_counts(self) -> bool {
        self >= Self::UseTArray64
    }

    /// Whether the pyramid follows the grid on disk.
    pub fn stores_pyramid(self) -> bool {
        self >= Self::SerializeHeightRangeMips
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shares_data_asset_prefix() {
        assert_eq!(
            HeightmapVersion::StoreMaterialChannelsIndividuallyAndRemoveFoliage.as_i32(),
            strata_voxel::DataAssetVersion::LATEST.as_i32()
        );
        assert_eq!(HeightmapVersion::LATEST, HeightmapVersion::SerializeHeightRangeMips);
    }

    #[test]
    fn test_feature_gates() {
        assert!(!HeightmapVersion::StoreMaterialChannelsIndividuallyAndRemoveFoliage.uses_64_bit_counts());
        assert!(HeightmapVersion::UseTArray64.uses_64_bit_counts());
        assert!(!HeightmapVersion::UseTArray64.stores_pyramid());
        assert!(HeightmapVersion::LATEST.stores_pyramid());
    }
}
