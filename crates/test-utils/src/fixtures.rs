//! Common test fixtures for drought index portal tests.
//!
//! This module provides pre-defined grids, regions and index identifiers
//! that mirror the datasets the portal serves.

/// Common bounding box definitions for testing.
///
/// Tuples are `(lat_min, lat_max, lon_min, lon_max)`, the order the portal's
/// box entry uses.
pub mod bbox {
    /// Southern Great Plains (2011 Texas drought)
    pub const SOUTHERN_PLAINS: (f64, f64, f64, f64) = (26.0, 36.5, -106.5, -93.5);

    /// Entirely north of the CONUS grids
    pub const NORTH_OF_CONUS: (f64, f64, f64, f64) = (60.0, 70.0, -110.0, -100.0);

    /// Entirely north-east of the CONUS grids
    pub const NORTH_EAST_OF_CONUS: (f64, f64, f64, f64) = (60.0, 70.0, -50.0, -40.0);
}

/// Common grid specifications for testing.
pub mod grid {
    use drip_common::GridSpec;

    /// 4x4 grid at 1 degree over lon 0..4, lat 0..4
    pub fn unit_4x4() -> GridSpec {
        GridSpec::new(4, 4, 1.0, 0.0, 4.0)
    }

    /// 10 cells in a single row, lon 0..10, lat 0..1
    pub fn strip_10() -> GridSpec {
        GridSpec::new(10, 1, 1.0, 0.0, 1.0)
    }

    /// Coarse 2.5 degree CONUS grid (24 x 10)
    pub fn conus_coarse() -> GridSpec {
        GridSpec::new(24, 10, 2.5, -130.0, 50.0)
    }

    /// Operational 0.25 degree CONUS grid
    pub fn conus() -> GridSpec {
        drip_common::grids::conus_0p25()
    }
}

/// Common time values for testing.
pub mod time {
    /// Window covering the 2011-2012 southern plains drought
    pub const DROUGHT_2011_2012: &str = "2011-01-01/2012-12-31";

    /// Summer months
    pub const SUMMER: [u32; 3] = [6, 7, 8];
}

/// Common index identifiers for testing.
pub mod indices {
    pub const PDSI: &str = "pdsi";
    pub const SPI_3: &str = "spi3";
    pub const SPEI_6: &str = "spei6";
    pub const EDDI_1: &str = "eddi1";
    pub const LERI_3: &str = "leri3";

    /// An identifier no threshold family matches
    pub const UNKNOWN: &str = "ndvi";

    /// Every recognised identifier above
    pub const ALL: [&str; 5] = [PDSI, SPI_3, SPEI_6, EDDI_1, LERI_3];
}
