//! House system calculations using Swiss Ephemeris

use super::EphemerisError;
use crate::models::HouseSystem;

/// Result of house calculation
#[derive(Debug, Clone)]
pub struct HousePositions {
    /// Ascendant (1st house cusp)
    pub ascendant: f64,
    /// Midheaven (10th house cusp)
    pub midheaven: f64,
    /// House cusps (12 houses, index 0 = 1st house)
    pub cusps: [f64; 12],
    /// ARMC (Sidereal time at location)
    pub armc: f64,
    pub vertex: f64,
}

/// Swiss Ephemeris house system letter
pub fn house_system_code(system: HouseSystem) -> i32 {
    let code = match system {
        HouseSystem::Placidus => b'P',
        HouseSystem::Koch => b'K',
        HouseSystem::Porphyrius => b'O',
        HouseSystem::Regiomontanus => b'R',
        HouseSystem::Campanus => b'C',
        HouseSystem::Equal => b'E',
        HouseSystem::WholeSign => b'W',
        HouseSystem::Alcabitus => b'B',
        HouseSystem::Krusinski => b'U',
        HouseSystem::Morinus => b'M',
    };
    code as i32
}

/// Calculate house positions for a given time and location
pub fn calc_houses(
    julian_day: f64,
    latitude: f64,
    longitude: f64,
    system: HouseSystem,
) -> Result<HousePositions, EphemerisError> {
    // Swiss Ephemeris uses a 13-element array for cusps (index 1-12)
    // and a 10-element array for special points
    let mut cusps: [f64; 13] = [0.0; 13];
    let mut ascmc: [f64; 10] = [0.0; 10];

    let ret = unsafe {
        libswisseph_sys::swe_houses(
            julian_day,
            latitude,
            longitude,
            house_system_code(system),
            cusps.as_mut_ptr(),
            ascmc.as_mut_ptr(),
        )
    };

    if ret < 0 {
        return Err(EphemerisError::Houses(format!(
            "{} houses unavailable at latitude {:.4}",
            system, latitude
        )));
    }

    let mut house_cusps: [f64; 12] = [0.0; 12];
    house_cusps.copy_from_slice(&cusps[1..13]);

    Ok(HousePositions {
        ascendant: ascmc[0],
        midheaven: ascmc[1],
        cusps: house_cusps,
        armc: ascmc[2],
        vertex: ascmc[3],
    })
}
