use gsw as gsw_teos10;

use crate::error::AppError;

/// Reference Salinity (g/kg) from Practical Salinity, standing in for
/// Absolute Salinity of standard seawater.
pub fn sa_from_sp(sp: f64) -> f64 {
    gsw_teos10::conversions::sr_from_sp(sp)
}

/// Density (kg/m³) of seawater at the sea surface (0 dbar).
///
/// # Arguments
/// * `sp` - Practical Salinity
/// * `temp` - Temperature [°C]
///
/// At 0 dbar potential temperature equals in-situ temperature, and
/// Conservative Temperature is approximated by it, as is usual for
/// benchtop titrations.
pub fn rho_surface(sp: f64, temp: f64) -> Result<f64, AppError> {
    let sa = sa_from_sp(sp);
    let rho = gsw_teos10::volume::rho(sa, temp, 0.0).unwrap_or(f64::NAN);
    if rho.is_finite() && rho > 0.0 {
        Ok(rho)
    } else {
        Err(AppError::invalid(format!(
            "TEOS-10 density undefined for SP={sp}, t={temp} °C"
        )))
    }
}

/// Mass (kg) of an analyte volume given in mL.
pub fn analyte_mass_from_volume(volume_ml: f64, sp: f64, temp: f64) -> Result<f64, AppError> {
    if !volume_ml.is_finite() || volume_ml <= 0.0 {
        return Err(AppError::invalid(format!(
            "analyte_volume must be > 0 mL, got {volume_ml}"
        )));
    }
    Ok(volume_ml * 1e-6 * rho_surface(sp, temp)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_seawater_density_is_plausible() {
        let rho = rho_surface(35.0, 25.0).unwrap();
        assert!((1020.0..1027.0).contains(&rho), "rho {rho}");
    }

    #[test]
    fn volume_converts_to_slightly_more_than_water_mass() {
        let mass = analyte_mass_from_volume(200.0, 35.0, 25.0).unwrap();
        assert!(mass > 0.204 && mass < 0.206, "mass {mass}");
        assert!(analyte_mass_from_volume(-1.0, 35.0, 25.0).is_err());
    }
}
