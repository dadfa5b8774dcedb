//! Read-only reference data: rating vehicles, girder shapes and materials
//!
//! A catalog is built once and shared by reference between analyses. Nothing
//! in the core writes to it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::elements::Material;
use crate::error::{BridgeError, BridgeResult};
use crate::girder::{standard_shapes, GirderShape};
use crate::vehicle::{AxleSpacing, LaneLoadMode, Vehicle};

/// HL-93 design lane load (kip/ft)
pub const DESIGN_LANE_LOAD: f64 = 0.64;

/// Vehicles, shapes and materials keyed by identifier
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub vehicles: BTreeMap<String, Vehicle>,
    pub shapes: BTreeMap<String, GirderShape>,
    pub materials: BTreeMap<String, Material>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// AASHTO design and legal vehicles, standard girder shapes and the
    /// common concrete and strand grades
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        for vehicle in standard_vehicles() {
            catalog.add_vehicle(vehicle);
        }
        for shape in standard_shapes() {
            catalog.add_shape(shape);
        }
        for (id, material) in [
            ("C5", Material::concrete(5.0, 4.0, 0.150)),
            ("C6", Material::concrete(6.0, 4.5, 0.150)),
            ("C8", Material::concrete(8.0, 6.0, 0.150)),
            ("C10", Material::concrete(10.0, 7.5, 0.155)),
            ("STRAND-270", Material::strand_270()),
        ] {
            catalog.materials.insert(id.to_string(), material);
        }
        catalog
    }

    pub fn add_vehicle(&mut self, vehicle: Vehicle) {
        self.vehicles.insert(vehicle.id.clone(), vehicle);
    }

    pub fn add_shape(&mut self, shape: GirderShape) {
        self.shapes.insert(shape.id.clone(), shape);
    }

    pub fn vehicle(&self, id: &str) -> BridgeResult<&Vehicle> {
        self.vehicles
            .get(id)
            .ok_or_else(|| BridgeError::VehicleNotFound(id.to_string()))
    }

    /// Look up several vehicles, failing on the first unknown identifier
    pub fn vehicles<S: AsRef<str>>(&self, ids: &[S]) -> BridgeResult<Vec<&Vehicle>> {
        ids.iter().map(|id| self.vehicle(id.as_ref())).collect()
    }

    pub fn shape(&self, id: &str) -> BridgeResult<&GirderShape> {
        self.shapes
            .get(id)
            .ok_or_else(|| BridgeError::GirderNotFound(id.to_string()))
    }

    pub fn material(&self, id: &str) -> BridgeResult<&Material> {
        self.materials
            .get(id)
            .ok_or_else(|| BridgeError::MaterialNotFound(id.to_string()))
    }
}

/// Design and legal rating vehicles (kip, ft)
pub fn standard_vehicles() -> Vec<Vehicle> {
    let truck_spacings = [AxleSpacing::fixed(14.0), AxleSpacing::variable(14.0, 30.0)];
    vec![
        Vehicle::new("HL93", "HL-93 design truck + lane", &[8.0, 32.0, 32.0], &truck_spacings)
            .with_lane(DESIGN_LANE_LOAD, LaneLoadMode::AdverseRegions),
        Vehicle::new(
            "HL93-TANDEM",
            "HL-93 design tandem + lane",
            &[25.0, 25.0],
            &[AxleSpacing::fixed(4.0)],
        )
        .with_lane(DESIGN_LANE_LOAD, LaneLoadMode::AdverseRegions),
        Vehicle::new("HS20", "HS20-44 truck", &[8.0, 32.0, 32.0], &truck_spacings),
        Vehicle::new(
            "TYPE3",
            "AASHTO Type 3",
            &[16.0, 17.0, 17.0],
            &[AxleSpacing::fixed(15.0), AxleSpacing::fixed(4.0)],
        ),
        Vehicle::new(
            "TYPE3S2",
            "AASHTO Type 3S2",
            &[10.0, 15.5, 15.5, 15.5, 15.5],
            &[
                AxleSpacing::fixed(11.0),
                AxleSpacing::fixed(4.0),
                AxleSpacing::fixed(22.0),
                AxleSpacing::fixed(4.0),
            ],
        ),
        Vehicle::new(
            "TYPE3-3",
            "AASHTO Type 3-3",
            &[12.0, 12.0, 12.0, 16.0, 14.0, 14.0],
            &[
                AxleSpacing::fixed(15.0),
                AxleSpacing::fixed(4.0),
                AxleSpacing::fixed(15.0),
                AxleSpacing::fixed(16.0),
                AxleSpacing::fixed(4.0),
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_lookups() {
        let catalog = Catalog::standard();
        for vehicle in catalog.vehicles.values() {
            vehicle.validate().unwrap();
        }
        assert_eq!(catalog.vehicle("TYPE3S2").unwrap().weight(), 72.0);
        assert_eq!(catalog.vehicle("TYPE3-3").unwrap().weight(), 80.0);
        assert_eq!(catalog.vehicle("TYPE3").unwrap().weight(), 50.0);
        assert!(catalog.shape("AASHTO-IV").is_ok());
        assert!(catalog.material("STRAND-270").is_ok());

        assert!(matches!(catalog.vehicle("HS25"), Err(BridgeError::VehicleNotFound(_))));
        assert!(matches!(catalog.shape("W36x150"), Err(BridgeError::GirderNotFound(_))));
        assert!(catalog.vehicles(&["HL93", "NOPE"]).is_err());
    }
}
