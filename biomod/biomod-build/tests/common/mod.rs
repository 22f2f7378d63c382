//! Synthetic standing body shared by the integration tests.
//!
//! Every stacked solid is a uniform cylinder standing on the previous one.
//! Whole regions (`P`, `A2`, `J1`, ...) are composed from their solids, so
//! the snapshot is internally consistent. The body faces +y with its left
//! side on +x; the left leg is slightly heavier so nothing is symmetric by
//! accident.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use biomod_build::{BodySnapshot, Chain, Region, RegionProperties, Side};
use biomod_types::{combine, MassProperties};
use nalgebra::{Matrix3, Vector3};

/// Knobs for the fixture.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    /// Uniform length scale.
    pub scale: f64,
    /// Rigid translation of the whole body.
    pub offset: Vector3<f64>,
    /// Extra mass on every left-leg solid.
    pub left_leg_extra: f64,
}

impl Default for Shape {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Vector3::zeros(),
            left_leg_extra: 0.05,
        }
    }
}

fn cylinder(mass: f64, position: Vector3<f64>, axis: Vector3<f64>, height: f64) -> RegionProperties {
    let radius = 0.05;
    let along = mass * radius * radius / 2.0;
    let across = mass * (3.0 * radius * radius + height * height) / 12.0;
    RegionProperties::new(
        mass,
        position,
        axis * (height / 2.0),
        Matrix3::from_diagonal(&Vector3::new(across, across, along)),
    )
    .with_end_position(position + axis * height)
    .with_height(height)
}

/// Compose solids into one region placed at the first solid's position.
fn whole(solids: &[RegionProperties]) -> RegionProperties {
    let parts: Vec<MassProperties> = solids.iter().map(RegionProperties::mass_properties).collect();
    let composed = combine(&parts).expect("positive masses").properties;
    let first = solids[0];
    let last = solids[solids.len() - 1];
    RegionProperties::new(
        composed.mass,
        first.position,
        composed.center_of_mass - first.position,
        composed.inertia,
    )
    .with_end_position(last.end_position.expect("solids have ends"))
    .with_height(solids.iter().filter_map(|s| s.height).sum())
}

/// Stack solids along `axis` from `start`; `(mass, height)` per solid.
fn stack(start: Vector3<f64>, axis: Vector3<f64>, spec: &[(f64, f64)], scale: f64) -> Vec<RegionProperties> {
    let mut position = start;
    spec.iter()
        .map(|&(mass, height)| {
            let solid = cylinder(mass, position, axis, height * scale);
            position += axis * (height * scale);
            solid
        })
        .collect()
}

const TORSO: [(f64, f64); 8] = [
    (6.0, 0.10),
    (5.0, 0.12),
    (6.5, 0.12),
    (8.0, 0.15),
    (2.0, 0.05),
    (3.0, 0.10),
    (1.2, 0.08),
    (0.8, 0.08),
];
const ARM: [(f64, f64); 7] = [
    (1.0, 0.14),
    (0.9, 0.14),
    (0.8, 0.12),
    (0.5, 0.12),
    (0.2, 0.04),
    (0.15, 0.05),
    (0.1, 0.08),
];
const LEG: [(f64, f64); 9] = [
    (3.0, 0.08),
    (4.0, 0.16),
    (2.5, 0.18),
    (2.0, 0.20),
    (1.1, 0.22),
    (0.3, 0.03),
    (0.25, 0.03),
    (0.2, 0.03),
    (0.1, 0.03),
];

/// Build the standing body.
pub fn standing_body(shape: Shape) -> BodySnapshot {
    let s = shape.scale;
    let up = Vector3::z();
    let down = -Vector3::z();
    let mut body = BodySnapshot::new();

    let hip = Vector3::new(0.0, 0.0, 0.9 * s) + shape.offset;
    let torso = stack(hip, up, &TORSO, s);
    for (i, solid) in torso.iter().enumerate() {
        body.insert(Region::solid(Chain::Torso, i as u8).expect("index"), *solid);
    }
    body.insert(Region::Pelvis, whole(&torso[0..2]));
    body.insert(Region::Thorax, whole(&torso[2..3]));
    body.insert(Region::ChestHead, whole(&torso[3..8]));

    // Shoulder joint centre sits at the top of s3.
    let shoulder_z = torso[3].end_position.expect("end").z;
    for side in [Side::Left, Side::Right] {
        let x = s * if side == Side::Left { 0.2 } else { -0.2 };
        let arm = stack(Vector3::new(x + shape.offset.x, shape.offset.y, shoulder_z), down, &ARM, s);
        for (i, solid) in arm.iter().enumerate() {
            body.insert(Region::solid(Chain::Arm(side), i as u8).expect("index"), *solid);
        }
        body.insert(Region::UpperArm(side), whole(&arm[0..2]));
        body.insert(Region::ForearmHand(side), whole(&arm[2..7]));
    }

    for side in [Side::Left, Side::Right] {
        let x = s * if side == Side::Left { 0.1 } else { -0.1 };
        let extra = if side == Side::Left { shape.left_leg_extra } else { 0.0 };
        let spec: Vec<(f64, f64)> = LEG.iter().map(|&(m, h)| (m + extra, h)).collect();
        let mut leg = stack(hip + Vector3::new(x, 0.0, 0.0), down, &spec[0..5], s);
        // The foot runs forward from the ankle.
        let ankle = leg[4].end_position.expect("end");
        leg.extend(stack(ankle, Vector3::y(), &spec[5..9], s));
        for (i, solid) in leg.iter().enumerate() {
            body.insert(Region::solid(Chain::Leg(side), i as u8).expect("index"), *solid);
        }
        body.insert(Region::Thigh(side), whole(&leg[0..3]));
        let mut shank_foot = whole(&leg[3..9]);
        // Limb direction of J2/K2 follows the shank.
        shank_foot.end_position = leg[4].end_position;
        body.insert(Region::ShankFoot(side), shank_foot);
    }

    body
}

/// Sum of every solid's mass, which every layout must reproduce.
pub fn total_solid_mass(body: &BodySnapshot) -> f64 {
    body.iter()
        .filter(|(region, _)| matches!(region, Region::Solid(..)))
        .map(|(_, p)| p.mass)
        .sum()
}
