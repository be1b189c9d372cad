//! Sun position from two angles.

use cgmath::{Deg, InnerSpace, Rad, Vector3};

/// Sun placement in degrees: `elevation` above the horizon and `azimuth`
/// around the up axis, measured from +Z towards +X.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SunParameters {
    pub elevation: f32,
    pub azimuth: f32,
}

impl Default for SunParameters {
    fn default() -> Self {
        Self {
            elevation: 2.0,
            azimuth: 130.0,
        }
    }
}

impl SunParameters {
    /// The polar angle measured from the up axis.
    pub fn phi(&self) -> Rad<f32> {
        Deg(90.0 - self.elevation).into()
    }

    pub fn theta(&self) -> Rad<f32> {
        Deg(self.azimuth).into()
    }

    /// Unit vector pointing from the origin towards the sun.
    pub fn direction(&self) -> Vector3<f32> {
        from_spherical(1.0, self.phi(), self.theta())
    }
}

/// Spherical to Cartesian with Y up: `phi` from +Y, `theta` around Y from +Z.
pub fn from_spherical(radius: f32, phi: Rad<f32>, theta: Rad<f32>) -> Vector3<f32> {
    let sin_phi_radius = phi.0.sin() * radius;
    Vector3::new(
        sin_phi_radius * theta.0.sin(),
        phi.0.cos() * radius,
        sin_phi_radius * theta.0.cos(),
    )
}

/// Inverse of [`from_spherical`]: returns `(radius, phi, theta)`.
pub fn to_spherical(v: Vector3<f32>) -> (f32, Rad<f32>, Rad<f32>) {
    let radius = v.magnitude();
    if radius == 0.0 {
        return (0.0, Rad(0.0), Rad(0.0));
    }
    let theta = v.x.atan2(v.z);
    let phi = (v.y / radius).clamp(-1.0, 1.0).acos();
    (radius, Rad(phi), Rad(theta))
}
