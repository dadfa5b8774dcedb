//! Matrix utilities for frame elements and girder-line solves

pub mod sparse;

use nalgebra::{DMatrix, Matrix3, SMatrix, SVector, Vector3};

// Re-export sparse utilities
pub use sparse::{
    inverse_permutation, reverse_cuthill_mckee, SparseCholeskySolver,
    SparseMatrixBuilder, DEFAULT_PIVOT_TOLERANCE,
};

pub type Mat = DMatrix<f64>;
pub type Mat3 = Matrix3<f64>;

/// 12x12 matrix for member stiffness
pub type Mat12 = SMatrix<f64, 12, 12>;
/// 12-element vector for member forces/displacements
pub type Vec12 = SVector<f64, 12>;

/// Compute the transformation matrix for a 3D frame element
///
/// Local x runs from the i-node to the j-node. For members that are not
/// vertical, local y is the upward normal in the vertical plane containing the
/// member, so a level girder has local y equal to global Y and local z equal to
/// global Z. Vertical members take local z = global Z.
///
/// # Arguments
/// * `i_node` - Start node coordinates [X, Y, Z]
/// * `j_node` - End node coordinates [X, Y, Z]
/// * `rotation` - Member rotation about its longitudinal axis (radians)
///
/// # Returns
/// 12x12 transformation matrix from global to local coordinates
pub fn member_transformation_matrix(i_node: &[f64; 3], j_node: &[f64; 3], rotation: f64) -> Mat12 {
    let d = Vector3::new(
        j_node[0] - i_node[0],
        j_node[1] - i_node[1],
        j_node[2] - i_node[2],
    );
    let length = d.norm();

    debug_assert!(length > 1e-10, "member length must be validated before assembly");

    let x = d / length;
    let up = Vector3::y();

    let (y, z) = if x.cross(&up).norm() < 1e-10 {
        // Vertical member
        let z = Vector3::z();
        (z.cross(&x), z)
    } else {
        let z = x.cross(&up).normalize();
        (z.cross(&x), z)
    };

    let (y, z) = if rotation.abs() > 1e-10 {
        let (s, c) = rotation.sin_cos();
        (y * c + z * s, z * c - y * s)
    } else {
        (y, z)
    };

    let r = Mat3::from_rows(&[x.transpose(), y.transpose(), z.transpose()]);

    let mut t = Mat12::zeros();
    for block in 0..4 {
        t.fixed_view_mut::<3, 3>(3 * block, 3 * block).copy_from(&r);
    }
    t
}

/// Compute the local stiffness matrix for a 3D frame element
///
/// # Arguments
/// * `e` - Modulus of elasticity
/// * `g` - Shear modulus
/// * `a` - Cross-sectional area
/// * `iy` - Moment of inertia about local y-axis
/// * `iz` - Moment of inertia about local z-axis
/// * `j` - Torsional constant
/// * `length` - Member length
/// * `phi_z` - Shear deformation parameter 12EIz/(GAvy L²) for bending about z;
///   zero gives the Euler-Bernoulli element
///
/// # Returns
/// 12x12 local stiffness matrix
#[allow(clippy::too_many_arguments)]
pub fn member_local_stiffness(
    e: f64,
    g: f64,
    a: f64,
    iy: f64,
    iz: f64,
    j: f64,
    length: f64,
    phi_z: f64,
) -> Mat12 {
    let l = length;
    let l2 = l * l;
    let l3 = l2 * l;

    let ea_l = e * a / l;
    let gj_l = g * j / l;

    let eiy_l3 = e * iy / l3;
    let eiy_l2 = e * iy / l2;
    let eiy_l = e * iy / l;

    let s = 1.0 / (1.0 + phi_z);
    let eiz_l3 = e * iz / l3 * s;
    let eiz_l2 = e * iz / l2 * s;
    let eiz_near = (4.0 + phi_z) * e * iz / l * s;
    let eiz_far = (2.0 - phi_z) * e * iz / l * s;

    #[rustfmt::skip]
    let data = [
        // Row 0: axial at i
        ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,          -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 1: shear Fy at i
        0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           6.0*eiz_l2,   0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           6.0*eiz_l2,
        // Row 2: shear Fz at i
        0.0,       0.0,          12.0*eiy_l3,   0.0,    -6.0*eiy_l2,   0.0,          0.0,       0.0,          -12.0*eiy_l3,  0.0,    -6.0*eiy_l2,   0.0,
        // Row 3: torsion at i
        0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,          0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,
        // Row 4: moment My at i
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    4.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    2.0*eiy_l,     0.0,
        // Row 5: moment Mz at i
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           eiz_near,     0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           eiz_far,
        // Row 6: axial at j
        -ea_l,     0.0,          0.0,           0.0,    0.0,           0.0,          ea_l,      0.0,          0.0,           0.0,    0.0,           0.0,
        // Row 7: shear Fy at j
        0.0,       -12.0*eiz_l3, 0.0,           0.0,    0.0,           -6.0*eiz_l2,  0.0,       12.0*eiz_l3,  0.0,           0.0,    0.0,           -6.0*eiz_l2,
        // Row 8: shear Fz at j
        0.0,       0.0,          -12.0*eiy_l3,  0.0,    6.0*eiy_l2,    0.0,          0.0,       0.0,          12.0*eiy_l3,   0.0,    6.0*eiy_l2,    0.0,
        // Row 9: torsion at j
        0.0,       0.0,          0.0,           -gj_l,  0.0,           0.0,          0.0,       0.0,          0.0,           gj_l,   0.0,           0.0,
        // Row 10: moment My at j
        0.0,       0.0,          -6.0*eiy_l2,   0.0,    2.0*eiy_l,     0.0,          0.0,       0.0,          6.0*eiy_l2,    0.0,    4.0*eiy_l,     0.0,
        // Row 11: moment Mz at j
        0.0,       6.0*eiz_l2,   0.0,           0.0,    0.0,           eiz_far,      0.0,       -6.0*eiz_l2,  0.0,           0.0,    0.0,           eiz_near,
    ];

    Mat12::from_row_slice(&data)
}

/// Compute fixed end reactions for a uniformly distributed load
///
/// # Arguments
/// * `w` - Load intensity (force per unit length)
/// * `length` - Member length
/// * `direction` - Load direction index (0=X, 1=Y, 2=Z in local coords)
pub fn fer_uniform_load(w: f64, length: f64, direction: usize) -> Vec12 {
    let l = length;
    let l2 = l * l;

    let mut fer = Vec12::zeros();

    match direction {
        0 => {
            // Axial load
            fer[0] = -w * l / 2.0;
            fer[6] = -w * l / 2.0;
        }
        1 => {
            // Load in local y direction
            fer[1] = -w * l / 2.0;
            fer[5] = -w * l2 / 12.0;
            fer[7] = -w * l / 2.0;
            fer[11] = w * l2 / 12.0;
        }
        2 => {
            // Load in local z direction
            fer[2] = -w * l / 2.0;
            fer[4] = w * l2 / 12.0;
            fer[8] = -w * l / 2.0;
            fer[10] = -w * l2 / 12.0;
        }
        _ => {}
    }

    fer
}

/// Transverse displacement inside a beam element from its end values using the
/// cubic Hermite shape functions.
///
/// `xi` is the normalized position (0 at i, 1 at j); `theta_i`/`theta_j` are the
/// end slopes.
pub fn hermite_deflection(v_i: f64, theta_i: f64, v_j: f64, theta_j: f64, length: f64, xi: f64) -> f64 {
    let xi2 = xi * xi;
    let xi3 = xi2 * xi;
    let n1 = 1.0 - 3.0 * xi2 + 2.0 * xi3;
    let n2 = xi - 2.0 * xi2 + xi3;
    let n3 = 3.0 * xi2 - 2.0 * xi3;
    let n4 = -xi2 + xi3;
    n1 * v_i + n2 * length * theta_i + n3 * v_j + n4 * length * theta_j
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_transformation_matrix_horizontal() {
        let i = [0.0, 0.0, 0.0];
        let j = [10.0, 0.0, 0.0];
        let t = member_transformation_matrix(&i, &j, 0.0);

        // Girder along +X: local axes coincide with global axes
        assert_relative_eq!(t[(0, 0)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(1, 1)], 1.0, epsilon = 1e-10);
        assert_relative_eq!(t[(2, 2)], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_transformation_matrix_vertical_is_orthonormal() {
        let t = member_transformation_matrix(&[0.0, 0.0, 0.0], &[0.0, 5.0, 0.0], 0.3);
        let r = t.fixed_view::<3, 3>(0, 0).into_owned();
        let identity = r * r.transpose();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(identity[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_local_stiffness_symmetry() {
        for phi in [0.0, 0.35] {
            let k = member_local_stiffness(4.0e5, 1.7e5, 3.9, 0.5, 6.0, 0.2, 12.0, phi);
            for i in 0..12 {
                for j in 0..12 {
                    assert_relative_eq!(k[(i, j)], k[(j, i)], epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_fer_uniform_simple_values() {
        let fer = fer_uniform_load(-2.0, 6.0, 1);
        assert_relative_eq!(fer[1], 6.0);
        assert_relative_eq!(fer[7], 6.0);
        assert_relative_eq!(fer[5], 6.0);
        assert_relative_eq!(fer[11], -6.0);
    }

    #[test]
    fn test_hermite_reproduces_end_values_and_cubic() {
        assert_relative_eq!(hermite_deflection(1.0, 0.3, -2.0, 0.1, 5.0, 0.0), 1.0);
        assert_relative_eq!(hermite_deflection(1.0, 0.3, -2.0, 0.1, 5.0, 1.0), -2.0);
        // v(x) = x^2 on [0, 2]: v_i = 0, v'_i = 0, v_j = 4, v'_j = 4
        assert_relative_eq!(hermite_deflection(0.0, 0.0, 4.0, 4.0, 2.0, 0.5), 1.0, epsilon = 1e-12);
    }
}
