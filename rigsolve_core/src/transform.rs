// Copyright 2026 the Rigsolve Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Affine transform helpers on top of `glam`'s double-precision types.
//!
//! All matrices are column-major and act on column vectors: `parent * local`
//! maps a point from the local frame into the parent frame. Column `i` of a
//! transform is the image of axis `i`, and column 3 is the translation.
//!
//! Euler angles are XYZ angles applied X first, then Y, then Z, so that
//! `euler_to_mat3(e) == Rz(e.z) * Ry(e.y) * Rx(e.x)`.

use glam::{DMat3, DMat4, DQuat, DVec3, DVec4};
#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

/// Threshold below which a vector length is treated as zero.
pub const EPSILON: f64 = 1.0e-9;

/// Extension methods for reading and writing parts of a [`DMat4`].
pub trait MatrixExt {
    /// Column lengths of the upper 3×3 block (the per-axis scale).
    fn size(&self) -> DVec3;
    /// The translation column.
    fn translation(&self) -> DVec3;
    /// Replaces the translation column.
    fn set_translation(&mut self, t: DVec3);
    /// The direction of axis `i` (column `i`, without `w`).
    fn axis(&self, i: usize) -> DVec3;
    /// Replaces the direction of axis `i`, leaving `w` untouched.
    fn set_axis(&mut self, i: usize, v: DVec3);
    /// Upper 3×3 block with each column normalized.
    fn normalized_rotation(&self) -> DMat3;
    /// XYZ Euler angles of the normalized rotation block.
    fn euler(&self) -> DVec3;
}

impl MatrixExt for DMat4 {
    fn size(&self) -> DVec3 {
        DVec3::new(
            self.x_axis.truncate().length(),
            self.y_axis.truncate().length(),
            self.z_axis.truncate().length(),
        )
    }

    fn translation(&self) -> DVec3 {
        self.w_axis.truncate()
    }

    fn set_translation(&mut self, t: DVec3) {
        self.w_axis = t.extend(self.w_axis.w);
    }

    fn axis(&self, i: usize) -> DVec3 {
        self.col(i).truncate()
    }

    fn set_axis(&mut self, i: usize, v: DVec3) {
        let col = self.col_mut(i);
        *col = v.extend(col.w);
    }

    fn normalized_rotation(&self) -> DMat3 {
        let unit = [DVec3::X, DVec3::Y, DVec3::Z];
        let mut cols = [DVec3::ZERO; 3];
        for (i, col) in cols.iter_mut().enumerate() {
            let a = self.axis(i);
            let len = a.length();
            *col = if len > EPSILON { a / len } else { unit[i] };
        }
        DMat3::from_cols(cols[0], cols[1], cols[2])
    }

    fn euler(&self) -> DVec3 {
        mat3_to_euler(&self.normalized_rotation())
    }
}

/// Builds a rotation from XYZ Euler angles.
#[must_use]
pub fn euler_to_mat3(e: DVec3) -> DMat3 {
    DMat3::from_rotation_z(e.z) * DMat3::from_rotation_y(e.y) * DMat3::from_rotation_x(e.x)
}

/// Extracts XYZ Euler angles from an orthonormal rotation.
///
/// Two angle triples describe every rotation; the one with the smaller sum of
/// absolute angles is returned.
#[must_use]
pub fn mat3_to_euler(m: &DMat3) -> DVec3 {
    let (x, y, z) = (m.x_axis, m.y_axis, m.z_axis);
    let cy = (x.x * x.x + x.y * x.y).sqrt();
    if cy > 16.0 * f64::from(f32::EPSILON) {
        let a = DVec3::new(
            y.z.atan2(z.z),
            (-x.z).atan2(cy),
            x.y.atan2(x.x),
        );
        let b = DVec3::new(
            (-y.z).atan2(-z.z),
            (-x.z).atan2(-cy),
            (-x.y).atan2(-x.x),
        );
        let sum = |e: DVec3| e.x.abs() + e.y.abs() + e.z.abs();
        if sum(a) > sum(b) { b } else { a }
    } else {
        DVec3::new((-z.y).atan2(y.y), (-x.z).atan2(cy), 0.0)
    }
}

/// Composes `T(loc) * R(euler) * S(size)`.
#[must_use]
pub fn loc_euler_size(loc: DVec3, euler: DVec3, size: DVec3) -> DMat4 {
    compose(loc, euler_to_mat3(euler), size)
}

/// Composes `T(loc) * R(quat) * S(size)`.
#[must_use]
pub fn loc_quat_size(loc: DVec3, quat: DQuat, size: DVec3) -> DMat4 {
    compose(loc, DMat3::from_quat(quat.normalize()), size)
}

fn compose(loc: DVec3, rot: DMat3, size: DVec3) -> DMat4 {
    DMat4::from_cols(
        (rot.x_axis * size.x).extend(0.0),
        (rot.y_axis * size.y).extend(0.0),
        (rot.z_axis * size.z).extend(0.0),
        loc.extend(1.0),
    )
}

/// Builds a 4×4 matrix from a 3×3 block with zero translation.
#[must_use]
pub fn mat4_from_mat3(m: &DMat3) -> DMat4 {
    DMat4::from_cols(
        m.x_axis.extend(0.0),
        m.y_axis.extend(0.0),
        m.z_axis.extend(0.0),
        DVec4::W,
    )
}

/// Splits a transform into translation, rotation, and positive per-axis size.
#[must_use]
pub fn decompose(m: &DMat4) -> (DVec3, DQuat, DVec3) {
    let rot = m.normalized_rotation();
    (m.translation(), DQuat::from_mat3(&rot).normalize(), m.size())
}

/// Interpolates two transforms component-wise.
///
/// Translation and size are lerped and rotation is slerped, so `t == 0`
/// yields `a` and `t == 1` yields `b` (up to decomposition precision).
#[must_use]
pub fn blend(a: &DMat4, b: &DMat4, t: f64) -> DMat4 {
    let (aloc, arot, asize) = decompose(a);
    let (bloc, brot, bsize) = decompose(b);
    loc_quat_size(aloc.lerp(bloc, t), arot.slerp(brot, t), asize.lerp(bsize, t))
}

/// Makes `euler` numerically close to `previous` by shifting whole turns.
///
/// Differences larger than about 292 degrees are reduced by full turns first.
/// Afterwards, if exactly one axis still differs by more than 180 degrees
/// while the other two are small, that axis is shifted once more.
#[must_use]
pub fn compatible_euler(euler: DVec3, previous: DVec3) -> DVec3 {
    const TURN: f64 = core::f64::consts::TAU;
    let mut e = euler;
    let mut d = DVec3::ZERO;
    for i in 0..3 {
        d[i] = e[i] - previous[i];
        while d[i].abs() > 5.1 {
            e[i] += if d[i] > 0.0 { -TURN } else { TURN };
            d[i] = e[i] - previous[i];
        }
    }
    for i in 0..3 {
        let (j, k) = ((i + 1) % 3, (i + 2) % 3);
        if d[i].abs() > 3.2 && d[j].abs() < 1.6 && d[k].abs() < 1.6 {
            e[i] += if d[i] > 0.0 { -TURN } else { TURN };
        }
    }
    e
}

/// Rotates Euler angles by `angle` about the local `axis` (0, 1, or 2).
#[must_use]
pub fn euler_rotate(euler: DVec3, angle: f64, axis: usize) -> DVec3 {
    let mut step = DVec3::ZERO;
    step[axis] = angle;
    mat3_to_euler(&(euler_to_mat3(euler) * euler_to_mat3(step)))
}

/// Projects `v` onto `onto`. Returns zero when `onto` is degenerate.
#[must_use]
pub fn project(v: DVec3, onto: DVec3) -> DVec3 {
    let len2 = onto.length_squared();
    if len2 <= EPSILON * EPSILON {
        DVec3::ZERO
    } else {
        onto * (v.dot(onto) / len2)
    }
}

/// The axis of a transform that a tracking rule points somewhere.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TrackAxis {
    /// Positive X.
    X = 0,
    /// Positive Y.
    #[default]
    Y = 1,
    /// Positive Z.
    Z = 2,
    /// Negative X.
    NegX = 3,
    /// Negative Y.
    NegY = 4,
    /// Negative Z.
    NegZ = 5,
}

impl TrackAxis {
    /// Axis index in `0..3`, ignoring the sign.
    #[must_use]
    pub const fn index(self) -> usize {
        (self as usize) % 3
    }

    /// Whether the axis points along the negative direction.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        (self as u8) > 2
    }

    /// Decodes a raw axis tag, clamping unknown values to positive Z.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::X,
            1 => Self::Y,
            3 => Self::NegX,
            4 => Self::NegY,
            5 => Self::NegZ,
            _ => Self::Z,
        }
    }
}

/// A positive axis used as the "up" or "lock" axis of a tracking rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UpAxis {
    /// X.
    X = 0,
    /// Y.
    Y = 1,
    /// Z.
    #[default]
    Z = 2,
}

impl UpAxis {
    /// Axis index in `0..3`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Builds a rotation whose `track` axis points opposite to `vec`, with the
/// `up` axis as close as possible to `up_ref`.
///
/// `vec` is usually `owner - target`, so a positive track axis ends up
/// pointing at the target. Returns identity when `track` and `up` name the
/// same axis.
#[must_use]
pub fn track_basis(vec: DVec3, up_ref: DVec3, track: TrackAxis, up: UpAxis) -> DMat3 {
    let mut n = vec.normalize_or_zero();
    if n == DVec3::ZERO {
        n = DVec3::Z;
    }
    if !track.is_negative() {
        n = -n;
    }

    let mut proj = (up_ref - project(up_ref, n)).normalize_or_zero();
    if proj == DVec3::ZERO {
        proj = DVec3::Y;
    }
    let right = proj.cross(n).normalize_or_zero();

    let axis = track.index();
    let up = up.index();
    if axis == up {
        return DMat3::IDENTITY;
    }
    let sign = if (axis + 1) % 3 == up { -1.0 } else { 1.0 };
    let mut cols = [DVec3::ZERO; 3];
    cols[3 - axis - up] = right * sign;
    cols[up] = proj;
    cols[axis] = n;
    DMat3::from_cols(cols[0], cols[1], cols[2])
}

/// Rotation pointing `track` along `dir` with `up` towards world Z.
#[must_use]
pub fn track_quat(dir: DVec3, track: TrackAxis, up: UpAxis) -> DQuat {
    DQuat::from_mat3(&track_basis(-dir, DVec3::Z, track, up)).normalize()
}

/// Rotation aligning `from` with `to` along the shortest arc.
#[must_use]
pub fn rotation_between(from: DVec3, to: DVec3) -> DMat3 {
    let a = from.normalize_or_zero();
    let b = to.normalize_or_zero();
    if a == DVec3::ZERO || b == DVec3::ZERO {
        return DMat3::IDENTITY;
    }
    DMat3::from_quat(DQuat::from_rotation_arc(a, b))
}

/// Approximate equality for matrices, used by tests and change detection.
#[must_use]
pub fn approx_eq(a: &DMat4, b: &DMat4, eps: f64) -> bool {
    a.abs_diff_eq(*b, eps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const EPS: f64 = 1e-9;

    fn vec_close(a: DVec3, b: DVec3, eps: f64) -> bool {
        (a - b).abs().max_element() < eps
    }

    #[test]
    fn size_reads_column_lengths() {
        let m = loc_euler_size(DVec3::new(1.0, 2.0, 3.0), DVec3::new(0.3, -0.2, 1.1), DVec3::new(2.0, 3.0, 4.0));
        assert!(vec_close(m.size(), DVec3::new(2.0, 3.0, 4.0), EPS), "{:?}", m.size());
        assert!(vec_close(m.translation(), DVec3::new(1.0, 2.0, 3.0), EPS));
    }

    #[test]
    fn euler_round_trip() {
        let e = DVec3::new(0.4, -0.7, 1.2);
        let back = mat3_to_euler(&euler_to_mat3(e));
        assert!(vec_close(back, e, 1e-9), "{back:?}");
    }

    #[test]
    fn euler_applies_x_first() {
        // X then Z: the Y axis goes to Z, then stays on Z.
        let m = euler_to_mat3(DVec3::new(FRAC_PI_2, 0.0, FRAC_PI_2));
        assert!(vec_close(m * DVec3::Y, DVec3::Z, EPS));
        // X axis is untouched by the X rotation and then rotated onto Y.
        assert!(vec_close(m * DVec3::X, DVec3::Y, EPS));
    }

    #[test]
    fn euler_gimbal_lock_has_zero_z() {
        let e = mat3_to_euler(&euler_to_mat3(DVec3::new(0.3, FRAC_PI_2, 0.0)));
        assert!((e.y - FRAC_PI_2).abs() < 1e-6, "{e:?}");
        assert!(e.z.abs() < EPS);
    }

    #[test]
    fn compatible_euler_removes_full_turns() {
        let e = compatible_euler(DVec3::new(2.0 * PI + 0.1, 0.0, 0.0), DVec3::ZERO);
        assert!(vec_close(e, DVec3::new(0.1, 0.0, 0.0), EPS));
    }

    #[test]
    fn compatible_euler_flips_single_axis() {
        let e = compatible_euler(DVec3::new(3.5, 0.1, 0.0), DVec3::ZERO);
        assert!((e.x - (3.5 - 2.0 * PI)).abs() < EPS);
        assert!((e.y - 0.1).abs() < EPS);
    }

    #[test]
    fn blend_endpoints() {
        let a = loc_euler_size(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO, DVec3::ONE);
        let b = loc_euler_size(DVec3::new(3.0, 2.0, 0.0), DVec3::new(0.0, 0.0, FRAC_PI_2), DVec3::splat(2.0));
        assert!(approx_eq(&blend(&a, &b, 0.0), &a, 1e-9));
        assert!(approx_eq(&blend(&a, &b, 1.0), &b, 1e-9));
    }

    #[test]
    fn blend_halfway() {
        let a = DMat4::IDENTITY;
        let b = loc_euler_size(DVec3::new(2.0, 0.0, 0.0), DVec3::new(0.0, 0.0, FRAC_PI_2), DVec3::splat(3.0));
        let m = blend(&a, &b, 0.5);
        assert!(vec_close(m.translation(), DVec3::new(1.0, 0.0, 0.0), EPS));
        assert!(vec_close(m.size(), DVec3::splat(2.0), EPS));
        assert!((m.euler().z - FRAC_PI_4).abs() < 1e-9);
    }

    #[test]
    fn track_basis_points_positive_y_at_target() {
        // Owner at origin, target at +X.
        let r = track_basis(DVec3::new(-1.0, 0.0, 0.0), DVec3::Z, TrackAxis::Y, UpAxis::Z);
        assert!(vec_close(r.y_axis, DVec3::X, EPS), "{r:?}");
        assert!(vec_close(r.z_axis, DVec3::Z, EPS));
        assert!((r.determinant() - 1.0).abs() < EPS, "frame must stay right-handed");
    }

    #[test]
    fn track_basis_negative_axis_points_away() {
        let r = track_basis(DVec3::new(-1.0, 0.0, 0.0), DVec3::Z, TrackAxis::NegY, UpAxis::Z);
        assert!(vec_close(r.y_axis, -DVec3::X, EPS), "{r:?}");
        assert!((r.determinant() - 1.0).abs() < EPS);
    }

    #[test]
    fn track_basis_same_axes_is_identity() {
        let r = track_basis(DVec3::X, DVec3::Z, TrackAxis::Z, UpAxis::Z);
        assert_eq!(r, DMat3::IDENTITY);
    }

    #[test]
    fn track_quat_follows_direction() {
        let q = track_quat(DVec3::new(0.0, 0.0, 1.0), TrackAxis::X, UpAxis::Y);
        assert!(vec_close(q * DVec3::X, DVec3::Z, 1e-9));
    }

    #[test]
    fn axis_accessors() {
        let mut m = DMat4::IDENTITY;
        m.set_axis(1, DVec3::new(0.0, 2.0, 0.0));
        m.set_translation(DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(m.axis(1), DVec3::new(0.0, 2.0, 0.0));
        assert_eq!(m.w_axis.w, 1.0);
        assert_eq!(m.translation(), DVec3::new(4.0, 5.0, 6.0));
    }
}
