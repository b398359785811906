// Copyright 2026 The multipolar authors
//
// Licensed under the Apache license, version 2.0 (the "license");
// you may not use this file except in compliance with the license.
// You may obtain a copy of the license at
//
//     http://www.apache.org/licenses/license-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the license is distributed on an "as is" basis,
// without warranties or conditions of any kind, either express or implied.
// See the license for the specific language governing permissions and
// limitations under the license.

//! Real-space multipole pair interactions.
//!
//! The interaction of two multipole sites is assembled from radial ladder
//! coefficients `B_n` (see [`crate::kernels`]) times graded contractions of
//! the two moment sets: contract `k` tensor slots between the sites and
//! the rest with the separation vector. For traceless moments this yields,
//! per rank pair `(lᵢ, lⱼ)`,
//!
//! `Mᵢ·T⁽ⁿ⁾·Mⱼ = (−1)ⁿ Σ_k (−1)ᵏ B_{n−k} · N(lᵢ,lⱼ,k) · C_k`
//!
//! with `n = lᵢ+lⱼ` and combinatorial weights `N = C(lᵢ,k)C(lⱼ,k)k!`.
//! Because every ladder obeys `B_{n+1} = −B_n′/r`, forces are shifts along
//! the ladder, and torques are the rotational gradients of the same
//! contractions. One routine therefore serves every kernel family:
//! plain, Ewald real-space, Thole-damped and their corrections.
//!
//! All quantities here are in bare units of e²/nm; the Coulomb prefactor
//! is applied by the caller.

use crate::kernels::NB;
use crate::tensor::{axial, Symmetric2, Symmetric3};
use crate::Point;

/// Global-frame moments of one site.
#[derive(Clone, Copy, Debug, Default)]
pub struct Moments {
    pub q: f64,
    pub d: Point,
    pub quad: Symmetric2,
    pub oct: Symmetric3,
}

impl Moments {
    pub fn dipole(d: Point) -> Self {
        Self {
            d,
            ..Default::default()
        }
    }

    fn has_quad(&self) -> bool {
        !self.quad.is_zero()
    }

    fn has_oct(&self) -> bool {
        !self.oct.is_zero()
    }
}

/// Energy, force and torques of one pair interaction.
///
/// `force` acts on site i; site j receives the opposite force. Torques are
/// about each site's own position.
#[derive(Clone, Copy, Debug, Default)]
pub struct PairInteraction {
    pub energy: f64,
    pub force: Point,
    pub torque_i: Point,
    pub torque_j: Point,
}

/// Full multipole-multipole interaction for separation `r = r_i − r_j`.
pub fn multipole_pair(mi: &Moments, mj: &Moments, r: &Point, b: &[f64; NB]) -> PairInteraction {
    let mut energy = 0.0;
    let mut force = Point::zeros();
    let mut wi_sum = Point::zeros();
    let mut wj_sum = Point::zeros();

    // one interaction term c·B_m·C: energy, ladder-shifted force and the
    // rotational gradients of C with respect to each site's moments
    let mut add = |c: f64, m: usize, cval: f64, grad: Point, wi: Point, wj: Point| {
        energy += c * b[m] * cval;
        force += (r * (b[m + 1] * cval) - grad * b[m]) * c;
        wi_sum += wi * (c * b[m]);
        wj_sum += wj * (c * b[m]);
    };

    let zero = Point::zeros();
    let do_quad = mi.has_quad() || mj.has_quad();
    let do_oct = mi.has_oct() || mj.has_oct();

    // charge-charge
    add(1.0, 0, mi.q * mj.q, zero, zero, zero);

    // dipole blocks
    let dri = mi.d.dot(r);
    let drj = mj.d.dot(r);
    add(1.0, 1, mi.q * drj, mj.d * mi.q, zero, mj.d.cross(r) * mi.q);
    add(-1.0, 1, mj.q * dri, mi.d * mj.q, mi.d.cross(r) * mj.q, zero);
    add(
        1.0,
        1,
        mi.d.dot(&mj.d),
        zero,
        mi.d.cross(&mj.d),
        mj.d.cross(&mi.d),
    );
    add(
        -1.0,
        2,
        dri * drj,
        mi.d * drj + mj.d * dri,
        mi.d.cross(r) * drj,
        mj.d.cross(r) * dri,
    );

    // intermediates shared by the quadrupole and mixed blocks
    let qir = mi.quad.dot_vec(r);
    let qjr = mj.quad.dot_vec(r);
    let rqir = qir.dot(r);
    let rqjr = qjr.dot(r);

    if do_quad {
        // charge – quadrupole
        add(
            1.0 / 3.0,
            2,
            mi.q * rqjr,
            qjr * (2.0 * mi.q),
            zero,
            qjr.cross(r) * (2.0 * mi.q),
        );
        add(
            1.0 / 3.0,
            2,
            mj.q * rqir,
            qir * (2.0 * mj.q),
            qir.cross(r) * (2.0 * mj.q),
            zero,
        );

        // dipole – quadrupole
        add(
            -1.0 / 3.0,
            3,
            dri * rqjr,
            mi.d * rqjr + qjr * (2.0 * dri),
            mi.d.cross(r) * rqjr,
            qjr.cross(r) * (2.0 * dri),
        );
        let qjdi = mj.quad.dot_vec(&mi.d);
        add(
            2.0 / 3.0,
            2,
            mi.d.dot(&qjr),
            qjdi,
            mi.d.cross(&qjr),
            qjr.cross(&mi.d) + qjdi.cross(r),
        );
        add(
            1.0 / 3.0,
            3,
            rqir * drj,
            qir * (2.0 * drj) + mj.d * rqir,
            qir.cross(r) * (2.0 * drj),
            mj.d.cross(r) * rqir,
        );
        let qidj = mi.quad.dot_vec(&mj.d);
        add(
            -2.0 / 3.0,
            2,
            mj.d.dot(&qir),
            qidj,
            qir.cross(&mj.d) + qidj.cross(r),
            mj.d.cross(&qir),
        );

        // quadrupole – quadrupole
        if mi.has_quad() && mj.has_quad() {
            add(
                1.0 / 9.0,
                4,
                rqir * rqjr,
                qir * (2.0 * rqjr) + qjr * (2.0 * rqir),
                qir.cross(r) * (2.0 * rqjr),
                qjr.cross(r) * (2.0 * rqir),
            );
            let qiqjr = mi.quad.dot_vec(&qjr);
            let qjqir = mj.quad.dot_vec(&qir);
            add(
                -4.0 / 9.0,
                3,
                qir.dot(&qjr),
                qiqjr + qjqir,
                qir.cross(&qjr) + qiqjr.cross(r),
                qjr.cross(&qir) + qjqir.cross(r),
            );
            let ax_qq = axial(&mi.quad.matmul(&mj.quad));
            add(
                2.0 / 9.0,
                2,
                mi.quad.full_dot(&mj.quad),
                zero,
                ax_qq * 2.0,
                ax_qq * -2.0,
            );
        }
    }

    if do_oct {
        let oir = mi.oct.dot_vec(r);
        let ojr = mj.oct.dot_vec(r);
        let oirr = oir.dot_vec(r);
        let ojrr = ojr.dot_vec(r);
        let oirrr = oirr.dot(r);
        let ojrrr = ojrr.dot(r);

        // charge – octupole
        add(
            1.0 / 15.0,
            3,
            mi.q * ojrrr,
            ojrr * (3.0 * mi.q),
            zero,
            ojrr.cross(r) * (3.0 * mi.q),
        );
        add(
            -1.0 / 15.0,
            3,
            mj.q * oirrr,
            oirr * (3.0 * mj.q),
            oirr.cross(r) * (3.0 * mj.q),
            zero,
        );

        // dipole – octupole
        add(
            -1.0 / 15.0,
            4,
            dri * ojrrr,
            mi.d * ojrrr + ojrr * (3.0 * dri),
            mi.d.cross(r) * ojrrr,
            ojrr.cross(r) * (3.0 * dri),
        );
        let ojrdi = ojr.dot_vec(&mi.d);
        add(
            1.0 / 5.0,
            3,
            mi.d.dot(&ojrr),
            ojrdi * 2.0,
            mi.d.cross(&ojrr),
            ojrr.cross(&mi.d) + ojrdi.cross(r) * 2.0,
        );
        add(
            -1.0 / 15.0,
            4,
            oirrr * drj,
            oirr * (3.0 * drj) + mj.d * oirrr,
            oirr.cross(r) * (3.0 * drj),
            mj.d.cross(r) * oirrr,
        );
        let oirdj = oir.dot_vec(&mj.d);
        add(
            1.0 / 5.0,
            3,
            mj.d.dot(&oirr),
            oirdj * 2.0,
            oirr.cross(&mj.d) + oirdj.cross(r) * 2.0,
            mj.d.cross(&oirr),
        );

        // quadrupole – octupole, both orders
        if do_quad {
            add(
                1.0 / 45.0,
                5,
                rqir * ojrrr,
                qir * (2.0 * ojrrr) + ojrr * (3.0 * rqir),
                qir.cross(r) * (2.0 * ojrrr),
                ojrr.cross(r) * (3.0 * rqir),
            );
            let qi_ojrr = mi.quad.dot_vec(&ojrr);
            let ojr_qir = ojr.dot_vec(&qir);
            add(
                -2.0 / 15.0,
                4,
                qir.dot(&ojrr),
                qi_ojrr + ojr_qir * 2.0,
                qir.cross(&ojrr) + qi_ojrr.cross(r),
                ojrr.cross(&qir) + ojr_qir.cross(r) * 2.0,
            );
            let c32_oj_qi = mj.oct.contract_sym2(&mi.quad);
            add(
                2.0 / 15.0,
                3,
                mi.quad.full_dot(&ojr),
                c32_oj_qi,
                axial(&mi.quad.matmul(&ojr)) * 2.0,
                axial(&ojr.matmul(&mi.quad)) * 2.0 + c32_oj_qi.cross(r),
            );

            add(
                -1.0 / 45.0,
                5,
                oirrr * rqjr,
                oirr * (3.0 * rqjr) + qjr * (2.0 * oirrr),
                oirr.cross(r) * (3.0 * rqjr),
                qjr.cross(r) * (2.0 * oirrr),
            );
            let qj_oirr = mj.quad.dot_vec(&oirr);
            let oir_qjr = oir.dot_vec(&qjr);
            add(
                2.0 / 15.0,
                4,
                oirr.dot(&qjr),
                qj_oirr + oir_qjr * 2.0,
                oirr.cross(&qjr) + oir_qjr.cross(r) * 2.0,
                qjr.cross(&oirr) + qj_oirr.cross(r),
            );
            let c32_oi_qj = mi.oct.contract_sym2(&mj.quad);
            add(
                -2.0 / 15.0,
                3,
                mj.quad.full_dot(&oir),
                c32_oi_qj,
                axial(&oir.matmul(&mj.quad)) * 2.0 + c32_oi_qj.cross(r),
                axial(&mj.quad.matmul(&oir)) * 2.0,
            );
        }

        // octupole – octupole
        if mi.has_oct() && mj.has_oct() {
            add(
                -1.0 / 225.0,
                6,
                oirrr * ojrrr,
                oirr * (3.0 * ojrrr) + ojrr * (3.0 * oirrr),
                oirr.cross(r) * (3.0 * ojrrr),
                ojrr.cross(r) * (3.0 * oirrr),
            );
            let oir_ojrr = oir.dot_vec(&ojrr);
            let ojr_oirr = ojr.dot_vec(&oirr);
            add(
                1.0 / 25.0,
                5,
                oirr.dot(&ojrr),
                oir_ojrr * 2.0 + ojr_oirr * 2.0,
                oirr.cross(&ojrr) + oir_ojrr.cross(r) * 2.0,
                ojrr.cross(&oirr) + ojr_oirr.cross(r) * 2.0,
            );
            let c32_oi_ojr = mi.oct.contract_sym2(&ojr);
            let c32_oj_oir = mj.oct.contract_sym2(&oir);
            add(
                -2.0 / 25.0,
                4,
                oir.full_dot(&ojr),
                c32_oi_ojr + c32_oj_oir,
                axial(&oir.matmul(&ojr)) * 2.0 + c32_oi_ojr.cross(r),
                axial(&ojr.matmul(&oir)) * 2.0 + c32_oj_oir.cross(r),
            );
            let ax_oo = axial(&mi.oct.cross_matrix(&mj.oct));
            add(
                2.0 / 75.0,
                3,
                mi.oct.full_dot(&mj.oct),
                zero,
                ax_oo * 3.0,
                ax_oo * -3.0,
            );
        }
    }

    PairInteraction {
        energy,
        force,
        torque_i: -wi_sum,
        torque_j: -wj_sum,
    }
}

/// Bare electrostatic field at `r_i = r_j + r` produced by the moments of
/// site j, using the supplied radial ladder.
pub fn field_at(mj: &Moments, r: &Point, b: &[f64; NB]) -> Point {
    let drj = mj.d.dot(r);
    let mut e = r * (b[1] * mj.q) - mj.d * b[1] + r * (b[2] * drj);
    if mj.has_quad() {
        let qjr = mj.quad.dot_vec(r);
        let rqjr = qjr.dot(r);
        e += qjr * (-2.0 / 3.0 * b[2]) + r * (b[3] * rqjr / 3.0);
    }
    if mj.has_oct() {
        let ojrr = mj.oct.dot_vec(r).dot_vec(r);
        let ojrrr = ojrr.dot(r);
        e += ojrr * (-b[3] / 5.0) + r * (b[4] * ojrrr / 15.0);
    }
    e
}
