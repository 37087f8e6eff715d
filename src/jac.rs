use crate::dense::Mat;
use num_complex::Complex64;

const J: Complex64 = Complex64 { re: 0.0, im: 1.0 };

/// Computes partial derivatives of the complex bus power injections
/// w.r.t. voltage angle and magnitude (polar coordinates).
///
/// ```text
/// dS/dVa = j diag(V) conj(diag(Ibus) - Ybus diag(V))
/// dS/dVm = diag(V) conj(Ybus diag(V/|V|)) + conj(diag(Ibus)) diag(V/|V|)
/// ```
pub fn d_sbus_d_v(y_bus: &Mat<Complex64>, v: &[Complex64]) -> (Mat<Complex64>, Mat<Complex64>) {
    let n = v.len();
    let i_bus = y_bus.mat_vec(v);
    let v_norm: Vec<Complex64> = v.iter().map(|vi| *vi / vi.norm()).collect();

    let d_sbus_d_va = Mat::from_fn(n, n, |i, k| {
        let diag = if i == k { i_bus[i] } else { Complex64::default() };
        J * v[i] * (diag - y_bus.get(i, k) * v[k]).conj()
    });
    let d_sbus_d_vm = Mat::from_fn(n, n, |i, k| {
        let mut d = v[i] * (y_bus.get(i, k) * v_norm[k]).conj();
        if i == k {
            d += i_bus[i].conj() * v_norm[i];
        }
        d
    });
    (d_sbus_d_va, d_sbus_d_vm)
}

/// Forms the reduced power flow Jacobian over the PQ buses:
///
/// ```text
/// | dP/dVa  dP/dVm |
/// | dQ/dVa  dQ/dVm |
/// ```
pub fn make_jac(y_bus: &Mat<Complex64>, v: &[Complex64], pq: &[usize]) -> Mat<f64> {
    let (d_sbus_d_va, d_sbus_d_vm) = d_sbus_d_v(y_bus, v);

    // P rows take the real parts, Q rows the imaginary parts
    let d_va = d_sbus_d_va.select(pq, pq);
    let d_vm = d_sbus_d_vm.select(pq, pq);

    let npq = pq.len();
    Mat::from_fn(2 * npq, 2 * npq, |i, j| match (i < npq, j < npq) {
        (true, true) => d_va.get(i, j).re,
        (true, false) => d_vm.get(i, j - npq).re,
        (false, true) => d_va.get(i - npq, j).im,
        (false, false) => d_vm.get(i - npq, j - npq).im,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lu::LU;
    use crate::network::NetworkModel;
    use crate::traits::LinearSolver;
    use crate::ybus::make_ybus;
    use anyhow::Result;

    fn s_bus(y_bus: &Mat<Complex64>, v: &[Complex64]) -> Vec<Complex64> {
        let i_bus = y_bus.mat_vec(v);
        v.iter().zip(i_bus).map(|(vi, ii)| vi * ii.conj()).collect()
    }

    #[test]
    fn test_derivatives_match_finite_differences() -> Result<()> {
        let net = NetworkModel::construct()?;
        let (y_bus, _, _) = make_ybus(&net);
        let (vm, va) = ([1.0, 0.97, 0.95], [0.0, -0.02, -0.05]);
        let v: Vec<Complex64> = (0..3).map(|i| Complex64::from_polar(vm[i], va[i])).collect();
        let (d_va, d_vm) = d_sbus_d_v(&y_bus, &v);

        let h = 1e-7;
        let s0 = s_bus(&y_bus, &v);
        for k in 0..3 {
            let mut v_a = v.clone();
            v_a[k] = Complex64::from_polar(vm[k], va[k] + h);
            let mut v_m = v.clone();
            v_m[k] = Complex64::from_polar(vm[k] + h, va[k]);
            let (s_a, s_m) = (s_bus(&y_bus, &v_a), s_bus(&y_bus, &v_m));
            for i in 0..3 {
                let fd_a = (s_a[i] - s0[i]) / h;
                let fd_m = (s_m[i] - s0[i]) / h;
                let scale = 1.0 + d_va.get(i, k).norm();
                assert!((fd_a - d_va.get(i, k)).norm() / scale < 1e-4, "dVa[{}][{}]", i, k);
                let scale = 1.0 + d_vm.get(i, k).norm();
                assert!((fd_m - d_vm.get(i, k)).norm() / scale < 1e-4, "dVm[{}][{}]", i, k);
            }
        }
        Ok(())
    }

    #[test]
    fn test_jac_shape() -> Result<()> {
        let net = NetworkModel::construct()?;
        let (y_bus, _, _) = make_ybus(&net);
        let v = vec![Complex64::new(1.0, 0.0); 3];
        let jac = make_jac(&y_bus, &v, &[1, 2]);
        assert_eq!((jac.rows(), jac.cols()), (4, 4));
        assert!(LU::default().solve(&jac, &[0.1, 0.0, 0.0, 0.0]).is_ok());
        Ok(())
    }
}
