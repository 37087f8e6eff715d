use crate::branch::{GRID_BUS, LOAD_BUS, MAIN_BUS};
use crate::dense::Mat;
use crate::network::NetworkModel;
use num_complex::Complex64;
use std::f64::consts::PI;

/// Branch index of the transformer in `Yf`/`Yt`.
pub const TRAFO: usize = 0;
/// Branch index of the feeder in `Yf`/`Yt`.
pub const FEEDER: usize = 1;

/// Per-unit admittance primitives of a branch:
///
/// ```text
/// | If |   | Yff  Yft |   | Vf |
/// |    | = |          | * |    |
/// | It |   | Ytf  Ytt |   | Vt |
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchY {
    pub f_bus: usize,
    pub t_bus: usize,
    pub y_ff: Complex64,
    pub y_ft: Complex64,
    pub y_tf: Complex64,
    pub y_tt: Complex64,
}

/// Transformer π-model. The magnetising admittance is split equally
/// between both ends and the off-nominal ratio sits on the HV side.
pub fn transformer_y(net: &NetworkModel) -> BranchY {
    let trafo = net.transformer();
    let base_mva = net.base_mva();
    let bus = net.bus();

    // short-circuit impedance, converted from the transformer to the system base
    let z_k = trafo.vk_percent / 100.0 * base_mva / trafo.sn_mva;
    let r_k = trafo.vkr_percent / 100.0 * base_mva / trafo.sn_mva;
    let x_k = (z_k * z_k - r_k * r_k).max(0.0).sqrt();
    let y_s = Complex64::new(1.0, 0.0) / Complex64::new(r_k, x_k);

    // magnetising branch, iron losses as conductance
    let g_m = trafo.pfe_kw / 1000.0 / base_mva;
    let y_m = trafo.i0_percent / 100.0 * trafo.sn_mva / base_mva;
    let b_m = (y_m * y_m - g_m * g_m).max(0.0).sqrt();
    let y_mag = Complex64::new(g_m, -b_m);

    let t = (trafo.vn_hv_kv / bus[GRID_BUS].vn_kv) / (trafo.vn_lv_kv / bus[MAIN_BUS].vn_kv);

    let y_tt = y_s + y_mag / 2.0;
    BranchY {
        f_bus: GRID_BUS,
        t_bus: MAIN_BUS,
        y_ff: y_tt / (t * t),
        y_ft: -y_s / t,
        y_tf: -y_s / t,
        y_tt,
    }
}

/// Feeder π-model with line charging at the system frequency.
pub fn feeder_y(net: &NetworkModel) -> BranchY {
    let feeder = net.feeder();
    let z_base = net.bus()[MAIN_BUS].vn_kv.powi(2) / net.base_mva();

    let r = feeder.r_ohm_per_km * feeder.length_km / z_base;
    let x = feeder.x_ohm_per_km * feeder.length_km / z_base;
    let b_c = 2.0 * PI * net.f_hz() * feeder.c_nf_per_km * 1e-9 * feeder.length_km * z_base;

    let y_s = Complex64::new(1.0, 0.0) / Complex64::new(r, x);
    let y_tt = y_s + Complex64::new(0.0, b_c / 2.0);
    BranchY {
        f_bus: MAIN_BUS,
        t_bus: LOAD_BUS,
        y_ff: y_tt,
        y_ft: -y_s,
        y_tf: -y_s,
        y_tt,
    }
}

pub fn branch_admittances(net: &NetworkModel) -> [BranchY; 2] {
    [transformer_y(net), feeder_y(net)]
}

/// Builds the bus admittance matrix and branch admittance matrices.
pub fn make_ybus(net: &NetworkModel) -> (Mat<Complex64>, Mat<Complex64>, Mat<Complex64>) {
    let nb = net.bus().len();
    let branch = branch_admittances(net);

    let mut y_bus = Mat::zeros(nb, nb);
    let mut y_f = Mat::zeros(branch.len(), nb);
    let mut y_t = Mat::zeros(branch.len(), nb);

    for (i, br) in branch.iter().enumerate() {
        let (f, t) = (br.f_bus, br.t_bus);

        y_f.push(i, f, br.y_ff);
        y_f.push(i, t, br.y_ft);

        y_t.push(i, f, br.y_tf);
        y_t.push(i, t, br.y_tt);

        y_bus.push(f, f, br.y_ff);
        y_bus.push(f, t, br.y_ft);
        y_bus.push(t, f, br.y_tf);
        y_bus.push(t, t, br.y_tt);
    }
    (y_bus, y_f, y_t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::{FeederBuilder, TopologyBuilder, TransformerBuilder};
    use anyhow::Result;

    fn lossless_shunts() -> Result<NetworkModel> {
        let transformer = TransformerBuilder::default()
            .pfe_kw(0.0)
            .i0_percent(0.0)
            .build()?;
        let feeder = FeederBuilder::default().c_nf_per_km(0.0).build()?;
        let topology = TopologyBuilder::default()
            .transformer(transformer)
            .feeder(feeder)
            .build()?;
        Ok(NetworkModel::new(topology)?)
    }

    #[test]
    fn test_feeder_series_impedance() -> Result<()> {
        let net = NetworkModel::construct()?;
        let br = feeder_y(&net);
        let z = -Complex64::new(1.0, 0.0) / br.y_ft;
        // 50 m of 0.06 + j0.03 Ohm/km on a 0.2304 Ohm base
        assert!((z.re - 0.003 / 0.2304).abs() < 1e-12);
        assert!((z.im - 0.0015 / 0.2304).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_transformer_series_impedance() -> Result<()> {
        let net = NetworkModel::construct()?;
        let br = transformer_y(&net);
        let z = -Complex64::new(1.0, 0.0) / br.y_ft;
        // 6 % on 2.5 MVA is 0.024 p.u. on a 1 MVA base
        assert!((z.norm() - 0.024).abs() < 1e-12);
        assert!((z.re - 0.004).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_magnetising_susceptance_clamped() -> Result<()> {
        // 5 kW of iron loss exceeds the 0.1 % no-load current of 2.5 MVA
        let net = NetworkModel::construct()?;
        let br = transformer_y(&net);
        let y_half = br.y_tt + br.y_ft;
        assert!((y_half.re - 0.0025).abs() < 1e-12);
        assert!(y_half.im.abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_ybus_symmetric() -> Result<()> {
        let net = NetworkModel::construct()?;
        let (y_bus, y_f, y_t) = make_ybus(&net);
        assert_eq!((y_bus.rows(), y_bus.cols()), (3, 3));
        assert_eq!((y_f.rows(), y_t.cols()), (2, 3));
        for i in 0..3 {
            for j in 0..3 {
                assert!((y_bus.get(i, j) - y_bus.get(j, i)).norm() < 1e-9);
            }
        }
        // grid and load buses are not directly connected
        assert_eq!(y_bus.get(GRID_BUS, LOAD_BUS), Complex64::default());
        Ok(())
    }

    #[test]
    fn test_ybus_rows_sum_to_shunts() -> Result<()> {
        let net = lossless_shunts()?;
        let (y_bus, _, _) = make_ybus(&net);
        for i in 0..3 {
            let sum: Complex64 = y_bus.row(i).iter().sum();
            assert!(sum.norm() < 1e-9, "row {} sums to {}", i, sum);
        }
        Ok(())
    }
}
