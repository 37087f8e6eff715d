use crate::branch::{GRID_BUS, LOAD_BUS, MAIN_BUS};
use crate::debug::format_polar_vec;
use crate::dense::{norm_inf, Mat};
use crate::error::Divergence;
use crate::jac::make_jac;
use crate::lu::LU;
use crate::network::NetworkModel;
use crate::opt::PFOpt;
use crate::traits::{ElectricalState, LinearSolver, PowerFlowSolver};
use crate::ybus::{make_ybus, FEEDER, TRAFO};
use num_complex::Complex64;

pub trait ProgressMonitor {
    fn update(&self, i: usize, norm_f: f64);
}

/// Logs the mismatch of each Newton iteration at trace level.
pub struct LogProgress {}

impl ProgressMonitor for LogProgress {
    fn update(&self, i: usize, norm_f: f64) {
        log::trace!("{:3} {:10.3e}", i, norm_f);
    }
}

/// Converged bus voltages of the branch.
#[derive(Debug, Clone)]
pub struct Solution {
    /// Complex bus voltages (p.u.).
    pub v: Vec<Complex64>,

    pub iterations: usize,
}

/// Full Newton's method AC power flow (power balance, polar).
///
/// Every call starts from a flat voltage profile, so solving the same
/// network state twice gives identical results.
pub struct NewtonSolver {
    pub opt: PFOpt,
    pub lin_solver: Box<dyn LinearSolver>,
    pub progress: Option<Box<dyn ProgressMonitor>>,
}

impl Default for NewtonSolver {
    fn default() -> Self {
        Self::new(PFOpt::default())
    }
}

impl NewtonSolver {
    /// Newton solver using LU decomposition for the update step.
    pub fn new(opt: PFOpt) -> Self {
        Self::with_solver(opt, Box::new(LU::default()))
    }

    pub fn with_solver(opt: PFOpt, lin_solver: Box<dyn LinearSolver>) -> Self {
        Self {
            opt,
            lin_solver,
            progress: Some(Box::new(LogProgress {})),
        }
    }

    /// Solves for the bus voltages of `net`.
    pub fn newtonpf(&self, net: &NetworkModel) -> Result<Solution, Divergence> {
        let (y_bus, _, _) = make_ybus(net);
        let s_bus = make_sbus(net);
        let pq = [MAIN_BUS, LOAD_BUS];
        let npq = pq.len();

        let tol = self.opt.tolerance;
        let max_it = self.opt.max_it;

        // initial state
        let source = net.source();
        let mut v = vec![Complex64::new(1.0, 0.0); net.bus().len()];
        v[GRID_BUS] = Complex64::from_polar(source.vm_pu, source.va_degree.to_radians());
        let mut va: Vec<f64> = v.iter().map(|v| v.arg()).collect();
        let mut vm: Vec<f64> = v.iter().map(|v| v.norm()).collect();
        log::debug!("V0: {}", format_polar_vec(&v));

        // evaluate F(x0)
        let mut f = mismatch(&y_bus, &v, &s_bus, &pq);
        let mut norm_f = norm_inf(&f);
        self.report(0, norm_f);

        let mut i = 0;
        let mut converged = norm_f < tol;

        // do Newton iterations
        while !converged && i < max_it {
            i += 1;

            let jac = make_jac(&y_bus, &v, &pq);
            let neg_f: Vec<f64> = f.iter().map(|f_i| -f_i).collect();
            let dx = match self.lin_solver.solve(&jac, &neg_f) {
                Ok(dx) => dx,
                Err(err) => {
                    log::debug!("linear solve failed in iteration {}: {}", i, err);
                    return Err(Divergence::new(i, norm_f));
                }
            };

            // update voltage
            for (k, &b) in pq.iter().enumerate() {
                va[b] += dx[k];
                vm[b] += dx[npq + k];
            }
            v = va
                .iter()
                .zip(&vm)
                .map(|(&a, &m)| Complex64::from_polar(m, a))
                .collect();
            // update Vm and Va again in case we wrapped around with a negative Vm
            va = v.iter().map(|v| v.arg()).collect();
            vm = v.iter().map(|v| v.norm()).collect();

            // evaluate F(x)
            f = mismatch(&y_bus, &v, &s_bus, &pq);
            norm_f = norm_inf(&f);
            self.report(i, norm_f);

            if !norm_f.is_finite() {
                break;
            }
            converged = norm_f < tol;
        }

        if !converged {
            log::debug!(
                "Newton's method power flow did not converge in {} iterations.",
                i
            );
            return Err(Divergence::new(i, norm_f));
        }
        log::trace!(
            "Newton's method power flow converged in {} iterations: {}",
            i,
            format_polar_vec(&v)
        );
        Ok(Solution { v, iterations: i })
    }

    fn report(&self, i: usize, norm_f: f64) {
        if let Some(pm) = &self.progress {
            pm.update(i, norm_f);
        }
    }
}

impl PowerFlowSolver for NewtonSolver {
    fn solve(&self, net: &NetworkModel) -> Result<ElectricalState, Divergence> {
        let solution = self.newtonpf(net)?;
        Ok(pfsoln(net, &solution))
    }
}

/// Builds the vector of complex bus power injections (p.u.).
pub fn make_sbus(net: &NetworkModel) -> Vec<Complex64> {
    let mut s_bus = vec![Complex64::default(); net.bus().len()];
    let load = net.load();
    s_bus[load.bus] -= Complex64::new(load.p_mw, load.q_mvar) / net.base_mva();
    s_bus
}

fn mismatch(
    y_bus: &Mat<Complex64>,
    v: &[Complex64],
    s_bus: &[Complex64],
    pq: &[usize],
) -> Vec<f64> {
    let i_bus = y_bus.mat_vec(v);
    let mis: Vec<Complex64> = pq
        .iter()
        .map(|&b| v[b] * i_bus[b].conj() - s_bus[b])
        .collect();
    mis.iter()
        .map(|m| m.re)
        .chain(mis.iter().map(|m| m.im))
        .collect()
}

/// Computes branch loadings and losses from converged bus voltages.
pub fn pfsoln(net: &NetworkModel, solution: &Solution) -> ElectricalState {
    let v = &solution.v;
    let base_mva = net.base_mva();
    let (_, y_f, y_t) = make_ybus(net);

    let i_f = y_f.mat_vec(v);
    let i_t = y_t.mat_vec(v);

    // transformer: worst end current relative to rated current
    let trafo = net.transformer();
    let i_trafo = i_f[TRAFO].norm().max(i_t[TRAFO].norm());
    let transformer_loading_pct = i_trafo * base_mva / trafo.sn_mva * 100.0;

    // feeder: current in kA relative to its thermal limit
    let feeder = net.feeder();
    let i_base_ka = base_mva / (3f64.sqrt() * net.bus()[MAIN_BUS].vn_kv);
    let i_feeder_ka = i_f[FEEDER].norm().max(i_t[FEEDER].norm()) * i_base_ka;
    let feeder_loading_pct = i_feeder_ka / feeder.max_i_ka * 100.0;

    let losses_kw = [(TRAFO, GRID_BUS, MAIN_BUS), (FEEDER, MAIN_BUS, LOAD_BUS)]
        .iter()
        .map(|&(br, f, t)| {
            let s_f = v[f] * i_f[br].conj();
            let s_t = v[t] * i_t[br].conj();
            (s_f + s_t).re * base_mva * 1000.0
        })
        .sum();

    ElectricalState {
        transformer_loading_pct,
        load_bus_voltage_pu: v[LOAD_BUS].norm(),
        main_bus_voltage_pu: v[MAIN_BUS].norm(),
        feeder_loading_pct,
        losses_kw,
        iterations: solution.iterations,
    }
}
