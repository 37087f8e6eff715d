use crate::dense::Mat;
use crate::error::Divergence;
use crate::network::NetworkModel;

/// Electrical quantities of a solved branch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElectricalState {
    /// Transformer loading relative to its rated current (%).
    pub transformer_loading_pct: f64,

    /// Voltage magnitude at the load bus (p.u.).
    pub load_bus_voltage_pu: f64,

    /// Voltage magnitude at the main switchboard (p.u.).
    pub main_bus_voltage_pu: f64,

    /// Feeder current relative to its thermal rating (%).
    pub feeder_loading_pct: f64,

    /// Active power lost in the transformer and feeder (kW).
    pub losses_kw: f64,

    /// Solver iterations used.
    pub iterations: usize,
}

impl ElectricalState {
    pub fn new(transformer_loading_pct: f64, load_bus_voltage_pu: f64) -> Self {
        Self {
            transformer_loading_pct,
            load_bus_voltage_pu,
            ..Default::default()
        }
    }
}

/// AC power flow over the current state of a branch.
pub trait PowerFlowSolver {
    fn solve(&self, net: &NetworkModel) -> Result<ElectricalState, Divergence>;
}

impl<F> PowerFlowSolver for F
where
    F: Fn(&NetworkModel) -> Result<ElectricalState, Divergence>,
{
    fn solve(&self, net: &NetworkModel) -> Result<ElectricalState, Divergence> {
        self(net)
    }
}

/// Solves the dense linear system `a_mat * x = b`.
pub trait LinearSolver {
    fn solve(&self, a_mat: &Mat<f64>, b: &[f64]) -> Result<Vec<f64>, String>;
}
