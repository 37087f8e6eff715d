use crate::branch::*;
use crate::error::{BranchError, Divergence};
use crate::traits::{ElectricalState, PowerFlowSolver};

/// NetworkModel is the data center branch: utility grid, step-down
/// transformer, feeder cable and one variable compute load.
///
/// Topology is fixed at construction. The load is the only element that
/// can change afterwards.
#[derive(Debug, Clone)]
pub struct NetworkModel {
    base_mva: f64,
    f_hz: f64,
    bus: [Bus; 3],
    source: Source,
    transformer: Transformer,
    feeder: Feeder,
    load: VariableLoad,
}

impl NetworkModel {
    /// Builds the default data center branch.
    pub fn construct() -> Result<Self, BranchError> {
        Self::new(Topology::default())
    }

    pub fn new(topology: Topology) -> Result<Self, BranchError> {
        topology.validate()?;

        let bus = [
            Bus {
                i: GRID_BUS,
                name: "Utility Grid".to_string(),
                vn_kv: topology.grid_kv,
            },
            Bus {
                i: MAIN_BUS,
                name: "Main Switchboard".to_string(),
                vn_kv: topology.main_kv,
            },
            Bus {
                i: LOAD_BUS,
                name: "AI High-Density Hall".to_string(),
                vn_kv: topology.main_kv,
            },
        ];
        let source = Source {
            name: "Grid Feed".to_string(),
            bus: GRID_BUS,
            vm_pu: topology.source_vm_pu,
            va_degree: topology.source_va_degree,
        };
        let load = VariableLoad {
            name: "NVIDIA H100 Cluster".to_string(),
            bus: LOAD_BUS,
            p_mw: 0.0,
            q_mvar: 0.0,
            q_ratio: topology.q_ratio,
        };

        Ok(Self {
            base_mva: topology.base_mva,
            f_hz: topology.f_hz,
            bus,
            source,
            transformer: topology.transformer,
            feeder: topology.feeder,
            load,
        })
    }

    /// Sets the load active power and derives its reactive power from the
    /// configured ratio.
    pub fn set_load(&mut self, p_mw: f64) -> Result<(), BranchError> {
        if !p_mw.is_finite() || p_mw < 0.0 {
            return Err(BranchError::InvalidLoad(p_mw));
        }
        self.load.p_mw = p_mw;
        self.load.q_mvar = p_mw * self.load.q_ratio;
        Ok(())
    }

    /// Runs the power flow over the current load.
    pub fn solve(&self, solver: &dyn PowerFlowSolver) -> Result<ElectricalState, Divergence> {
        solver.solve(self)
    }

    pub fn base_mva(&self) -> f64 {
        self.base_mva
    }

    pub fn f_hz(&self) -> f64 {
        self.f_hz
    }

    pub fn bus(&self) -> &[Bus] {
        &self.bus
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn transformer(&self) -> &Transformer {
        &self.transformer
    }

    pub fn feeder(&self) -> &Feeder {
        &self.feeder
    }

    pub fn load(&self) -> &VariableLoad {
        &self.load
    }
}
