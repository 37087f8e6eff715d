use crate::error::BranchError;
use derive_builder::Builder;

/// Index of the utility grid bus.
pub const GRID_BUS: usize = 0;
/// Index of the low-voltage main switchboard bus.
pub const MAIN_BUS: usize = 1;
/// Index of the compute-load bus.
pub const LOAD_BUS: usize = 2;

/// Bus is a node of the distribution branch.
#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    /// Bus index (0 to 2).
    pub i: usize,

    pub name: String,

    /// Nominal voltage (kV).
    pub vn_kv: f64,
}

/// Infinite bus feeding the branch. Voltage magnitude and angle are
/// fixed regardless of the load drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub name: String,

    pub bus: usize,

    /// Voltage magnitude setpoint (p.u.).
    pub vm_pu: f64,

    /// Voltage angle (degrees).
    pub va_degree: f64,
}

/// Two-winding step-down transformer between the grid and main buses.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct Transformer {
    pub name: String,

    /// Rated apparent power (MVA).
    pub sn_mva: f64,

    /// Rated voltage of the high voltage side (kV).
    pub vn_hv_kv: f64,

    /// Rated voltage of the low voltage side (kV).
    pub vn_lv_kv: f64,

    /// Real part of the short-circuit voltage (%).
    pub vkr_percent: f64,

    /// Short-circuit voltage (%).
    pub vk_percent: f64,

    /// Iron losses (kW).
    pub pfe_kw: f64,

    /// Open loop losses (% of rated current).
    pub i0_percent: f64,
}

impl Default for Transformer {
    fn default() -> Self {
        Self {
            name: "Main Transformer T-1".to_string(),
            sn_mva: 2.5,
            vn_hv_kv: 13.8,
            vn_lv_kv: 0.48,
            vkr_percent: 1.0,
            vk_percent: 6.0,
            pfe_kw: 5.0,
            i0_percent: 0.1,
        }
    }
}

impl Transformer {
    fn validate(&self) -> Result<(), BranchError> {
        let positive = [
            ("sn_mva", self.sn_mva),
            ("vn_hv_kv", self.vn_hv_kv),
            ("vn_lv_kv", self.vn_lv_kv),
            ("vk_percent", self.vk_percent),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BranchError::Construction(format!(
                    "transformer '{}': {} must be positive (got {})",
                    self.name, field, value
                )));
            }
        }
        let non_negative = [
            ("vkr_percent", self.vkr_percent),
            ("pfe_kw", self.pfe_kw),
            ("i0_percent", self.i0_percent),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BranchError::Construction(format!(
                    "transformer '{}': {} must be non-negative (got {})",
                    self.name, field, value
                )));
            }
        }
        if self.vkr_percent > self.vk_percent {
            return Err(BranchError::Construction(format!(
                "transformer '{}': vkr_percent ({}) exceeds vk_percent ({})",
                self.name, self.vkr_percent, self.vk_percent
            )));
        }
        Ok(())
    }
}

/// Cable between the main switchboard and the load bus.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, setter(into))]
pub struct Feeder {
    pub name: String,

    /// Length (km).
    pub length_km: f64,

    /// Resistance (Ohm/km).
    pub r_ohm_per_km: f64,

    /// Reactance (Ohm/km).
    pub x_ohm_per_km: f64,

    /// Capacitance (nF/km).
    pub c_nf_per_km: f64,

    /// Maximum thermal current (kA).
    pub max_i_ka: f64,
}

impl Default for Feeder {
    fn default() -> Self {
        Self {
            name: "Feeder Busway".to_string(),
            length_km: 0.05,
            r_ohm_per_km: 0.06,
            x_ohm_per_km: 0.03,
            c_nf_per_km: 10.0,
            max_i_ka: 3.5,
        }
    }
}

impl Feeder {
    fn validate(&self) -> Result<(), BranchError> {
        if !(self.length_km.is_finite() && self.length_km > 0.0) {
            return Err(BranchError::Construction(format!(
                "feeder '{}': length_km must be positive (got {})",
                self.name, self.length_km
            )));
        }
        if !(self.max_i_ka.is_finite() && self.max_i_ka > 0.0) {
            return Err(BranchError::Construction(format!(
                "feeder '{}': max_i_ka must be positive (got {})",
                self.name, self.max_i_ka
            )));
        }
        let non_negative = [
            ("r_ohm_per_km", self.r_ohm_per_km),
            ("x_ohm_per_km", self.x_ohm_per_km),
            ("c_nf_per_km", self.c_nf_per_km),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(BranchError::Construction(format!(
                    "feeder '{}': {} must be non-negative (got {})",
                    self.name, field, value
                )));
            }
        }
        if self.r_ohm_per_km == 0.0 && self.x_ohm_per_km == 0.0 {
            return Err(BranchError::Construction(format!(
                "feeder '{}': zero series impedance",
                self.name
            )));
        }
        Ok(())
    }
}

/// The single variable element of the branch.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableLoad {
    pub name: String,

    pub bus: usize,

    /// Active power demand (MW).
    pub p_mw: f64,

    /// Reactive power demand (MVAr).
    pub q_mvar: f64,

    /// Reactive power drawn per unit of active power (MVAr/MW).
    pub q_ratio: f64,
}

/// Fixed parameters of the grid, transformer, feeder, load chain.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(private, name = "pre_build"))]
pub struct Topology {
    /// System MVA base used for converting power into per-unit quantities.
    pub base_mva: f64,

    /// System frequency (Hz).
    pub f_hz: f64,

    /// Nominal voltage of the utility grid bus (kV).
    pub grid_kv: f64,

    /// Nominal voltage of the main and load buses (kV).
    pub main_kv: f64,

    /// Source voltage magnitude (p.u.).
    pub source_vm_pu: f64,

    /// Source voltage angle (degrees).
    pub source_va_degree: f64,

    pub transformer: Transformer,

    pub feeder: Feeder,

    /// Reactive to active power ratio of the load. 0.329 corresponds to
    /// a 0.95 lagging power factor.
    pub q_ratio: f64,
}

impl Default for Topology {
    fn default() -> Self {
        Self {
            base_mva: 1.0,
            f_hz: 50.0,
            grid_kv: 13.8,
            main_kv: 0.48,
            source_vm_pu: 1.0,
            source_va_degree: 0.0,
            transformer: Transformer::default(),
            feeder: Feeder::default(),
            q_ratio: 0.329,
        }
    }
}

impl TopologyBuilder {
    pub fn build(&self) -> Result<Topology, BranchError> {
        let topology = self
            .pre_build()
            .map_err(|err| BranchError::Construction(err.to_string()))?;
        topology.validate()?;
        Ok(topology)
    }
}

impl Topology {
    pub fn validate(&self) -> Result<(), BranchError> {
        let positive = [
            ("base_mva", self.base_mva),
            ("f_hz", self.f_hz),
            ("grid_kv", self.grid_kv),
            ("main_kv", self.main_kv),
            ("source_vm_pu", self.source_vm_pu),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(BranchError::Construction(format!(
                    "{} must be positive (got {})",
                    field, value
                )));
            }
        }
        if !self.source_va_degree.is_finite() {
            return Err(BranchError::Construction(format!(
                "source_va_degree must be finite (got {})",
                self.source_va_degree
            )));
        }
        if !(self.q_ratio.is_finite() && self.q_ratio >= 0.0) {
            return Err(BranchError::Construction(format!(
                "q_ratio must be finite and non-negative (got {})",
                self.q_ratio
            )));
        }
        self.transformer.validate()?;
        self.feeder.validate()?;
        Ok(())
    }
}
