use crate::error::BranchError;
use derive_builder::Builder;

/// Upper bound on the number of load steps in one search.
pub const MAX_STEPS: f64 = 1e7;

/// Options controlling the incremental capacity search.
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(default, build_fn(private, name = "pre_build"))]
pub struct StressOpt {
    // Load added after each accepted step (kW). Default value is 20.
    pub step_kw: f64,

    // Search stops once the load exceeds this bound (MW). Default value is 5.
    pub ceiling_mw: f64,

    // Transformer loading at or above which the branch is overloaded (%).
    // Default value is 98.
    pub loading_limit_pct: f64,

    // Load bus voltage at or below which the branch is unstable (p.u.).
    // Default value is 0.95 (ANSI range A).
    pub voltage_limit_pu: f64,
}

impl Default for StressOpt {
    fn default() -> Self {
        Self {
            step_kw: 20.0,
            ceiling_mw: 5.0,
            loading_limit_pct: 98.0,
            voltage_limit_pu: 0.95,
        }
    }
}

impl StressOptBuilder {
    pub fn build(&self) -> Result<StressOpt, BranchError> {
        let opt = self
            .pre_build()
            .map_err(|err| BranchError::InvalidOption(err.to_string()))?;
        opt.validate()?;
        Ok(opt)
    }
}

impl StressOpt {
    pub fn validate(&self) -> Result<(), BranchError> {
        if !self.step_kw.is_finite() || self.step_kw <= 0.0 {
            return Err(BranchError::InvalidOption(format!(
                "step_kw must be positive (got {})",
                self.step_kw
            )));
        }
        if !self.ceiling_mw.is_finite() || self.ceiling_mw < 0.0 {
            return Err(BranchError::InvalidOption(format!(
                "ceiling_mw must be non-negative (got {})",
                self.ceiling_mw
            )));
        }
        let steps = self.ceiling_mw * 1000.0 / self.step_kw;
        if steps > MAX_STEPS {
            return Err(BranchError::InvalidOption(format!(
                "{} kW steps up to {} MW exceed {:e} steps",
                self.step_kw, self.ceiling_mw, MAX_STEPS
            )));
        }
        if !self.loading_limit_pct.is_finite() || self.loading_limit_pct <= 0.0 {
            return Err(BranchError::InvalidOption(format!(
                "loading_limit_pct must be positive (got {})",
                self.loading_limit_pct
            )));
        }
        if !(self.voltage_limit_pu > 0.0 && self.voltage_limit_pu < 1.5) {
            return Err(BranchError::InvalidOption(format!(
                "voltage_limit_pu must lie in (0, 1.5) (got {})",
                self.voltage_limit_pu
            )));
        }
        Ok(())
    }

    /// Load at the given step index (MW).
    ///
    /// Loads are derived from the index rather than accumulated so that
    /// every record sits exactly on the step grid.
    pub fn load_mw(&self, step: usize) -> f64 {
        self.load_kw(step) / 1000.0
    }

    /// Load at the given step index (kW).
    pub fn load_kw(&self, step: usize) -> f64 {
        step as f64 * self.step_kw
    }
}

/// Newton-Raphson power flow options.
#[derive(Debug, Clone, PartialEq)]
pub struct PFOpt {
    // Termination tolerance on per unit P & Q mismatch. Default value is 1e-8.
    pub tolerance: f64,

    // Maximum number of iterations for Newton's method. Default value is 10.
    pub max_it: usize,
}

impl Default for PFOpt {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_it: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Opt {
    pub stress: StressOpt,
    pub pf: PFOpt,
}
