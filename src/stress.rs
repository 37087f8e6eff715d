use crate::error::BranchError;
use crate::network::NetworkModel;
use crate::opt::StressOpt;
use crate::traits::PowerFlowSolver;
use std::fmt;

/// State of the capacity search. Every variant other than `Searching`
/// is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    Searching,
    /// Transformer loading reached its limit.
    StoppedAtOverload,
    /// Load bus voltage fell to its limit.
    StoppedAtUndervoltage,
    /// The power flow failed to converge.
    StoppedAtDivergence,
    /// The load passed the simulation ceiling without reaching a limit.
    StoppedAtSimulationCeiling,
}

impl SearchState {
    pub fn is_terminal(&self) -> bool {
        *self != SearchState::Searching
    }

    /// True if the last logged record tripped a limit.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            SearchState::StoppedAtOverload | SearchState::StoppedAtUndervoltage
        )
    }
}

impl fmt::Display for SearchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SearchState::Searching => "searching",
            SearchState::StoppedAtOverload => "transformer overload",
            SearchState::StoppedAtUndervoltage => "voltage drop violation",
            SearchState::StoppedAtDivergence => "grid collapse (divergence)",
            SearchState::StoppedAtSimulationCeiling => "simulation ceiling",
        };
        write!(f, "{}", s)
    }
}

/// One solved load step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultRecord {
    pub load_kw: f64,
    pub transformer_loading_pct: f64,
    pub bus_voltage_pu: f64,
}

/// Append-only log of solved steps, ordered by load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultLog {
    records: Vec<ResultRecord>,
}

impl ResultLog {
    fn push(&mut self, record: ResultRecord) {
        debug_assert!(self
            .records
            .last()
            .map_or(true, |last| last.load_kw < record.load_kw));
        self.records.push(record);
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&ResultRecord> {
        self.records.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRecord> {
        self.records.iter()
    }

    /// Largest load that was solved without tripping a limit (kW).
    pub fn max_safe_load_kw(&self, state: SearchState) -> Option<f64> {
        let safe = if state.is_limit() {
            self.records.len().checked_sub(1)?
        } else {
            self.records.len()
        };
        safe.checked_sub(1).map(|i| self.records[i].load_kw)
    }
}

impl<'a> IntoIterator for &'a ResultLog {
    type Item = &'a ResultRecord;
    type IntoIter = std::slice::Iter<'a, ResultRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Drives the load on a branch upward in fixed steps until a thermal or
/// voltage limit trips, the solver diverges or the simulation ceiling is
/// passed.
pub struct CapacityStressTester<'a> {
    net: &'a mut NetworkModel,
    solver: &'a dyn PowerFlowSolver,
    opt: StressOpt,

    state: SearchState,
    step: usize,
    log: ResultLog,
}

impl<'a> CapacityStressTester<'a> {
    pub fn new(
        net: &'a mut NetworkModel,
        solver: &'a dyn PowerFlowSolver,
        opt: StressOpt,
    ) -> Result<Self, BranchError> {
        opt.validate()?;
        Ok(Self {
            net,
            solver,
            opt,
            state: SearchState::Searching,
            step: 0,
            log: ResultLog::default(),
        })
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn log(&self) -> &ResultLog {
        &self.log
    }

    /// Load evaluated by the next step (MW).
    pub fn current_load_mw(&self) -> f64 {
        self.opt.load_mw(self.step)
    }

    /// Executes one iteration of the search. Does nothing once a terminal
    /// state has been reached.
    pub fn step(&mut self) -> Result<SearchState, BranchError> {
        if self.state.is_terminal() {
            return Ok(self.state);
        }

        let load_mw = self.current_load_mw();
        let load_kw = self.opt.load_kw(self.step);
        if load_mw > self.opt.ceiling_mw {
            log::info!(
                "Simulation ceiling of {} MW passed at {:.0} kW",
                self.opt.ceiling_mw,
                load_kw
            );
            self.state = SearchState::StoppedAtSimulationCeiling;
            return Ok(self.state);
        }

        self.net.set_load(load_mw)?;
        let result = match self.net.solve(self.solver) {
            Ok(result) => result,
            Err(err) => {
                log::warn!("CRITICAL: Grid Collapse (Divergence) at {:.0} kW: {}", load_kw, err);
                self.state = SearchState::StoppedAtDivergence;
                return Ok(self.state);
            }
        };

        self.log.push(ResultRecord {
            load_kw,
            transformer_loading_pct: result.transformer_loading_pct,
            bus_voltage_pu: result.load_bus_voltage_pu,
        });
        log::debug!(
            "{:.0} kW: transformer {:.1}%, load bus {:.4} pu",
            load_kw,
            result.transformer_loading_pct,
            result.load_bus_voltage_pu
        );

        // thermal limit before voltage limit
        if result.transformer_loading_pct >= self.opt.loading_limit_pct {
            log::info!(
                "(!) LIMIT REACHED: Transformer Overload ({:.1}%) at {:.0} kW",
                result.transformer_loading_pct,
                load_kw
            );
            self.state = SearchState::StoppedAtOverload;
        } else if result.load_bus_voltage_pu <= self.opt.voltage_limit_pu {
            log::info!(
                "(!) LIMIT REACHED: Voltage Drop Violation ({:.3} pu) at {:.0} kW",
                result.load_bus_voltage_pu,
                load_kw
            );
            self.state = SearchState::StoppedAtUndervoltage;
        } else {
            self.step += 1;
        }
        Ok(self.state)
    }

    /// Runs the search to a terminal state.
    pub fn run(mut self) -> Result<(ResultLog, SearchState), BranchError> {
        log::info!(
            "Capacity search: {} kW steps up to {} MW",
            self.opt.step_kw,
            self.opt.ceiling_mw
        );
        while !self.state.is_terminal() {
            self.step()?;
        }
        Ok((self.log, self.state))
    }
}
